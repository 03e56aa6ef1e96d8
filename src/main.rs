use std::net::SocketAddr;
use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use panchayath_connect::auth::TokenKeys;
use panchayath_connect::config::{Cli, Config};
use panchayath_connect::media::LocalMediaHost;
use panchayath_connect::payments::RazorpayGateway;
use panchayath_connect::state::AppState;
use panchayath_connect::{build_app, db};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Parse CLI args and load config
    let cli = Cli::parse();
    let data_dir = Config::data_dir(&cli);
    std::fs::create_dir_all(&data_dir)?;
    tracing::info!("Data directory: {}", data_dir.display());

    let config = Config::load(&cli)?;

    // Ensure media directory exists
    std::fs::create_dir_all(config.media_path())?;

    // Initialize database
    let pool = db::create_pool(&config.db_path())?;
    db::run_migrations(&pool)?;

    if config.payment.key_id.is_none() || config.payment.key_secret.is_none() {
        tracing::warn!("Razorpay keys not configured; payment endpoints will fail");
    }

    let state = AppState {
        db: pool,
        tokens: TokenKeys::from_config(&config.auth),
        media: Arc::new(LocalMediaHost::new(config.media_path(), config.public_url())),
        payments: Arc::new(RazorpayGateway::new(&config.payment)),
        config: config.clone(),
    };

    let app = build_app(state);

    // Start server
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    tracing::info!("Listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
