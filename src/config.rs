use clap::Parser;
use serde::Deserialize;
use std::path::PathBuf;

use crate::auth::Role;

#[derive(Parser, Debug)]
#[command(name = "panchayath-connect", about = "Civic engagement backend")]
pub struct Cli {
    /// Path to config file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Host to bind to
    #[arg(long)]
    pub host: Option<String>,

    /// Port to bind to
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Path to data directory
    #[arg(long)]
    pub data_dir: Option<PathBuf>,

    /// Secret used to sign bearer tokens
    #[arg(long, env = "PANCHAYATH_JWT_SECRET", hide_env_values = true)]
    pub jwt_secret: Option<String>,

    /// Razorpay key id
    #[arg(long, env = "RAZORPAY_KEY_ID")]
    pub razorpay_key_id: Option<String>,

    /// Razorpay key secret
    #[arg(long, env = "RAZORPAY_KEY_SECRET", hide_env_values = true)]
    pub razorpay_key_secret: Option<String>,
}

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub storage: StorageConfig,
    pub auth: AuthConfig,
    pub payment: PaymentConfig,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Base URL clients use to reach this server; media URLs are built from it.
    pub public_url: Option<String>,
}

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct DatabaseConfig {
    pub path: Option<PathBuf>,
}

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct StorageConfig {
    pub path: Option<PathBuf>,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct AuthConfig {
    pub jwt_secret: Option<String>,
    pub bcrypt_cost: u32,
    pub user_token_hours: u64,
    pub member_token_hours: u64,
    pub admin_token_hours: u64,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct PaymentConfig {
    pub key_id: Option<String>,
    pub key_secret: Option<String>,
    pub api_base: String,
    pub currency: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
            public_url: None,
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: None,
            bcrypt_cost: 10,
            user_token_hours: 24 * 7,
            member_token_hours: 24 * 7,
            admin_token_hours: 24 * 30,
        }
    }
}

impl Default for PaymentConfig {
    fn default() -> Self {
        Self {
            key_id: None,
            key_secret: None,
            api_base: "https://api.razorpay.com/v1".to_string(),
            currency: "INR".to_string(),
        }
    }
}

impl AuthConfig {
    /// Token lifetime for a given account type.
    pub fn token_hours(&self, role: Role) -> u64 {
        match role {
            Role::User => self.user_token_hours,
            Role::Member => self.member_token_hours,
            Role::Admin => self.admin_token_hours,
        }
    }
}

impl Config {
    pub fn load(cli: &Cli) -> anyhow::Result<Self> {
        let data_dir = Self::data_dir(cli);
        let config_path = cli
            .config
            .clone()
            .unwrap_or_else(|| data_dir.join("config.toml"));

        let mut config = if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            toml::from_str(&content)?
        } else {
            Config::default()
        };

        // CLI / env overrides
        if let Some(ref host) = cli.host {
            config.server.host = host.clone();
        }
        if let Some(port) = cli.port {
            config.server.port = port;
        }
        if let Some(ref secret) = cli.jwt_secret {
            config.auth.jwt_secret = Some(secret.clone());
        }
        if let Some(ref key_id) = cli.razorpay_key_id {
            config.payment.key_id = Some(key_id.clone());
        }
        if let Some(ref key_secret) = cli.razorpay_key_secret {
            config.payment.key_secret = Some(key_secret.clone());
        }

        // Resolve paths relative to data dir
        if config.database.path.is_none() {
            config.database.path = Some(data_dir.join("panchayath.db"));
        }
        if config.storage.path.is_none() {
            config.storage.path = Some(data_dir.join("media"));
        }

        Ok(config)
    }

    pub fn data_dir(cli: &Cli) -> PathBuf {
        cli.data_dir.clone().unwrap_or_else(|| {
            dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".panchayath-connect")
        })
    }

    pub fn db_path(&self) -> PathBuf {
        self.database
            .path
            .clone()
            .unwrap_or_else(|| PathBuf::from("panchayath.db"))
    }

    pub fn media_path(&self) -> PathBuf {
        self.storage
            .path
            .clone()
            .unwrap_or_else(|| PathBuf::from("media"))
    }

    pub fn public_url(&self) -> String {
        self.server
            .public_url
            .clone()
            .unwrap_or_else(|| format!("http://localhost:{}", self.server.port))
            .trim_end_matches('/')
            .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cli(data_dir: Option<PathBuf>) -> Cli {
        Cli {
            config: None,
            host: None,
            port: None,
            data_dir,
            jwt_secret: None,
            razorpay_key_id: None,
            razorpay_key_secret: None,
        }
    }

    #[test]
    fn default_config_has_expected_values() {
        let config = Config::default();
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 5000);
        assert_eq!(config.auth.bcrypt_cost, 10);
        assert_eq!(config.auth.admin_token_hours, 720);
        assert_eq!(config.payment.currency, "INR");
        assert!(config.database.path.is_none());
        assert!(config.storage.path.is_none());
    }

    #[test]
    fn token_hours_follow_role_table() {
        let auth = AuthConfig {
            user_token_hours: 1,
            member_token_hours: 2,
            admin_token_hours: 3,
            ..AuthConfig::default()
        };
        assert_eq!(auth.token_hours(Role::User), 1);
        assert_eq!(auth.token_hours(Role::Member), 2);
        assert_eq!(auth.token_hours(Role::Admin), 3);
    }

    #[test]
    fn data_dir_uses_cli_override() {
        let cli = cli(Some(PathBuf::from("/tmp/test-panchayath")));
        assert_eq!(Config::data_dir(&cli), PathBuf::from("/tmp/test-panchayath"));
    }

    #[test]
    fn load_with_no_config_file_uses_defaults() {
        let tmp = tempfile::tempdir().unwrap();
        let config = Config::load(&cli(Some(tmp.path().to_path_buf()))).unwrap();
        assert_eq!(config.server.port, 5000);
        assert_eq!(config.db_path(), tmp.path().join("panchayath.db"));
        assert_eq!(config.media_path(), tmp.path().join("media"));
        assert_eq!(config.public_url(), "http://localhost:5000");
    }

    #[test]
    fn load_reads_toml_file() {
        let tmp = tempfile::tempdir().unwrap();
        let config_path = tmp.path().join("config.toml");
        std::fs::write(
            &config_path,
            r#"
[server]
port = 9000
public_url = "https://connect.example.org/"

[auth]
jwt_secret = "from-file"
user_token_hours = 1

[payment]
currency = "USD"
"#,
        )
        .unwrap();

        let mut cli = cli(Some(tmp.path().to_path_buf()));
        cli.config = Some(config_path);
        let config = Config::load(&cli).unwrap();
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.public_url(), "https://connect.example.org");
        assert_eq!(config.auth.jwt_secret.as_deref(), Some("from-file"));
        assert_eq!(config.auth.user_token_hours, 1);
        assert_eq!(config.auth.member_token_hours, 168);
        assert_eq!(config.payment.currency, "USD");
    }

    #[test]
    fn cli_overrides_beat_toml_values() {
        let tmp = tempfile::tempdir().unwrap();
        let config_path = tmp.path().join("config.toml");
        std::fs::write(
            &config_path,
            r#"
[server]
host = "192.168.1.1"
port = 9000

[auth]
jwt_secret = "from-file"
"#,
        )
        .unwrap();

        let mut cli = cli(Some(tmp.path().to_path_buf()));
        cli.config = Some(config_path);
        cli.host = Some("10.0.0.1".to_string());
        cli.port = Some(4000);
        cli.jwt_secret = Some("from-env".to_string());
        cli.razorpay_key_secret = Some("rzp-secret".to_string());
        let config = Config::load(&cli).unwrap();
        assert_eq!(config.server.host, "10.0.0.1");
        assert_eq!(config.server.port, 4000);
        assert_eq!(config.auth.jwt_secret.as_deref(), Some("from-env"));
        assert_eq!(config.payment.key_secret.as_deref(), Some("rzp-secret"));
    }
}
