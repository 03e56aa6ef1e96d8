use std::sync::Arc;

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;

use crate::auth::TokenKeys;
use crate::config::Config;
use crate::media::MediaHost;
use crate::payments::PaymentGateway;

pub type DbPool = Pool<SqliteConnectionManager>;

#[derive(Clone)]
pub struct AppState {
    pub db: DbPool,
    pub config: Config,
    pub tokens: TokenKeys,
    pub media: Arc<dyn MediaHost>,
    pub payments: Arc<dyn PaymentGateway>,
}
