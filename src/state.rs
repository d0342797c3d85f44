use std::sync::Arc;

use sqlx::SqlitePool;

use crate::auth::AuthKeys;
use crate::config::Config;
use crate::notifier::Notifier;

#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub notifier: Arc<dyn Notifier>,
    pub auth: AuthKeys,
    pub config: Arc<Config>,
}
