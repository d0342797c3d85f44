use std::env;

use tracing::warn;

#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: String,
    pub bind_addr: String,
    pub jwt_secret: String,
    pub token_ttl_hours: i64,
    pub upload_dir: String,
    pub public_base_url: String,
    pub notify_webhook_url: Option<String>,
    pub allotment_check_interval_secs: u64,
}

impl Config {
    pub fn from_env() -> Self {
        let jwt_secret = env::var("JWT_SECRET").unwrap_or_else(|_| {
            warn!("JWT_SECRET not set, using an insecure development secret");
            "campus-coin-dev-secret".to_string()
        });

        Self {
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite://campus-coin.db?mode=rwc".to_string()),
            bind_addr: env::var("BIND_ADDR").unwrap_or_else(|_| "127.0.0.1:3000".to_string()),
            jwt_secret,
            token_ttl_hours: parse_or("TOKEN_TTL_HOURS", 24),
            upload_dir: env::var("UPLOAD_DIR").unwrap_or_else(|_| "uploads".to_string()),
            public_base_url: env::var("PUBLIC_BASE_URL")
                .unwrap_or_else(|_| "http://localhost:3000".to_string()),
            notify_webhook_url: env::var("NOTIFY_WEBHOOK_URL").ok(),
            // Idempotent per semester, so a coarse interval is fine.
            allotment_check_interval_secs: parse_or("ALLOTMENT_CHECK_INTERVAL_SECS", 3600),
        }
    }
}

fn parse_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    match env::var(key) {
        Ok(raw) => raw.parse().unwrap_or_else(|_| {
            warn!("invalid {} value, using default", key);
            default
        }),
        Err(_) => default,
    }
}
