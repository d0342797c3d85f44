use std::sync::Arc;

use sqlx::sqlite::SqlitePoolOptions;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use campus_coin::api::router;
use campus_coin::auth::AuthKeys;
use campus_coin::config::Config;
use campus_coin::notifier::{NoopNotifier, Notifier, WebhookNotifier};
use campus_coin::services::AllotmentScheduler;
use campus_coin::state::AppState;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "campus_coin=debug".to_string()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env();

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect(&config.database_url)
        .await?;

    sqlx::migrate!("./migrations").run(&pool).await?;

    let notifier: Arc<dyn Notifier> = match &config.notify_webhook_url {
        Some(url) => {
            info!("notifications relayed to {}", url);
            Arc::new(WebhookNotifier::new(url.clone())?)
        }
        None => {
            info!("no notification webhook configured, notifications disabled");
            Arc::new(NoopNotifier)
        }
    };

    let state = AppState {
        db: pool.clone(),
        notifier: Arc::clone(&notifier),
        auth: AuthKeys::new(&config.jwt_secret, config.token_ttl_hours),
        config: Arc::new(config.clone()),
    };

    let scheduler = AllotmentScheduler::new(
        pool.clone(),
        Arc::clone(&notifier),
        config.allotment_check_interval_secs,
    );
    tokio::spawn(scheduler.start());

    let app = router(state);

    info!("listening on http://{}", config.bind_addr);
    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
