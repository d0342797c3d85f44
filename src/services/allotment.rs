use std::sync::Arc;
use std::time::Duration;

use sqlx::SqlitePool;
use tracing::info;

use crate::notifier::Notifier;
use crate::services::ledger::LedgerService;

/// Periodically re-checks which teachers are owed their semester allotment.
/// The credit itself is idempotent per period, so the interval is coarse.
pub struct AllotmentScheduler {
    db: SqlitePool,
    notifier: Arc<dyn Notifier>,
    interval: Duration,
}

impl AllotmentScheduler {
    pub fn new(db: SqlitePool, notifier: Arc<dyn Notifier>, interval_secs: u64) -> Self {
        Self {
            db,
            notifier,
            interval: Duration::from_secs(interval_secs),
        }
    }

    pub async fn start(self) {
        info!(
            "Starting semester allotment scheduler (interval: {:?})",
            self.interval
        );

        loop {
            tokio::time::sleep(self.interval).await;

            let ledger = LedgerService::new(self.db.clone(), self.notifier.clone());
            match ledger.credit_semester_allotment().await {
                Ok(credited) if credited > 0 => {
                    info!("Allotment run credited {} teachers", credited);
                }
                Ok(_) => {}
                Err(e) => {
                    tracing::warn!("Allotment run failed: {:?}", e);
                    // keep the loop alive, next tick retries
                }
            }
        }
    }
}
