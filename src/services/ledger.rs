use std::sync::Arc;

use chrono::{Datelike, NaiveDate, Utc};
use sqlx::SqlitePool;
use tracing::{info, warn};
use uuid::Uuid;

use crate::db::{advantages, coupons, students, teachers};
use crate::error::AppError;
use crate::models::{
    CoinTransaction, PurchaseRequest, PurchaseResponse, TransactionType, TransferRequest,
};
use crate::notifier::Notifier;

/// Coins credited to every teacher once per semester.
pub const SEMESTER_ALLOTMENT: i64 = 1000;

const MIN_REASON_CHARS: usize = 10;

/// All balance mutation goes through this service. Each operation runs in a
/// SQL transaction with guarded updates (`WHERE balance >= amount`), so a
/// concurrent transfer or redemption can never overdraw a balance or drive
/// inventory negative.
pub struct LedgerService {
    db: SqlitePool,
    notifier: Arc<dyn Notifier>,
}

impl LedgerService {
    pub fn new(db: SqlitePool, notifier: Arc<dyn Notifier>) -> Self {
        Self { db, notifier }
    }

    /// Teacher sends recognition coins to a student.
    pub async fn transfer(
        &self,
        teacher_id: i64,
        req: TransferRequest,
    ) -> Result<CoinTransaction, AppError> {
        if req.amount <= 0 {
            return Err(AppError::BadRequest("Amount must be positive".to_string()));
        }
        if req.reason.trim().chars().count() < MIN_REASON_CHARS {
            return Err(AppError::BadRequest(format!(
                "Reason must be at least {} characters",
                MIN_REASON_CHARS
            )));
        }

        let teacher = teachers::find_teacher(&self.db, teacher_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Teacher".to_string()))?;
        let student = students::find_student(&self.db, req.student_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Student".to_string()))?;

        let now = Utc::now();
        let mut tx = self.db.begin().await?;

        let debited = sqlx::query(
            "UPDATE teachers SET balance = balance - ?1 WHERE user_id = ?2 AND balance >= ?1",
        )
        .bind(req.amount)
        .bind(teacher_id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        if debited == 0 {
            return Err(AppError::BadRequest(
                "Insufficient teacher balance".to_string(),
            ));
        }

        sqlx::query("UPDATE students SET balance = balance + ? WHERE user_id = ?")
            .bind(req.amount)
            .bind(req.student_id)
            .execute(&mut *tx)
            .await?;

        let transaction_id = sqlx::query(
            "INSERT INTO transactions (amount, occurred_at, kind, reason, sender_id, receiver_id) \
             VALUES (?, ?, 'SENT', ?, ?, ?)",
        )
        .bind(req.amount)
        .bind(now)
        .bind(&req.reason)
        .bind(teacher_id)
        .bind(req.student_id)
        .execute(&mut *tx)
        .await?
        .last_insert_rowid();

        tx.commit().await?;

        info!(
            "teacher {} transferred {} coins to student {}",
            teacher_id, req.amount, req.student_id
        );

        if let Err(e) = self
            .notifier
            .coins_received(&student, &teacher, req.amount, &req.reason)
            .await
        {
            warn!("failed to notify student of transfer: {}", e);
        }

        Ok(CoinTransaction {
            id: transaction_id,
            amount: req.amount,
            date: now,
            kind: TransactionType::Sent,
            reason: req.reason,
            sender_id: Some(teacher_id),
            sender_name: Some(teacher.name),
            receiver_id: Some(req.student_id),
            receiver_name: Some(student.name),
        })
    }

    /// Student redeems an advantage: inventory decrement, balance debit,
    /// coupon issue and ledger entry, all in one SQL transaction.
    pub async fn redeem(&self, req: PurchaseRequest) -> Result<PurchaseResponse, AppError> {
        let student = students::find_student(&self.db, req.student_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Student".to_string()))?;
        let advantage = advantages::find_advantage(&self.db, req.advantage_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Advantage".to_string()))?;

        let now = Utc::now();
        let code = coupon_code();
        let mut tx = self.db.begin().await?;

        // NULL quantity means unlimited, and NULL - 1 stays NULL.
        let decremented = sqlx::query(
            "UPDATE advantages \
             SET available_quantity = available_quantity - 1, \
                 times_redeemed = times_redeemed + 1, \
                 updated_at = ?2 \
             WHERE id = ?1 AND (available_quantity IS NULL OR available_quantity > 0)",
        )
        .bind(req.advantage_id)
        .bind(now)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        if decremented == 0 {
            return Err(AppError::BadRequest(
                "No more coupons available for this advantage".to_string(),
            ));
        }

        let debited = sqlx::query(
            "UPDATE students SET balance = balance - ?1 WHERE user_id = ?2 AND balance >= ?1",
        )
        .bind(advantage.cost_in_coins)
        .bind(req.student_id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        if debited == 0 {
            return Err(AppError::BadRequest("Insufficient balance".to_string()));
        }

        sqlx::query(
            "INSERT INTO coupons (code, advantage_id, student_id, used, generated_at) \
             VALUES (?, ?, ?, 0, ?)",
        )
        .bind(&code)
        .bind(req.advantage_id)
        .bind(req.student_id)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            "INSERT INTO transactions (amount, occurred_at, kind, reason, sender_id, receiver_id) \
             VALUES (?, ?, 'REDEEMED', ?, ?, NULL)",
        )
        .bind(advantage.cost_in_coins)
        .bind(now)
        .bind(format!("Advantage redemption: {}", advantage.name))
        .bind(req.student_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        info!(
            "student {} redeemed advantage {} with coupon {}",
            req.student_id, req.advantage_id, code
        );

        let coupon = coupons::find_by_code(&self.db, &code)
            .await?
            .ok_or(AppError::InternalServerError)?;
        let student = students::find_student(&self.db, req.student_id)
            .await?
            .ok_or(AppError::InternalServerError)?;
        let advantage = advantages::find_advantage(&self.db, req.advantage_id)
            .await?
            .ok_or(AppError::InternalServerError)?;

        if let Err(e) = self.notifier.coupon_issued(&student, &coupon).await {
            warn!("failed to send coupon to student: {}", e);
        }
        if let Err(e) = self.notifier.redemption_notice(&coupon).await {
            warn!("failed to notify company of redemption: {}", e);
        }

        Ok(PurchaseResponse {
            code,
            advantage,
            student,
            purchase_date: now,
        })
    }

    /// Credits the semester allotment to every teacher who has not received
    /// it for the current period. Idempotent per semester.
    pub async fn credit_semester_allotment(&self) -> Result<usize, AppError> {
        let period = current_semester_period(Utc::now().date_naive());
        let due = teachers::fetch_teachers_needing_credit(&self.db, &period).await?;
        let mut credited = 0;

        for teacher in due {
            let now = Utc::now();
            let mut tx = self.db.begin().await?;

            let affected = sqlx::query(
                "UPDATE teachers \
                 SET balance = balance + ?1, last_credit_period = ?2 \
                 WHERE user_id = ?3 \
                   AND (last_credit_period IS NULL OR last_credit_period != ?2)",
            )
            .bind(SEMESTER_ALLOTMENT)
            .bind(&period)
            .bind(teacher.id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

            if affected == 0 {
                // Another process credited this teacher first.
                continue;
            }

            sqlx::query(
                "INSERT INTO transactions (amount, occurred_at, kind, reason, sender_id, receiver_id) \
                 VALUES (?, ?, 'RECEIVED', 'Semester coin allotment', NULL, ?)",
            )
            .bind(SEMESTER_ALLOTMENT)
            .bind(now)
            .bind(teacher.id)
            .execute(&mut *tx)
            .await?;

            tx.commit().await?;
            credited += 1;
        }

        if credited > 0 {
            info!("credited {} teachers for period {}", credited, period);
        }

        Ok(credited)
    }
}

/// First semester runs February through July; every other month, January
/// included, falls in that year's second semester.
pub fn current_semester_period(date: NaiveDate) -> String {
    if (2..=7).contains(&date.month()) {
        format!("{}-1", date.year())
    } else {
        format!("{}-2", date.year())
    }
}

fn coupon_code() -> String {
    let hex = Uuid::new_v4().simple().to_string().to_uppercase();
    format!("{}-{}", &hex[..4], &hex[4..8])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn semester_period_splits_the_year() {
        let d = |y, m, day| NaiveDate::from_ymd_opt(y, m, day).unwrap();
        assert_eq!(current_semester_period(d(2026, 2, 1)), "2026-1");
        assert_eq!(current_semester_period(d(2026, 7, 31)), "2026-1");
        assert_eq!(current_semester_period(d(2026, 8, 1)), "2026-2");
        assert_eq!(current_semester_period(d(2026, 12, 25)), "2026-2");
        assert_eq!(current_semester_period(d(2026, 1, 15)), "2026-2");
    }

    #[test]
    fn coupon_code_shape() {
        let code = coupon_code();
        assert_eq!(code.len(), 9);
        assert_eq!(code.chars().nth(4), Some('-'));
        assert!(
            code.chars()
                .filter(|c| *c != '-')
                .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
        );
    }
}
