use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;

use crate::error::AppError;
use crate::models::{Coupon, Student, Teacher};

/// Outbound notifications for ledger events. The original platform mailed
/// these; here they go to a relay webhook so the transport stays pluggable.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn coins_received(
        &self,
        student: &Student,
        teacher: &Teacher,
        amount: i64,
        reason: &str,
    ) -> Result<(), AppError>;

    async fn coupon_issued(&self, student: &Student, coupon: &Coupon) -> Result<(), AppError>;

    async fn redemption_notice(&self, coupon: &Coupon) -> Result<(), AppError>;
}

pub struct WebhookNotifier {
    client: Client,
    url: String,
}

impl WebhookNotifier {
    pub fn new(url: String) -> Result<Self, AppError> {
        let client = Client::builder()
            .build()
            .map_err(|_| AppError::InternalServerError)?;
        Ok(Self { client, url })
    }

    async fn post_event(&self, event: serde_json::Value) -> Result<(), AppError> {
        let response = self
            .client
            .post(&self.url)
            .json(&event)
            .send()
            .await
            .map_err(|_| AppError::InternalServerError)?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::BadRequest(format!(
                "Notification webhook error {}: {}",
                status, body
            )));
        }

        Ok(())
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn coins_received(
        &self,
        student: &Student,
        teacher: &Teacher,
        amount: i64,
        reason: &str,
    ) -> Result<(), AppError> {
        self.post_event(json!({
            "event": "coins_received",
            "to": student.email,
            "studentName": student.name,
            "teacherName": teacher.name,
            "amount": amount,
            "reason": reason,
        }))
        .await
    }

    async fn coupon_issued(&self, student: &Student, coupon: &Coupon) -> Result<(), AppError> {
        self.post_event(json!({
            "event": "coupon_issued",
            "to": student.email,
            "studentName": student.name,
            "advantageName": coupon.advantage_name,
            "code": coupon.code,
        }))
        .await
    }

    async fn redemption_notice(&self, coupon: &Coupon) -> Result<(), AppError> {
        self.post_event(json!({
            "event": "advantage_redeemed",
            "companyName": coupon.company_name,
            "advantageName": coupon.advantage_name,
            "studentName": coupon.student_name,
            "code": coupon.code,
        }))
        .await
    }
}

/// Used when no webhook is configured, and in tests.
pub struct NoopNotifier;

#[async_trait]
impl Notifier for NoopNotifier {
    async fn coins_received(
        &self,
        _student: &Student,
        _teacher: &Teacher,
        _amount: i64,
        _reason: &str,
    ) -> Result<(), AppError> {
        Ok(())
    }

    async fn coupon_issued(&self, _student: &Student, _coupon: &Coupon) -> Result<(), AppError> {
        Ok(())
    }

    async fn redemption_notice(&self, _coupon: &Coupon) -> Result<(), AppError> {
        Ok(())
    }
}
