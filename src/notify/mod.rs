//! Outbound notifications for submitted leads.

mod resend;
mod templates;

pub use resend::*;
pub use templates::*;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::SubmissionPayload;

#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("email delivery is not configured")]
    NotConfigured,
    #[error("request failed: {0}")]
    Transport(String),
    #[error("provider rejected message ({status}): {body}")]
    Rejected { status: u16, body: String },
}

/// Delivers a normalized submission to the business inbox.
#[async_trait]
pub trait NotificationSender: Send + Sync {
    async fn send(&self, payload: &SubmissionPayload, destination: &str)
        -> Result<(), DeliveryError>;
}

/// Sender used when no email provider is configured.
pub struct DisabledSender;

#[async_trait]
impl NotificationSender for DisabledSender {
    async fn send(
        &self,
        payload: &SubmissionPayload,
        _destination: &str,
    ) -> Result<(), DeliveryError> {
        tracing::warn!(kind = payload.kind(), "Dropping submission: email delivery disabled");
        Err(DeliveryError::NotConfigured)
    }
}

#[cfg(test)]
pub(crate) use recording::RecordingSender;
