use async_trait::async_trait;
use thiserror::Error;

use intake_core::domain::lifecycle::NotificationStatus;
use intake_core::domain::order::Order;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NotifyError {
    #[error("notification client could not be built: {0}")]
    Client(String),
    #[error("notification transport failed: {0}")]
    Transport(String),
    #[error("notification sink responded with status {status}: {body}")]
    Rejected { status: u16, body: String },
}

#[async_trait]
pub trait OrderNotifier: Send + Sync {
    /// Delivers one summary. Implementations must not retry.
    async fn notify(&self, order: &Order) -> Result<NotificationStatus, NotifyError>;

    fn sink_name(&self) -> &'static str;

    fn is_noop(&self) -> bool {
        false
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct NoopNotifier;

#[async_trait]
impl OrderNotifier for NoopNotifier {
    async fn notify(&self, _order: &Order) -> Result<NotificationStatus, NotifyError> {
        Ok(NotificationStatus::Skipped)
    }

    fn sink_name(&self) -> &'static str {
        "noop"
    }

    fn is_noop(&self) -> bool {
        true
    }
}
