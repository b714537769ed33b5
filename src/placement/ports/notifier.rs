//! Notification service port.

use crate::placement::domain::{NotificationKind, UserId};
use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

/// Hand-off to the external notification service.
///
/// Enqueueing is fire-and-forget: success means the service accepted the
/// request, not that it was delivered.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait NotificationQueue: Send + Sync {
    /// Requests a notification for `recipient`.
    ///
    /// # Errors
    ///
    /// Returns [`NotificationQueueError`] when the service refuses the
    /// request.
    async fn enqueue(
        &self,
        recipient: UserId,
        kind: NotificationKind,
        payload: Value,
    ) -> Result<(), NotificationQueueError>;
}

/// Errors returned by notification queue implementations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum NotificationQueueError {
    /// The notification service could not be reached.
    #[error("notification service unavailable: {0}")]
    Unavailable(String),
}
