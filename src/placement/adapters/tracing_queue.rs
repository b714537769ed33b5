//! Notification queue that writes each request to the tracing log.

use async_trait::async_trait;
use serde_json::Value;

use crate::placement::{
    domain::{NotificationKind, UserId},
    ports::{NotificationQueue, NotificationQueueError},
};

/// Notification queue for deployments without a notification service.
///
/// Every request becomes an `info` event on the `placement::notifications`
/// target.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotificationQueue;

impl TracingNotificationQueue {
    /// Creates the queue.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

#[async_trait]
impl NotificationQueue for TracingNotificationQueue {
    async fn enqueue(
        &self,
        recipient: UserId,
        kind: NotificationKind,
        payload: Value,
    ) -> Result<(), NotificationQueueError> {
        tracing::info!(
            target: "placement::notifications",
            %recipient,
            kind = kind.as_str(),
            %payload,
            "notification requested"
        );
        Ok(())
    }
}
