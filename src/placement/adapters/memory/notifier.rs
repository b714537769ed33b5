//! Recording notification queue for workflow tests.

use async_trait::async_trait;
use serde_json::Value;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use crate::placement::{
    domain::{NotificationKind, UserId},
    ports::{NotificationQueue, NotificationQueueError},
};

/// A notification accepted by [`RecordingNotificationQueue`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueuedNotification {
    /// Recipient.
    pub recipient: UserId,
    /// Notification kind.
    pub kind: NotificationKind,
    /// Payload handed to the service.
    pub payload: Value,
}

/// Notification queue that records what it accepts and can be switched into
/// a failing mode.
#[derive(Debug, Clone, Default)]
pub struct RecordingNotificationQueue {
    accepted: Arc<Mutex<Vec<QueuedNotification>>>,
    unavailable: Arc<AtomicBool>,
}

impl RecordingNotificationQueue {
    /// Creates an empty, available queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent enqueue fail (`true`) or succeed (`false`).
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Returns every accepted notification in acceptance order.
    #[must_use]
    pub fn accepted(&self) -> Vec<QueuedNotification> {
        self.accepted.lock().map_or_else(
            |poisoned| poisoned.into_inner().clone(),
            |guard| guard.clone(),
        )
    }

    /// Returns the accepted notifications addressed to `recipient`.
    #[must_use]
    pub fn accepted_for(&self, recipient: UserId) -> Vec<QueuedNotification> {
        self.accepted()
            .into_iter()
            .filter(|notification| notification.recipient == recipient)
            .collect()
    }
}

#[async_trait]
impl NotificationQueue for RecordingNotificationQueue {
    async fn enqueue(
        &self,
        recipient: UserId,
        kind: NotificationKind,
        payload: Value,
    ) -> Result<(), NotificationQueueError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(NotificationQueueError::Unavailable(
                "recording queue switched off".to_owned(),
            ));
        }
        let mut accepted = self
            .accepted
            .lock()
            .map_err(|err| NotificationQueueError::Unavailable(err.to_string()))?;
        accepted.push(QueuedNotification {
            recipient,
            kind,
            payload,
        });
        Ok(())
    }
}
