//! Hands committed outbox notifications to the notification service.

use crate::placement::{
    domain::{Notification, NotificationId},
    ports::{NotificationQueue, PlacementStore, StoreResult},
};
use mockable::Clock;
use std::sync::Arc;

/// Outbox rows picked up per relay pass.
pub const RELAY_BATCH_SIZE: usize = 100;

/// Delivers outbox notifications and records which ones the notification
/// service accepted.
///
/// Delivery is best-effort: a refused notification stays undispatched and is
/// retried by the next [`NotificationRelay::relay_pending`] pass.
#[derive(Clone)]
pub struct NotificationRelay<S, N, C>
where
    S: PlacementStore,
    N: NotificationQueue,
    C: Clock + Send + Sync,
{
    store: Arc<S>,
    queue: Arc<N>,
    clock: Arc<C>,
}

impl<S, N, C> NotificationRelay<S, N, C>
where
    S: PlacementStore,
    N: NotificationQueue,
    C: Clock + Send + Sync,
{
    /// Creates a relay.
    #[must_use]
    pub const fn new(store: Arc<S>, queue: Arc<N>, clock: Arc<C>) -> Self {
        Self {
            store,
            queue,
            clock,
        }
    }

    /// Enqueues each notification and marks the accepted ones dispatched.
    ///
    /// Returns how many the notification service accepted. Failures are
    /// logged, never returned.
    pub async fn deliver(&self, notifications: &[Notification]) -> usize {
        let mut accepted: Vec<NotificationId> = Vec::with_capacity(notifications.len());
        for notification in notifications {
            match self
                .queue
                .enqueue(
                    notification.recipient_id,
                    notification.kind,
                    notification.payload.clone(),
                )
                .await
            {
                Ok(()) => accepted.push(notification.id),
                Err(err) => tracing::warn!(
                    notification_id = %notification.id,
                    recipient = %notification.recipient_id,
                    kind = notification.kind.as_str(),
                    error = %err,
                    "notification hand-off failed"
                ),
            }
        }

        if !accepted.is_empty()
            && let Err(err) = self.store.mark_dispatched(&accepted, self.clock.utc()).await
        {
            tracing::warn!(
                count = accepted.len(),
                error = %err,
                "could not mark notifications dispatched"
            );
        }
        accepted.len()
    }

    /// Redelivers notifications left undispatched by earlier passes.
    ///
    /// # Errors
    ///
    /// Returns the store error when the outbox cannot be read.
    pub async fn relay_pending(&self) -> StoreResult<usize> {
        let pending = self
            .store
            .undispatched_notifications(RELAY_BATCH_SIZE)
            .await?;
        if pending.is_empty() {
            return Ok(0);
        }
        let delivered = self.deliver(&pending).await;
        tracing::info!(
            pending = pending.len(),
            delivered,
            "relayed outbox notifications"
        );
        Ok(delivered)
    }
}
