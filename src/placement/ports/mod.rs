//! Port contracts for the placement workflow.
//!
//! Ports define infrastructure-agnostic interfaces used by workflow services.

pub mod notifier;
pub mod store;

#[cfg(test)]
pub use notifier::MockNotificationQueue;
pub use notifier::{NotificationQueue, NotificationQueueError};
pub use store::{PlacementStore, StoreError, StoreResult};
