//! In-memory adapters for tests and local runs.

mod notifier;
mod store;

pub use notifier::{QueuedNotification, RecordingNotificationQueue};
pub use store::InMemoryPlacementStore;
