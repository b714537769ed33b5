//! Optimistic-concurrency metadata carried by every persisted record.

use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};

/// Version and timestamps of a persisted record.
///
/// `version` starts at 1 and increases by one on every committed change; the
/// store refuses a write whose expected version no longer matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Revision {
    /// Monotonic record version.
    pub version: u64,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Latest change timestamp.
    pub updated_at: DateTime<Utc>,
}

impl Revision {
    /// Returns the revision of a record created now.
    #[must_use]
    pub fn initial(clock: &impl Clock) -> Self {
        let timestamp = clock.utc();
        Self {
            version: 1,
            created_at: timestamp,
            updated_at: timestamp,
        }
    }

    /// Advances to the next version.
    pub(crate) fn bump(&mut self, clock: &impl Clock) {
        self.version += 1;
        self.updated_at = clock.utc();
    }
}
