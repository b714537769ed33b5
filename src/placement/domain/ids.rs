//! Identifier newtypes for placement entities and participants.
//!
//! Every identifier wraps a UUID so that an application id can never be passed
//! where an internship id is expected.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

macro_rules! uuid_identifier {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Creates a new random identifier.
            #[must_use]
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Creates an identifier from an existing UUID.
            #[must_use]
            pub const fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Returns the wrapped UUID.
            #[must_use]
            pub const fn into_inner(self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl AsRef<Uuid> for $name {
            fn as_ref(&self) -> &Uuid {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

uuid_identifier!(
    /// Identifier of a principal known to the identity service.
    UserId
);

uuid_identifier!(
    /// Identifier of an internship offer published by a hospital.
    OfferId
);

uuid_identifier!(
    /// Identifier of a student application to an offer.
    ApplicationId
);

uuid_identifier!(
    /// Identifier of an internship placement.
    InternshipId
);

uuid_identifier!(
    /// Identifier of a logbook entry.
    LogbookEntryId
);

uuid_identifier!(
    /// Identifier of an attendance record.
    AttendanceId
);

uuid_identifier!(
    /// Identifier of an evaluation.
    EvaluationId
);

uuid_identifier!(
    /// Identifier of an outbox notification.
    NotificationId
);

impl UserId {
    /// Identity used by the engine when it acts as system authority.
    pub const SYSTEM: Self = Self(Uuid::nil());

    /// Returns `true` for the system authority identity.
    #[must_use]
    pub fn is_system(self) -> bool {
        self.0.is_nil()
    }
}
