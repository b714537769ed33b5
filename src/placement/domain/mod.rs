//! Domain model for the placement workflow.
//!
//! Entities, their status spaces, acting principals, notifications, and the
//! change set that carries a transition and its cascades to the store. No
//! infrastructure concern crosses this boundary.

mod actor;
mod application;
mod attendance;
mod change;
mod entity;
mod error;
mod evaluation;
mod ids;
mod internship;
mod logbook;
mod notification;
mod offer;
mod revision;
mod status;

pub use actor::{Actor, Role};
pub use application::{Application, PersistedApplicationData};
pub use attendance::{Attendance, PersistedAttendanceData};
pub use change::{ChangeSet, EntityWrite, OfferWrite};
pub use entity::{Entity, EntityRef, EntitySnapshot};
pub use error::{
    ParseNotificationKindError, ParseRoleError, ParseStatusError, PlacementDomainError,
};
pub use evaluation::{Evaluation, PersistedEvaluationData};
pub use ids::{
    ApplicationId, AttendanceId, EvaluationId, InternshipId, LogbookEntryId, NotificationId,
    OfferId, UserId,
};
pub use internship::{Internship, PersistedInternshipData};
pub use logbook::{LogbookEntry, PersistedLogbookEntryData};
pub use notification::{Notification, NotificationKind};
pub use offer::{NewOffer, Offer, PersistedOfferData};
pub use revision::Revision;
pub use status::{
    ApplicationStatus, AttendanceStatus, EntityKind, EvaluationStatus, EvaluationType,
    InternshipStatus, LogbookStatus, Status,
};
