//! Service-level errors for workflow operations.

use crate::placement::{
    domain::{OfferId, PlacementDomainError, Role},
    ports::StoreError,
    validation::RejectionReason,
};
use thiserror::Error;

/// Errors returned by workflow services.
#[derive(Debug, Clone, Error)]
pub enum WorkflowError {
    /// The transition was refused; nothing was written.
    #[error(transparent)]
    Rejected(#[from] RejectionReason),

    /// The actor's role may not perform a creation operation.
    #[error("{role} may not {operation}")]
    NotPermitted {
        /// Refused operation.
        operation: &'static str,
        /// Role of the refused actor.
        role: Role,
    },

    /// The referenced offer does not exist.
    #[error("offer {0} not found")]
    OfferNotFound(OfferId),

    /// Domain validation failed.
    #[error(transparent)]
    Domain(#[from] PlacementDomainError),

    /// Store operation failed after the retry budget was spent.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl WorkflowError {
    /// Returns the HTTP status code equivalent of the error.
    #[must_use]
    pub const fn http_status(&self) -> u16 {
        match self {
            Self::Rejected(reason) => reason.http_status(),
            Self::NotPermitted { .. } => 403,
            Self::OfferNotFound(_) => 404,
            Self::Domain(
                PlacementDomainError::DuplicateApplication { .. }
                | PlacementDomainError::OfferFull(_),
            ) => 409,
            Self::Domain(_) => 400,
            Self::Store(_) => 500,
        }
    }

    /// Returns the rejection reason, if the error is a refused transition.
    #[must_use]
    pub const fn rejection(&self) -> Option<&RejectionReason> {
        match self {
            Self::Rejected(reason) => Some(reason),
            _ => None,
        }
    }

    /// Returns `true` for store failures worth retrying.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::Store(err) if err.is_transient())
    }
}

/// Result type for workflow service operations.
pub type WorkflowResult<T> = Result<T, WorkflowError>;
