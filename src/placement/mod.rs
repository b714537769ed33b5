//! Placement workflow engine.
//!
//! Governs the status lifecycles of applications, internships, logbook
//! entries, attendance records, and evaluations. Every status change passes
//! one allow-list, commits atomically with its cascades, and leaves its
//! notifications in an outbox. The module follows hexagonal architecture:
//!
//! - Domain types in [`domain`]
//! - The transition allow-list and validator in [`validation`]
//! - Port contracts in [`ports`]
//! - Adapter implementations in [`adapters`]
//! - Orchestration services in [`services`]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;
pub mod validation;

#[cfg(test)]
mod tests;
