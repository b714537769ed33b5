//! Placement engine: workflow and lifecycle rules for medical internships.
//!
//! The crate owns the status machines of applications, internships, logbook
//! entries, attendance records and evaluations. Every status change passes a
//! single transition table, commits atomically with its cascades, and leaves
//! notifications in an outbox that is relayed after the commit.
//!
//! # Architecture
//!
//! The engine follows hexagonal architecture principles:
//!
//! - **Domain**: entities, statuses and actors with no infrastructure
//!   dependencies
//! - **Ports**: the store and notification traits
//! - **Adapters**: in-memory, `PostgreSQL` and tracing implementations
//! - **Services**: the transition pipeline, side-effect dispatcher, workflow
//!   facade and the scheduled sweep
//!
//! # Modules
//!
//! - [`placement`]: the workflow engine
//! - [`config`]: environment-driven settings
//! - [`telemetry`]: tracing subscriber setup

pub mod config;
pub mod placement;
pub mod telemetry;
