//! Unit tests for the placement workflow engine.
//!
//! Tests are organised by component: the allow-list and validator, the
//! side-effect dispatcher, the workflow facade, the date-driven sweep, its
//! scheduler, and the in-memory store contract. Racing writers have their
//! own module.

mod domain_tests;
mod support;
