//! Adapter implementations for placement workflow ports.

pub mod clock;
pub mod memory;
pub mod postgres;
pub mod tracing_queue;
