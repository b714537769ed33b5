//! Application services for placement workflow orchestration.

mod dispatcher;
mod error;
mod pipeline;
mod relay;
mod scheduler;
mod sweep;
mod workflow;

pub use dispatcher::{CAPACITY_EXHAUSTED, SideEffect, SideEffectDispatcher, closing_status};
pub use error::{WorkflowError, WorkflowResult};
pub use pipeline::{DEFAULT_RETRY_BACKOFF, TransitionPipeline, TransitionResult};
pub use relay::{NotificationRelay, RELAY_BATCH_SIZE};
pub use scheduler::{DEFAULT_SWEEP_INTERVAL, SweepScheduler};
pub use sweep::{InternshipSweep, SweepFailure, SweepReport};
pub use workflow::{AttendanceRecord, EvaluationDraft, TransitionResponse, WorkflowService};
