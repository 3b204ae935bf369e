//! Application services for task dependency and lifecycle orchestration.

mod dependency;
mod error;
mod lifecycle;
mod readiness;
mod running_time;
mod state_machine;

pub use dependency::DependencyResolver;
pub use error::{TaskLifecycleError, TaskLifecycleResult};
pub use lifecycle::{CreateTaskRequest, TaskLifecycleService, TaskView};
pub use readiness::ReadinessEvaluator;
pub use running_time::RunningTimeAggregator;
pub use state_machine::{StateMachine, TransitionOutcome};
