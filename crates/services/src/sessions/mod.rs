mod plan;
mod pool;
mod queue;
mod readiness;
mod runner;
mod workflow;

// Public API of the session subsystem.
pub use crate::error::SessionError;
pub use plan::{SessionPlan, SessionPlanner};
pub use pool::ItemPool;
pub use queue::{REQUEUE_DISTANCE, SessionQueue};
pub use readiness::{Generation, Readiness, ReadinessConfig, ReadinessGate};
pub use runner::{SessionRunner, Step, TerminalAnswer};
pub use workflow::{ActiveSession, Question, SessionAnswerResult, SessionLoopService};
