//! Cooperative termination: stop predicates polled once per iteration.

mod conditions;
mod types;

pub use conditions::{AnyOf, CancelFlag, MaxIterations, Plateau, TimeBudget};
pub use types::{RunStatus, StopReason, TerminationCondition};
