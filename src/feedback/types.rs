//! Observer contract for run progress.

use std::time::Duration;

use thiserror::Error;

use super::report::IterationReport;
use crate::kernel::KernelStatsSnapshot;
use crate::termination::StopReason;

/// Error raised by a receiver that rejects the run it is attached to.
#[derive(Debug, Clone, Error)]
#[error("feedback receiver misconfigured: {0}")]
pub struct MisconfiguredError(pub String);

/// Parameters describing a run about to start.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BeginParams {
    /// Kernel identifiers, in portfolio order.
    pub kernel_ids: Vec<String>,
    /// The resolved random seed driving the chain.
    pub seed: u64,
    /// Energy of the starting state.
    pub initial_energy: f64,
    /// Temperature at the start of the schedule.
    pub initial_temperature: f64,
}

/// Parameters describing a finished run.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EndParams {
    /// Proposal attempts performed.
    pub iterations: usize,
    /// Energy of the best state found.
    pub best_energy: f64,
    /// Wall-clock duration of the run.
    pub elapsed: Duration,
    /// Why the run stopped.
    pub stop: StopReason,
    /// Final per-kernel statistics.
    pub kernel_stats: Vec<KernelStatsSnapshot>,
}

/// Observer of optimization progress.
///
/// Receivers see immutable snapshots only; they can never influence the
/// engine's decisions, and composing several receivers (see
/// [`super::FanOutFeedback`]) does not change run semantics.
///
/// Lifecycle: `validate_configuration` once before the loop (an error
/// aborts the run before any work happens), `report_begin` once,
/// `report_iteration` every iteration, `report_new_best` additionally on
/// improvement, `report_end` once.
///
/// Every method defaults to a no-op so receivers implement only what they
/// observe.
pub trait FeedbackReceiver<U> {
    /// Rejects runs this receiver cannot serve, before any work happens.
    fn validate_configuration(&self, _run: &BeginParams) -> Result<(), MisconfiguredError> {
        Ok(())
    }

    fn report_begin(&mut self, _run: &BeginParams) {}

    fn report_iteration(&mut self, _report: &IterationReport<U>) {}

    /// Called after `report_iteration` whenever the iteration set a new
    /// best.
    fn report_new_best(&mut self, _report: &IterationReport<U>) {}

    fn report_end(&mut self, _end: &EndParams) {}
}
