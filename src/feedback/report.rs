//! Per-iteration snapshots handed to feedback receivers.

use crate::state::{IterationOutcome, StepOutcome};

/// Snapshot of one iteration, with states already transformed into the
/// receiver-chosen type `U`.
///
/// The transform runs inside the engine, so receivers never see the
/// engine's internal state type and can persist or display whatever view
/// they asked for.
#[derive(Debug, Clone)]
pub struct IterationReport<U> {
    /// Zero-based iteration index.
    pub iteration: usize,
    /// The chain's current state after the decision.
    pub current: U,
    /// The best state seen so far.
    pub best: U,
    /// This iteration's candidate, if one was proposed.
    pub proposal: Option<U>,
    /// Energy of the current state.
    pub current_energy: f64,
    /// Energy of the best state.
    pub best_energy: f64,
    /// Decision metadata recorded by the step, including the kernel
    /// identifier, duration, and temperature.
    pub outcome: IterationOutcome,
    /// Whether this iteration's proposal was accepted.
    pub accepted: bool,
    /// Whether this iteration set a new best.
    pub new_best: bool,
}

impl<U> IterationReport<U> {
    /// Identifier of the kernel that drove the iteration, if one was
    /// selected.
    pub fn kernel_id(&self) -> Option<&str> {
        self.outcome.kernel_id.as_deref()
    }

    /// Whether the iteration produced no proposal at all.
    pub fn no_proposal(&self) -> bool {
        matches!(self.outcome.outcome, StepOutcome::NoProposal(_))
    }
}
