//! Per-iteration state machine around a [`DualState`].

use std::time::Duration;

use super::dual::{DualState, NoBestError};
use crate::kernel::EntityId;

/// Why an iteration produced no proposal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProposerFailureReason {
    /// The kernel had no valid move from the current state.
    NothingToPropose,
    /// Kernel selection itself produced no kernel.
    SelectionFailed,
    /// Proposal generation failed; the failure is demoted, not fatal.
    ProposalFailed(String),
}

/// The decision recorded for one iteration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    /// The proposal replaced the current state.
    Accepted { changed: Vec<EntityId> },
    /// The proposal was discarded; the current state is unchanged.
    Rejected,
    /// No proposal reached the decision phase.
    NoProposal(ProposerFailureReason),
}

/// Metadata describing one completed iteration.
#[derive(Debug, Clone, PartialEq)]
pub struct IterationOutcome {
    pub outcome: StepOutcome,
    /// Identifier of the kernel that drove the iteration, if one was
    /// selected.
    pub kernel_id: Option<String>,
    /// Wall-clock duration of the iteration.
    pub duration: Duration,
    /// Temperature under which the decision was made, if the scheme uses
    /// one.
    pub temperature: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Idle,
    Pending,
}

/// State machine for one proposal/decision cycle.
///
/// Each iteration moves `Idle -> Pending -> {Accepted, Rejected}` or
/// records a no-proposal outcome directly, then returns to `Idle`. Energy
/// values are cached so no state is scored twice within one iteration.
///
/// Deciding without a pending proposal is a programming error, distinct
/// from the legitimate no-proposal business outcome, and panics.
#[derive(Debug, Clone)]
pub struct OptimizationStep<T> {
    dual: DualState<T>,
    current_energy: f64,
    best_energy: f64,
    pending: Option<T>,
    pending_energy: Option<f64>,
    pending_kernel: Option<String>,
    pending_changed: Vec<EntityId>,
    phase: Phase,
    last: Option<IterationOutcome>,
    new_best: bool,
}

impl<T: Clone> OptimizationStep<T> {
    pub fn new() -> Self {
        Self {
            dual: DualState::new(),
            current_energy: f64::INFINITY,
            best_energy: f64::INFINITY,
            pending: None,
            pending_energy: None,
            pending_kernel: None,
            pending_changed: Vec::new(),
            phase: Phase::Idle,
            last: None,
            new_best: false,
        }
    }

    /// Seeds the chain: the starting state becomes both current and best.
    pub fn initialize(&mut self, state: T, energy: f64) {
        self.dual.assign_current(state);
        self.dual.assign_best_from_current();
        self.current_energy = energy;
        self.best_energy = energy;
    }

    /// Records this iteration's candidate and the kernel that produced it.
    ///
    /// A `None` candidate records a no-proposal outcome directly, skipping
    /// the decision phase.
    pub fn assign_proposal(
        &mut self,
        candidate: Option<T>,
        kernel_id: impl Into<String>,
        changed: Vec<EntityId>,
    ) {
        assert!(
            self.phase == Phase::Idle,
            "assign_proposal called while a proposal is already pending"
        );
        self.new_best = false;
        let kernel_id = kernel_id.into();
        match candidate {
            Some(candidate) => {
                self.pending = Some(candidate);
                self.pending_energy = None;
                self.pending_kernel = Some(kernel_id);
                self.pending_changed = changed;
                self.phase = Phase::Pending;
                self.last = None;
            }
            None => {
                self.last = Some(IterationOutcome {
                    outcome: StepOutcome::NoProposal(ProposerFailureReason::NothingToPropose),
                    kernel_id: Some(kernel_id),
                    duration: Duration::ZERO,
                    temperature: None,
                });
            }
        }
    }

    /// Records an iteration that never reached the decision phase. The
    /// current and best states are untouched.
    pub fn mark_no_proposal(
        &mut self,
        reason: ProposerFailureReason,
        kernel_id: Option<String>,
    ) {
        assert!(
            self.phase == Phase::Idle,
            "mark_no_proposal called while a proposal is pending"
        );
        self.new_best = false;
        self.last = Some(IterationOutcome {
            outcome: StepOutcome::NoProposal(reason),
            kernel_id,
            duration: Duration::ZERO,
            temperature: None,
        });
    }

    /// Scores the pending proposal once, caching the result for the
    /// decision phase.
    ///
    /// # Panics
    ///
    /// Panics if no proposal is pending.
    pub fn score_pending(&mut self, score_fn: impl Fn(&T) -> f64) -> f64 {
        let pending = self
            .pending
            .as_ref()
            .expect("score_pending called without a pending proposal");
        match self.pending_energy {
            Some(energy) => energy,
            None => {
                let energy = score_fn(pending);
                self.pending_energy = Some(energy);
                energy
            }
        }
    }

    /// Installs the pending proposal as the current state, updating best
    /// iff the proposal strictly improves on it. Returns the displaced
    /// current state.
    ///
    /// # Panics
    ///
    /// Panics if no proposal is pending.
    pub fn accept_proposal(&mut self, score_fn: impl Fn(&T) -> f64) -> Option<T> {
        assert!(
            self.phase == Phase::Pending,
            "accept_proposal called without a pending proposal"
        );
        let proposal = self.pending.take().expect("pending proposal in Pending phase");
        let energy = self
            .pending_energy
            .take()
            .unwrap_or_else(|| score_fn(&proposal));
        let changed = std::mem::take(&mut self.pending_changed);
        let kernel_id = self.pending_kernel.take();

        let displaced = self.dual.assign_current(proposal);
        self.current_energy = energy;
        if energy < self.best_energy {
            self.dual.assign_best_from_current();
            self.best_energy = energy;
            self.new_best = true;
        }

        self.phase = Phase::Idle;
        self.last = Some(IterationOutcome {
            outcome: StepOutcome::Accepted { changed },
            kernel_id,
            duration: Duration::ZERO,
            temperature: None,
        });
        displaced
    }

    /// Discards the pending proposal; the current state is unchanged.
    ///
    /// # Panics
    ///
    /// Panics if no proposal is pending.
    pub fn reject_proposal(&mut self) {
        assert!(
            self.phase == Phase::Pending,
            "reject_proposal called without a pending proposal"
        );
        self.pending = None;
        self.pending_energy = None;
        self.pending_changed.clear();
        let kernel_id = self.pending_kernel.take();

        self.phase = Phase::Idle;
        self.last = Some(IterationOutcome {
            outcome: StepOutcome::Rejected,
            kernel_id,
            duration: Duration::ZERO,
            temperature: None,
        });
    }

    /// Stamps timing metadata onto the outcome of the iteration just
    /// decided.
    pub fn complete_iteration(&mut self, duration: Duration, temperature: Option<f64>) {
        if let Some(last) = self.last.as_mut() {
            last.duration = duration;
            last.temperature = temperature;
        }
    }

    pub fn current(&self) -> Option<&T> {
        self.dual.current()
    }

    pub fn best(&self) -> Option<&T> {
        self.dual.best()
    }

    pub fn pending(&self) -> Option<&T> {
        self.pending.as_ref()
    }

    /// Energy of the current state; infinite until the chain is seeded.
    pub fn current_energy(&self) -> f64 {
        self.current_energy
    }

    /// Energy of the best state; infinite until the chain is seeded.
    pub fn best_energy(&self) -> f64 {
        self.best_energy
    }

    /// Whether the most recent decision set a new best. Valid for one
    /// iteration only.
    pub fn is_new_best(&self) -> bool {
        self.new_best
    }

    /// Outcome of the most recently completed iteration.
    pub fn last_outcome(&self) -> Option<&IterationOutcome> {
        self.last.as_ref()
    }

    /// Ends the step sequence, returning the best state.
    pub fn release_keep_best(&mut self) -> Result<T, NoBestError> {
        self.dual.release_keep_best()
    }
}

impl<T: Clone> Default for OptimizationStep<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn value_energy(state: &i64) -> f64 {
        *state as f64
    }

    #[test]
    fn test_initialize_sets_current_and_best() {
        let mut step = OptimizationStep::new();
        step.initialize(5i64, 5.0);
        assert_eq!(step.current(), Some(&5));
        assert_eq!(step.best(), Some(&5));
        assert_eq!(step.current_energy(), 5.0);
        assert_eq!(step.best_energy(), 5.0);
    }

    #[test]
    fn test_accept_effect() {
        let mut step = OptimizationStep::new();
        step.initialize(5i64, 5.0);

        step.assign_proposal(Some(3), "down", vec![EntityId(1)]);
        let displaced = step.accept_proposal(value_energy);

        assert_eq!(displaced, Some(5));
        assert_eq!(step.current(), Some(&3));
        assert_eq!(step.best(), Some(&3));
        assert!(step.is_new_best());
        match &step.last_outcome().unwrap().outcome {
            StepOutcome::Accepted { changed } => assert_eq!(changed, &vec![EntityId(1)]),
            other => panic!("expected Accepted, got {other:?}"),
        }
    }

    #[test]
    fn test_accept_worse_keeps_best() {
        let mut step = OptimizationStep::new();
        step.initialize(3i64, 3.0);

        step.assign_proposal(Some(8), "up", vec![]);
        step.accept_proposal(value_energy);

        assert_eq!(step.current(), Some(&8));
        assert_eq!(step.best(), Some(&3));
        assert!(!step.is_new_best());
        assert_eq!(step.best_energy(), 3.0);
    }

    #[test]
    fn test_energy_tie_keeps_first_best() {
        // Two distinct states with equal energy: the incumbent wins.
        let energy = |state: &(i64, i64)| state.0 as f64;
        let mut step = OptimizationStep::new();
        step.initialize((3, 0), 3.0);

        step.assign_proposal(Some((3, 1)), "tie", vec![]);
        step.accept_proposal(energy);

        assert_eq!(step.current(), Some(&(3, 1)));
        assert_eq!(step.best(), Some(&(3, 0)));
        assert!(!step.is_new_best());
    }

    #[test]
    fn test_reject_purity() {
        let mut step = OptimizationStep::new();
        step.initialize(5i64, 5.0);

        step.assign_proposal(Some(1), "down", vec![]);
        step.reject_proposal();

        assert_eq!(step.current(), Some(&5));
        assert_eq!(step.best(), Some(&5));
        assert_eq!(step.current_energy(), 5.0);
        assert!(!step.is_new_best());
        assert_eq!(
            step.last_outcome().unwrap().outcome,
            StepOutcome::Rejected
        );
    }

    #[test]
    fn test_no_proposal_purity() {
        let mut step = OptimizationStep::new();
        step.initialize(5i64, 5.0);

        step.mark_no_proposal(ProposerFailureReason::NothingToPropose, Some("dry".into()));

        assert_eq!(step.current(), Some(&5));
        assert_eq!(step.best(), Some(&5));
        assert_eq!(
            step.last_outcome().unwrap().outcome,
            StepOutcome::NoProposal(ProposerFailureReason::NothingToPropose)
        );
    }

    #[test]
    fn test_none_candidate_records_no_proposal() {
        let mut step = OptimizationStep::new();
        step.initialize(5i64, 5.0);

        step.assign_proposal(None, "dry", vec![]);

        let last = step.last_outcome().unwrap();
        assert_eq!(
            last.outcome,
            StepOutcome::NoProposal(ProposerFailureReason::NothingToPropose)
        );
        assert_eq!(last.kernel_id.as_deref(), Some("dry"));
    }

    #[test]
    fn test_score_pending_caches() {
        use std::cell::Cell;

        let calls = Cell::new(0u32);
        let counting = |state: &i64| {
            calls.set(calls.get() + 1);
            *state as f64
        };

        let mut step = OptimizationStep::new();
        step.initialize(5i64, 5.0);
        step.assign_proposal(Some(2), "down", vec![]);

        assert_eq!(step.score_pending(counting), 2.0);
        assert_eq!(step.score_pending(counting), 2.0);
        step.accept_proposal(counting);

        assert_eq!(calls.get(), 1);
        assert_eq!(step.current_energy(), 2.0);
    }

    #[test]
    fn test_complete_iteration_stamps_metadata() {
        let mut step = OptimizationStep::new();
        step.initialize(5i64, 5.0);
        step.assign_proposal(Some(2), "down", vec![]);
        step.accept_proposal(value_energy);
        step.complete_iteration(Duration::from_millis(3), Some(0.5));

        let last = step.last_outcome().unwrap();
        assert_eq!(last.duration, Duration::from_millis(3));
        assert_eq!(last.temperature, Some(0.5));
    }

    #[test]
    fn test_release_returns_best() {
        let mut step = OptimizationStep::new();
        step.initialize(5i64, 5.0);
        step.assign_proposal(Some(2), "down", vec![]);
        step.accept_proposal(value_energy);
        step.assign_proposal(Some(9), "up", vec![]);
        step.accept_proposal(value_energy);

        assert_eq!(step.release_keep_best(), Ok(2));
    }

    #[test]
    fn test_release_without_best_fails() {
        let mut step: OptimizationStep<i64> = OptimizationStep::new();
        assert_eq!(step.release_keep_best(), Err(NoBestError));
    }

    #[test]
    #[should_panic(expected = "accept_proposal called without a pending proposal")]
    fn test_accept_without_pending_panics() {
        let mut step = OptimizationStep::new();
        step.initialize(5i64, 5.0);
        step.accept_proposal(value_energy);
    }

    #[test]
    #[should_panic(expected = "reject_proposal called without a pending proposal")]
    fn test_reject_without_pending_panics() {
        let mut step: OptimizationStep<i64> = OptimizationStep::new();
        step.reject_proposal();
    }

    #[test]
    #[should_panic(expected = "assign_proposal called while a proposal is already pending")]
    fn test_assign_while_pending_panics() {
        let mut step = OptimizationStep::new();
        step.initialize(5i64, 5.0);
        step.assign_proposal(Some(1), "a", vec![]);
        step.assign_proposal(Some(2), "b", vec![]);
    }

    #[test]
    #[should_panic(expected = "accept_proposal called without a pending proposal")]
    fn test_accept_after_none_candidate_panics() {
        let mut step = OptimizationStep::new();
        step.initialize(5i64, 5.0);
        step.assign_proposal(None, "dry", vec![]);
        step.accept_proposal(value_energy);
    }

    proptest! {
        /// Over any decision sequence, the best energy never worsens and
        /// the released best matches the minimum accepted energy.
        #[test]
        fn best_energy_never_worsens(
            moves in prop::collection::vec((any::<i16>(), any::<bool>()), 1..200)
        ) {
            let mut step = OptimizationStep::new();
            step.initialize(0i64, 0.0);

            let mut previous_best = step.best_energy();
            let mut lowest_seen = 0.0f64;
            for (candidate, accept) in moves {
                step.assign_proposal(Some(candidate as i64), "walk", vec![]);
                if accept {
                    step.accept_proposal(value_energy);
                    lowest_seen = lowest_seen.min(candidate as f64);
                } else {
                    step.reject_proposal();
                }
                prop_assert!(step.best_energy() <= previous_best);
                previous_best = step.best_energy();
            }

            prop_assert_eq!(step.best_energy(), lowest_seen);
            let released = step.release_keep_best().unwrap();
            prop_assert_eq!(released as f64, lowest_seen);
        }
    }
}
