//! Annealed search loop execution.

use std::time::Instant;

use log::{debug, warn};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use thiserror::Error;

use super::config::{AnnealConfig, CoolingSchedule};
use super::types::SearchProblem;
use crate::feedback::{
    BeginParams, EndParams, FeedbackReceiver, IterationReport, MisconfiguredError, NullFeedback,
};
use crate::kernel::{
    AuxiliaryIndex, IndexUpdateError, InitError, Kernel, KernelPortfolio, KernelStatsSnapshot,
    NullIndex,
};
use crate::state::{OptimizationStep, ProposerFailureReason, StepOutcome};
use crate::termination::{RunStatus, StopReason, TerminationCondition};

/// Fatal failure of a search run.
///
/// Deliberate stops (cancellation, exhausted budgets) are not errors; they
/// surface as the [`StopReason`] of an ordinary [`SearchResult`]. An `Err`
/// means the run produced no usable state.
#[derive(Debug, Error)]
pub enum SearchError {
    /// The schedule or portfolio configuration is invalid.
    #[error("invalid search configuration: {0}")]
    InvalidConfig(String),

    /// A kernel failed its pre-search initialization.
    #[error("kernel `{id}` failed to initialize: {source}")]
    KernelInit { id: String, source: InitError },

    /// A feedback receiver rejected the run during pre-run validation.
    #[error(transparent)]
    Misconfigured(#[from] MisconfiguredError),

    /// An auxiliary index refused an incremental update after acceptance,
    /// leaving it out of sync with the chain.
    #[error("auxiliary index update failed after accepting a proposal from `{id}`: {source}")]
    IndexUpdate { id: String, source: IndexUpdateError },
}

/// Result of one annealed search run.
#[derive(Debug, Clone)]
pub struct SearchResult<T> {
    /// The best configuration found.
    pub best: T,

    /// Energy of the best configuration.
    pub best_energy: f64,

    /// Proposal attempts performed, including no-proposal iterations.
    pub iterations: usize,

    /// Accepted proposals (including improvements).
    pub accepted_moves: usize,

    /// Accepted proposals that improved on the previous best.
    pub improving_moves: usize,

    /// Iterations that produced no proposal.
    pub no_proposal_iterations: usize,

    /// Temperature when the run stopped.
    pub final_temperature: f64,

    /// Why the run stopped.
    pub stop: StopReason,

    /// Final per-kernel statistics.
    pub kernel_stats: Vec<KernelStatsSnapshot>,
}

impl<T> SearchResult<T> {
    /// Whether the run was stopped by an external cancellation flag.
    pub fn cancelled(&self) -> bool {
        matches!(self.stop, StopReason::Cancelled)
    }
}

/// Executes the annealed kernel-search loop.
///
/// Each iteration: select a kernel by weighted draw, ask it for a proposal
/// from the current state, decide acceptance (unconditionally if the
/// proposal is at least as good, otherwise with probability
/// `exp(-delta / T)` times the kernel's correction), apply the decision,
/// publish a snapshot, poll termination, cool.
///
/// A single chain is strictly sequential; Markov-chain validity depends on
/// the iteration order. Run independent chains concurrently with
/// [`super::MultiChainRunner`].
pub struct AnnealRunner;

impl AnnealRunner {
    /// Runs the search with a null auxiliary index and no observer.
    pub fn run_minimal<P, K>(
        problem: &P,
        portfolio: &mut KernelPortfolio<K>,
        termination: &mut dyn TerminationCondition,
        config: &AnnealConfig,
    ) -> Result<SearchResult<P::State>, SearchError>
    where
        P: SearchProblem,
        K: Kernel<P::State, P>,
    {
        Self::run(
            problem,
            portfolio,
            &mut NullIndex,
            &mut NullFeedback,
            |_| (),
            termination,
            config,
        )
    }

    /// Runs the search.
    ///
    /// # Arguments
    /// * `problem` - Starting state, energy function, and domain data
    /// * `portfolio` - Weighted kernels; statistics accumulate in place
    /// * `index` - Auxiliary structure updated on every acceptance
    /// * `feedback` - Observer of run progress
    /// * `transform` - Maps engine states into the observer's report type
    /// * `termination` - Stop predicate polled once per iteration
    /// * `config` - Annealing schedule
    ///
    /// Proposal failures are demoted to no-proposal iterations and recorded
    /// in the kernel's statistics; they never abort the chain.
    pub fn run<P, K, X, F, U, G>(
        problem: &P,
        portfolio: &mut KernelPortfolio<K>,
        index: &mut X,
        feedback: &mut F,
        transform: G,
        termination: &mut dyn TerminationCondition,
        config: &AnnealConfig,
    ) -> Result<SearchResult<P::State>, SearchError>
    where
        P: SearchProblem,
        K: Kernel<P::State, P>,
        X: AuxiliaryIndex<P::State>,
        F: FeedbackReceiver<U>,
        G: Fn(&P::State) -> U,
    {
        config.validate().map_err(SearchError::InvalidConfig)?;
        portfolio.validate().map_err(SearchError::InvalidConfig)?;

        let seed = config.seed.unwrap_or_else(rand::random);
        let mut rng = StdRng::seed_from_u64(seed);

        for entry in portfolio.kernels_mut() {
            let id = entry.id().to_string();
            entry
                .kernel
                .init_before_search(problem)
                .map_err(|source| SearchError::KernelInit { id, source })?;
        }

        let mut step = OptimizationStep::new();
        let initial = problem.initial_state(&mut rng);
        let initial_energy = problem.energy(&initial);
        step.initialize(initial, initial_energy);

        let begin = BeginParams {
            kernel_ids: portfolio.ids(),
            seed,
            initial_energy,
            initial_temperature: config.initial_temperature,
        };
        feedback.validate_configuration(&begin)?;
        feedback.report_begin(&begin);
        debug!(
            "search started: {} kernels, seed {seed}, E0 {initial_energy:.6}",
            begin.kernel_ids.len()
        );

        let mut temperature = config.initial_temperature;
        let mut iteration = 0usize;
        let mut accepted_moves = 0usize;
        let mut improving_moves = 0usize;
        let mut no_proposal_iterations = 0usize;
        let started = Instant::now();

        let stop = loop {
            let status = RunStatus {
                iteration,
                best_energy: step.best_energy(),
                elapsed: started.elapsed(),
            };
            if let Some(reason) = termination.should_stop(&status) {
                break reason;
            }

            let iteration_started = Instant::now();
            let mut proposal_view: Option<U> = None;

            match portfolio.select_index(&mut rng) {
                None => {
                    no_proposal_iterations += 1;
                    step.mark_no_proposal(ProposerFailureReason::SelectionFailed, None);
                }
                Some(selected) => {
                    let entry = portfolio.get_mut(selected).expect("selected index in range");
                    let kernel_id = entry.id().to_string();
                    let proposal = {
                        let current =
                            step.current().expect("chain seeded with an initial state");
                        entry.kernel.make_proposal(current, problem, &mut rng)
                    };
                    match proposal {
                        Err(error) => {
                            entry.stats_mut().failed += 1;
                            no_proposal_iterations += 1;
                            warn!("kernel `{kernel_id}` proposal failed, continuing: {error}");
                            step.mark_no_proposal(
                                ProposerFailureReason::ProposalFailed(error.to_string()),
                                Some(kernel_id),
                            );
                        }
                        Ok(None) => {
                            entry.stats_mut().declined += 1;
                            no_proposal_iterations += 1;
                            step.mark_no_proposal(
                                ProposerFailureReason::NothingToPropose,
                                Some(kernel_id),
                            );
                        }
                        Ok(Some(candidate)) => {
                            entry.stats_mut().proposals += 1;
                            let changed = entry.kernel.changed_entity_ids();
                            let existing_size = problem.entity_count(
                                step.current().expect("chain seeded with an initial state"),
                            );
                            let proposed_size = problem.entity_count(&candidate);
                            proposal_view = Some(transform(&candidate));
                            step.assign_proposal(Some(candidate), kernel_id.clone(), changed);

                            let current_energy = step.current_energy();
                            let proposal_energy =
                                step.score_pending(|state| problem.energy(state));
                            let delta = proposal_energy - current_energy;

                            let accept = if delta <= 0.0 {
                                true
                            } else if temperature > 0.0 {
                                let correction = entry.kernel.acceptance_probability(
                                    existing_size,
                                    proposed_size,
                                    problem.intensity_prior(),
                                    &problem.extent(),
                                    problem.density_ratio(),
                                );
                                let probability = (-delta / temperature).exp() * correction;
                                rng.random_range(0.0..1.0) < probability
                            } else {
                                false
                            };

                            if accept {
                                entry.stats_mut().accepted += 1;
                                accepted_moves += 1;
                                let displaced =
                                    step.accept_proposal(|state| problem.energy(state));
                                let prior =
                                    displaced.expect("chain seeded with an initial state");
                                if step.is_new_best() {
                                    improving_moves += 1;
                                }
                                let accepted_state = step
                                    .current()
                                    .expect("accepted proposal installed as current");
                                entry
                                    .kernel
                                    .on_accept(index, &prior, accepted_state)
                                    .map_err(|source| SearchError::IndexUpdate {
                                        id: kernel_id.clone(),
                                        source,
                                    })?;
                                // every kernel observes the accepted state,
                                // not only the proposer
                                for other in portfolio.kernels_mut() {
                                    other.kernel.notify_latest_state(accepted_state);
                                }
                            } else {
                                step.reject_proposal();
                            }
                        }
                    }
                }
            }

            step.complete_iteration(iteration_started.elapsed(), Some(temperature));

            let outcome = step
                .last_outcome()
                .cloned()
                .expect("iteration recorded an outcome");
            let accepted = matches!(outcome.outcome, StepOutcome::Accepted { .. });
            let report = IterationReport {
                iteration,
                current: transform(step.current().expect("chain seeded with an initial state")),
                best: transform(step.best().expect("chain seeded with an initial state")),
                proposal: proposal_view,
                current_energy: step.current_energy(),
                best_energy: step.best_energy(),
                outcome,
                accepted,
                new_best: step.is_new_best(),
            };
            feedback.report_iteration(&report);
            if report.new_best {
                debug!(
                    "new best at iteration {iteration}: E {:.6}",
                    report.best_energy
                );
                feedback.report_new_best(&report);
            }

            iteration += 1;
            temperature = cool(temperature, config, iteration).max(config.min_temperature);
        };

        let end = EndParams {
            iterations: iteration,
            best_energy: step.best_energy(),
            elapsed: started.elapsed(),
            stop: stop.clone(),
            kernel_stats: portfolio.stats_snapshot(),
        };
        feedback.report_end(&end);
        debug!(
            "search stopped after {iteration} iterations ({stop:?}): best E {:.6}",
            step.best_energy()
        );

        let best_energy = step.best_energy();
        let best = step
            .release_keep_best()
            .expect("initial state recorded as best");

        Ok(SearchResult {
            best,
            best_energy,
            iterations: iteration,
            accepted_moves,
            improving_moves,
            no_proposal_iterations,
            final_temperature: temperature,
            stop,
            kernel_stats: end.kernel_stats,
        })
    }
}

/// Applies the cooling schedule after `completed` iterations.
fn cool(temperature: f64, config: &AnnealConfig, completed: usize) -> f64 {
    match config.cooling {
        CoolingSchedule::Geometric { alpha } => temperature * alpha,

        CoolingSchedule::Linear { steps } => {
            let span = config.initial_temperature - config.min_temperature;
            config.initial_temperature - completed as f64 * span / steps as f64
        }

        CoolingSchedule::LundyMees { beta } => temperature / (1.0 + beta * temperature),
    }
}
