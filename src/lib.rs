//! Generic stochastic configuration-search engine.
//!
//! Finds a low-energy arrangement of discrete entities ("marks") by an
//! iterative propose/accept-or-reject process in the simulated-annealing /
//! reversible-jump family. The engine is domain-agnostic: it never
//! interprets what a configuration means, never computes an energy itself,
//! and performs no I/O — it consumes an energy function and a portfolio of
//! proposal kernels, and exposes observer snapshots.
//!
//! Subsystems:
//!
//! - **state**: the current/best pair of one chain and the per-iteration
//!   state machine that mutates it.
//! - **kernel**: the pluggable stochastic operator contract, the weighted
//!   kernel portfolio with roulette-wheel selection, and shared
//!   acceptance-ratio math for cardinality-changing move families.
//! - **termination**: cooperative stop predicates (iteration budget,
//!   wall-clock budget, plateau, cancellation) polled once per iteration.
//! - **feedback**: the observer protocol through which loggers, writers,
//!   or display layers receive typed iteration snapshots.
//! - **anneal**: the driving loop composing all of the above, plus the
//!   concurrent independent-chain runner.
//!
//! # Architecture
//!
//! One chain is strictly sequential: iteration `i + 1` is only valid with
//! respect to the state left by iteration `i`, so no per-iteration work is
//! split across threads. Parallelism lives at chain granularity — several
//! independent chains, each with its own state and RNG stream, reduced to
//! the best released state at the end.
//!
//! # Examples
//!
//! A one-kernel search that climbs an integer for fifty iterations:
//!
//! ```
//! use optimark::anneal::{AnnealConfig, AnnealRunner, SearchProblem};
//! use optimark::kernel::{EntityId, Kernel, KernelPortfolio, ProposalError};
//! use optimark::termination::MaxIterations;
//! use rand::Rng;
//!
//! struct Climb;
//!
//! impl SearchProblem for Climb {
//!     type State = i64;
//!
//!     fn initial_state<R: Rng>(&self, _rng: &mut R) -> i64 {
//!         0
//!     }
//!
//!     fn energy(&self, state: &i64) -> f64 {
//!         -(*state as f64)
//!     }
//!
//!     fn entity_count(&self, _state: &i64) -> usize {
//!         1
//!     }
//! }
//!
//! struct Increment;
//!
//! impl Kernel<i64, Climb> for Increment {
//!     fn make_proposal<R: Rng>(
//!         &mut self,
//!         existing: &i64,
//!         _context: &Climb,
//!         _rng: &mut R,
//!     ) -> Result<Option<i64>, ProposalError> {
//!         Ok(Some(existing + 1))
//!     }
//!
//!     fn changed_entity_ids(&self) -> Vec<EntityId> {
//!         vec![EntityId(0)]
//!     }
//! }
//!
//! let mut portfolio = KernelPortfolio::new().push("increment", Increment, 1.0);
//! let mut termination = MaxIterations::new(50);
//! let config = AnnealConfig::default().with_seed(42);
//!
//! let result = AnnealRunner::run_minimal(&Climb, &mut portfolio, &mut termination, &config)
//!     .unwrap();
//! assert_eq!(result.best, 50);
//! ```

pub mod anneal;
pub mod feedback;
pub mod kernel;
pub mod state;
pub mod termination;
