//! Annealed kernel-search scheme: the driving loop and its configuration.
//!
//! A temperature-annealed accept/reject loop over proposals drawn from a
//! weighted kernel portfolio. Worsening moves are accepted with probability
//! `exp(-delta / T)` times the proposing kernel's correction, so
//! cardinality-changing kernel families can keep detailed balance.
//!
//! # References
//!
//! - Kirkpatrick, Gelatt & Vecchi (1983), "Optimization by Simulated
//!   Annealing"
//! - Green (1995), "Reversible jump Markov chain Monte Carlo computation
//!   and Bayesian model determination"

mod chains;
mod config;
mod runner;
mod types;

pub use chains::{ChainSetConfig, ChainSetResult, MultiChainRunner};
pub use config::{AnnealConfig, CoolingSchedule};
pub use runner::{AnnealRunner, SearchError, SearchResult};
pub use types::SearchProblem;
