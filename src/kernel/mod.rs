//! Proposal kernels: pluggable stochastic operators over configurations.
//!
//! A kernel encodes one move family; a [`KernelPortfolio`] groups kernels
//! under stable identifiers with selection weights and per-kernel
//! statistics. Kernels that change the entity count of the configuration
//! carry a Metropolis-Hastings correction so the chain keeps detailed
//! balance; [`birth_ratio`]/[`death_ratio`] provide the standard forms.
//!
//! # References
//!
//! - Green (1995), "Reversible jump Markov chain Monte Carlo computation
//!   and Bayesian model determination"
//! - Geyer & Moller (1994), "Simulation procedures and likelihood inference
//!   for spatial point processes"

mod portfolio;
mod ratio;
mod types;

pub use portfolio::{IdentifiedKernel, KernelPortfolio, KernelStats, KernelStatsSnapshot};
pub use ratio::{birth_ratio, death_ratio};
pub use types::{
    AuxiliaryIndex, EntityId, Extent, IndexUpdateError, InitError, Kernel, NullIndex,
    ProposalError,
};
