//! Core traits for proposal kernels.

use rand::Rng;
use thiserror::Error;

/// Identifier of a single entity inside a configuration.
///
/// Opaque to the engine. Kernels and auxiliary indexes agree on its meaning;
/// the engine only forwards these ids so indexes can update incrementally
/// instead of rebuilding from the full configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EntityId(pub u64);

/// Axis-aligned extent of the search domain.
///
/// Cardinality-changing kernels relate the intensity prior to the volume the
/// configuration lives in; see [`crate::kernel::birth_ratio`].
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Extent {
    pub width: f64,
    pub height: f64,
    pub depth: f64,
}

impl Extent {
    pub fn new(width: f64, height: f64, depth: f64) -> Self {
        Self {
            width,
            height,
            depth,
        }
    }

    /// A two-dimensional extent (unit depth).
    pub fn flat(width: f64, height: f64) -> Self {
        Self::new(width, height, 1.0)
    }

    /// The unit cube.
    pub fn unit() -> Self {
        Self::new(1.0, 1.0, 1.0)
    }

    pub fn volume(&self) -> f64 {
        self.width * self.height * self.depth
    }
}

impl Default for Extent {
    fn default() -> Self {
        Self::unit()
    }
}

/// Error raised when a kernel cannot complete its pre-search setup.
#[derive(Debug, Clone, Error)]
#[error("kernel initialization failed: {0}")]
pub struct InitError(pub String);

/// Error raised when proposal generation fails outright.
///
/// Distinct from `Ok(None)`, which means the kernel legitimately has nothing
/// to propose from the given state. The search loop demotes this error to a
/// no-proposal iteration instead of aborting the chain.
#[derive(Debug, Clone, Error)]
#[error("proposal generation failed: {0}")]
pub struct ProposalError(pub String);

/// Error raised when an auxiliary index rejects an incremental update.
#[derive(Debug, Clone, Error)]
#[error("auxiliary index update failed: {0}")]
pub struct IndexUpdateError(pub String);

/// An incrementally updatable structure coupled to one search chain.
///
/// Typical implementations are spatial overlap or adjacency indexes over the
/// entities of the current configuration. An index is owned by exactly one
/// chain and mutated only through accepted proposals; sharing one across
/// chains requires external synchronization and is not supported here.
pub trait AuxiliaryIndex<T> {
    /// Applies the delta between `prior` and `accepted`.
    ///
    /// `changed` lists the entities the accepting kernel touched, so the
    /// index can avoid a full rebuild.
    fn apply_update(
        &mut self,
        prior: &T,
        accepted: &T,
        changed: &[EntityId],
    ) -> Result<(), IndexUpdateError>;
}

/// Auxiliary index that ignores every update.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullIndex;

impl<T> AuxiliaryIndex<T> for NullIndex {
    fn apply_update(
        &mut self,
        _prior: &T,
        _accepted: &T,
        _changed: &[EntityId],
    ) -> Result<(), IndexUpdateError> {
        Ok(())
    }
}

/// A stochastic operator proposing candidate configurations.
///
/// One kernel encodes one move family (perturb an entity, add one, remove
/// one, merge two, ...). The search loop selects a kernel each iteration,
/// asks it for a proposal from the current state, and decides acceptance
/// using the kernel's probability correction.
///
/// # Categories
///
/// *Independent* kernels draw proposals from the current state alone and
/// leave [`Kernel::notify_latest_state`] as the default no-op. *Adaptive*
/// kernels maintain internal state updated through that hook to shape future
/// proposals. Both kinds must tolerate being called any number of times
/// within one chain.
///
/// # Detailed balance
///
/// Kernels that change the entity count of the configuration must override
/// [`Kernel::acceptance_probability`] with the correction that keeps the
/// chain's stationary distribution intact (see [`crate::kernel::birth_ratio`]
/// and [`crate::kernel::death_ratio`] for the standard birth/death forms).
/// Getting this wrong breaks statistical correctness without any visible
/// symptom, so validate new kernel families against cases with a known
/// stationary distribution.
///
/// # Examples
///
/// ```ignore
/// struct PerturbMark;
///
/// impl Kernel<Configuration, Domain> for PerturbMark {
///     fn make_proposal<R: Rng>(
///         &mut self,
///         existing: &Configuration,
///         domain: &Domain,
///         rng: &mut R,
///     ) -> Result<Option<Configuration>, ProposalError> {
///         if existing.is_empty() {
///             return Ok(None);
///         }
///         let i = rng.random_range(0..existing.len());
///         self.touched = Some(existing.id_at(i));
///         Ok(Some(existing.with_jittered(i, rng)))
///     }
///
///     fn changed_entity_ids(&self) -> Vec<EntityId> {
///         self.touched.into_iter().collect()
///     }
/// }
/// ```
///
/// # References
///
/// Green (1995), "Reversible jump Markov chain Monte Carlo computation and
/// Bayesian model determination"
pub trait Kernel<T, C>: Send {
    /// Called exactly once per instance before any proposal.
    ///
    /// Kernels that depend on run-wide setup (domain bounds, lookup tables)
    /// must fail here rather than on first use.
    fn init_before_search(&mut self, _context: &C) -> Result<(), InitError> {
        Ok(())
    }

    /// Generates a candidate from `existing`, or `None` if no valid move
    /// exists (e.g. a removal kernel applied to an empty configuration).
    ///
    /// Proposals depend only on `existing`, `context`, the injected random
    /// source, and (for adaptive kernels) state accumulated through
    /// [`Kernel::notify_latest_state`].
    fn make_proposal<R: Rng>(
        &mut self,
        existing: &T,
        context: &C,
        rng: &mut R,
    ) -> Result<Option<T>, ProposalError>;

    /// Metropolis-Hastings correction for this kernel's proposal density,
    /// in `[0, 1]`.
    ///
    /// The default of 1.0 is correct for symmetric, cardinality-preserving
    /// kernels only.
    fn acceptance_probability(
        &self,
        _existing_size: usize,
        _proposed_size: usize,
        _intensity_prior: f64,
        _extent: &Extent,
        _density_ratio: f64,
    ) -> f64 {
        1.0
    }

    /// Entities touched by the most recent proposal.
    ///
    /// Valid only after [`Kernel::make_proposal`] returned `Some`; calling
    /// it in any other situation is a contract violation.
    fn changed_entity_ids(&self) -> Vec<EntityId>;

    /// Pushes the accepted proposal's delta into the chain's auxiliary
    /// index.
    ///
    /// The default forwards [`Kernel::changed_entity_ids`]; kernels with
    /// richer index knowledge can override.
    fn on_accept(
        &self,
        index: &mut dyn AuxiliaryIndex<T>,
        prior: &T,
        accepted: &T,
    ) -> Result<(), IndexUpdateError> {
        index.apply_update(prior, accepted, &self.changed_entity_ids())
    }

    /// Observes every accepted state of the chain, whichever kernel
    /// produced it. Default no-op; adaptive kernels override.
    fn notify_latest_state(&mut self, _accepted: &T) {}
}
