//! Problem definition for annealed configuration search.

use rand::Rng;

use crate::kernel::Extent;

/// Defines an annealed configuration-search problem.
///
/// The user supplies the starting configuration, the energy function, and
/// the entity count; kernels receive the problem value as their context, so
/// domain data (extent, priors) reaches them without a second context
/// object.
///
/// # Minimization
///
/// The engine minimizes energy. For maximization, negate the energy.
///
/// # Examples
///
/// ```ignore
/// struct SegmentFit { observed: Image }
///
/// impl SearchProblem for SegmentFit {
///     type State = Configuration;
///
///     fn initial_state<R: Rng>(&self, rng: &mut R) -> Configuration {
///         Configuration::seeded(&self.observed, rng)
///     }
///
///     fn energy(&self, state: &Configuration) -> f64 {
///         self.observed.mismatch(state)
///     }
///
///     fn entity_count(&self, state: &Configuration) -> usize {
///         state.marks().len()
///     }
///
///     fn extent(&self) -> Extent {
///         self.observed.bounds()
///     }
/// }
/// ```
pub trait SearchProblem: Send + Sync {
    /// The configuration representation type.
    type State: Clone + Send;

    /// Creates the starting configuration for one chain.
    fn initial_state<R: Rng>(&self, rng: &mut R) -> Self::State;

    /// Computes the energy of a configuration. Lower is better.
    fn energy(&self, state: &Self::State) -> f64;

    /// Number of discrete entities in the configuration, fed to
    /// cardinality-changing kernels' acceptance ratios.
    fn entity_count(&self, state: &Self::State) -> usize;

    /// Extent of the domain the configuration lives in.
    fn extent(&self) -> Extent {
        Extent::unit()
    }

    /// Poisson intensity prior over the entity count, fed to jump
    /// acceptance ratios. The default is neutral.
    fn intensity_prior(&self) -> f64 {
        1.0
    }

    /// Reference-measure density ratio handed to kernel acceptance
    /// probabilities. The default is neutral.
    fn density_ratio(&self) -> f64 {
        1.0
    }
}
