//! Shared acceptance-ratio math for cardinality-changing kernels.
//!
//! These are the standard spatial birth/death corrections for a Poisson
//! reference process with intensity `intensity_prior` over a domain of the
//! given extent. Kernel families with asymmetric proposal densities fold
//! their extra Jacobian term into `density_ratio`.
//!
//! # References
//!
//! Geyer & Moller (1994), "Simulation procedures and likelihood inference
//! for spatial point processes"

use super::types::Extent;

/// Acceptance correction for adding one entity to a configuration of
/// `existing_size` entities: `lambda * V / (n + 1)`, scaled by
/// `density_ratio` and clamped to `[0, 1]`.
pub fn birth_ratio(
    existing_size: usize,
    intensity_prior: f64,
    extent: &Extent,
    density_ratio: f64,
) -> f64 {
    let mass = intensity_prior * extent.volume();
    if mass <= 0.0 {
        return 0.0;
    }
    let ratio = mass / (existing_size as f64 + 1.0) * density_ratio;
    ratio.clamp(0.0, 1.0)
}

/// Acceptance correction for removing one entity from a configuration of
/// `existing_size` entities: `n / (lambda * V)`, scaled by `density_ratio`
/// and clamped to `[0, 1]`.
///
/// Removal from an empty configuration has probability zero; a vanishing
/// prior mass makes any removal certain.
pub fn death_ratio(
    existing_size: usize,
    intensity_prior: f64,
    extent: &Extent,
    density_ratio: f64,
) -> f64 {
    if existing_size == 0 {
        return 0.0;
    }
    let mass = intensity_prior * extent.volume();
    if mass <= 0.0 {
        return 1.0;
    }
    (existing_size as f64 / mass * density_ratio).clamp(0.0, 1.0)
}
