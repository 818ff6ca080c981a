//! Weighted kernel portfolio and roulette-wheel selection.

use rand::Rng;

/// Per-kernel usage counters.
///
/// `declined + failed` iterations reached the decision phase with nothing to
/// decide; a kernel whose failures keep growing is misbehaving even though
/// the chain itself keeps running.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct KernelStats {
    /// Proposals produced (a `Some` result).
    pub proposals: u64,
    /// Proposals accepted by the decision step.
    pub accepted: u64,
    /// Iterations where the kernel had nothing to propose.
    pub declined: u64,
    /// Proposal computations that failed and were demoted.
    pub failed: u64,
}

impl KernelStats {
    /// Fraction of produced proposals that were accepted.
    pub fn acceptance_rate(&self) -> f64 {
        if self.proposals == 0 {
            0.0
        } else {
            self.accepted as f64 / self.proposals as f64
        }
    }
}

/// One kernel's statistics tagged with its identifier, for reporting.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct KernelStatsSnapshot {
    pub id: String,
    pub stats: KernelStats,
}

/// A kernel paired with a stable identifier and usage statistics.
///
/// Identity is the identifier alone: two entries with the same id are the
/// same kernel as far as equality and reporting are concerned, regardless
/// of the kernel values they wrap.
#[derive(Debug, Clone)]
pub struct IdentifiedKernel<K> {
    id: String,
    pub kernel: K,
    stats: KernelStats,
}

impl<K> IdentifiedKernel<K> {
    pub fn new(id: impl Into<String>, kernel: K) -> Self {
        Self {
            id: id.into(),
            kernel,
            stats: KernelStats::default(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn stats(&self) -> &KernelStats {
        &self.stats
    }

    pub(crate) fn stats_mut(&mut self) -> &mut KernelStats {
        &mut self.stats
    }
}

impl<K> PartialEq for IdentifiedKernel<K> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl<K> Eq for IdentifiedKernel<K> {}

/// An ordered list of identified kernels with selection weights.
///
/// Selection is a roulette wheel over the list order: draw
/// `u ~ Uniform(0, total)`, walk the cumulative weights, return the first
/// kernel whose cumulative weight exceeds `u`. The walk is over a plain
/// `Vec`, so selection is deterministic given the RNG stream.
///
/// A zero-weight kernel is never selected but keeps its statistics entry.
///
/// # Examples
///
/// ```ignore
/// let portfolio = KernelPortfolio::new()
///     .push("birth", BirthKernel::new(), 0.2)
///     .push("death", DeathKernel::new(), 0.2)
///     .push("perturb", PerturbKernel::new(), 0.6);
/// ```
#[derive(Debug, Clone)]
pub struct KernelPortfolio<K> {
    entries: Vec<(IdentifiedKernel<K>, f64)>,
}

impl<K> KernelPortfolio<K> {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Adds a kernel under `id` with selection `weight`. Builder-style.
    pub fn push(mut self, id: impl Into<String>, kernel: K, weight: f64) -> Self {
        self.entries.push((IdentifiedKernel::new(id, kernel), weight));
        self
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn total_weight(&self) -> f64 {
        self.entries.iter().map(|(_, w)| w).sum()
    }

    pub fn get(&self, index: usize) -> Option<&IdentifiedKernel<K>> {
        self.entries.get(index).map(|(k, _)| k)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut IdentifiedKernel<K>> {
        self.entries.get_mut(index).map(|(k, _)| k)
    }

    pub fn kernels(&self) -> impl Iterator<Item = &IdentifiedKernel<K>> {
        self.entries.iter().map(|(k, _)| k)
    }

    pub fn kernels_mut(&mut self) -> impl Iterator<Item = &mut IdentifiedKernel<K>> {
        self.entries.iter_mut().map(|(k, _)| k)
    }

    pub fn ids(&self) -> Vec<String> {
        self.entries.iter().map(|(k, _)| k.id.clone()).collect()
    }

    pub fn stats_snapshot(&self) -> Vec<KernelStatsSnapshot> {
        self.entries
            .iter()
            .map(|(k, _)| KernelStatsSnapshot {
                id: k.id.clone(),
                stats: k.stats,
            })
            .collect()
    }

    /// Validates the portfolio.
    pub fn validate(&self) -> Result<(), String> {
        if self.entries.is_empty() {
            return Err("at least one kernel required".into());
        }
        for (i, (kernel, weight)) in self.entries.iter().enumerate() {
            if !weight.is_finite() || *weight < 0.0 {
                return Err(format!(
                    "kernel `{}` has invalid weight {weight}",
                    kernel.id
                ));
            }
            for (earlier, _) in &self.entries[..i] {
                if earlier.id == kernel.id {
                    return Err(format!("duplicate kernel id `{}`", kernel.id));
                }
            }
        }
        if self.total_weight() <= 0.0 {
            return Err("total kernel weight must be positive".into());
        }
        Ok(())
    }

    /// Roulette-wheel selection; `None` if nothing is selectable.
    pub fn select_index<R: Rng>(&self, rng: &mut R) -> Option<usize> {
        let total = self.total_weight();
        if self.entries.is_empty() || total <= 0.0 {
            return None;
        }
        let mut roll = rng.random_range(0.0..total);
        let mut last_positive = None;
        for (i, (_, weight)) in self.entries.iter().enumerate() {
            if *weight <= 0.0 {
                continue;
            }
            last_positive = Some(i);
            roll -= weight;
            if roll < 0.0 {
                return Some(i);
            }
        }
        // Rounding at the upper edge of the draw lands on the last
        // selectable kernel.
        last_positive
    }

    /// Roulette-wheel selection returning the kernel entry itself.
    pub fn select<R: Rng>(&self, rng: &mut R) -> Option<&IdentifiedKernel<K>> {
        self.select_index(rng).and_then(|index| self.get(index))
    }
}

impl<K> Default for KernelPortfolio<K> {
    fn default() -> Self {
        Self::new()
    }
}
