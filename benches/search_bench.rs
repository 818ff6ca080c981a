//! Criterion benchmarks for the annealed search loop.
//!
//! Uses a synthetic point-configuration problem to measure engine overhead
//! independent of any domain.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::Rng;

use optimark::anneal::{AnnealConfig, AnnealRunner, SearchProblem};
use optimark::kernel::{EntityId, Extent, Kernel, KernelPortfolio, ProposalError};
use optimark::termination::MaxIterations;

// ===========================================================================
// Point fit: move points on a line onto fixed targets
// ===========================================================================

struct PointFit {
    targets: Vec<f64>,
}

impl SearchProblem for PointFit {
    type State = Vec<f64>;

    fn initial_state<R: Rng>(&self, rng: &mut R) -> Vec<f64> {
        (0..self.targets.len())
            .map(|_| rng.random_range(0.0..100.0))
            .collect()
    }

    fn energy(&self, state: &Vec<f64>) -> f64 {
        state
            .iter()
            .zip(&self.targets)
            .map(|(point, target)| (point - target) * (point - target))
            .sum()
    }

    fn entity_count(&self, state: &Vec<f64>) -> usize {
        state.len()
    }

    fn extent(&self) -> Extent {
        Extent::flat(100.0, 1.0)
    }
}

struct JitterKernel {
    scale: f64,
    touched: Option<usize>,
}

impl JitterKernel {
    fn new(scale: f64) -> Self {
        Self {
            scale,
            touched: None,
        }
    }
}

impl Kernel<Vec<f64>, PointFit> for JitterKernel {
    fn make_proposal<R: Rng>(
        &mut self,
        existing: &Vec<f64>,
        _context: &PointFit,
        rng: &mut R,
    ) -> Result<Option<Vec<f64>>, ProposalError> {
        if existing.is_empty() {
            return Ok(None);
        }
        let index = rng.random_range(0..existing.len());
        let mut moved = existing.clone();
        moved[index] += rng.random_range(-self.scale..self.scale);
        self.touched = Some(index);
        Ok(Some(moved))
    }

    fn changed_entity_ids(&self) -> Vec<EntityId> {
        self.touched
            .map(|index| vec![EntityId(index as u64)])
            .unwrap_or_default()
    }
}

// ===========================================================================
// Benchmarks
// ===========================================================================

fn bench_anneal_point_fit(c: &mut Criterion) {
    let mut group = c.benchmark_group("anneal_point_fit");
    group.sample_size(10);

    for &iterations in &[1_000usize, 10_000] {
        let problem = PointFit {
            targets: (0..20).map(|i| i as f64 * 5.0).collect(),
        };
        let config = AnnealConfig::default()
            .with_initial_temperature(25.0)
            .with_min_temperature(0.01)
            .with_seed(42);

        group.bench_with_input(
            BenchmarkId::from_parameter(iterations),
            &(problem, config),
            |b, (problem, config)| {
                b.iter(|| {
                    let mut portfolio = KernelPortfolio::new()
                        .push("fine", JitterKernel::new(0.5), 2.0)
                        .push("coarse", JitterKernel::new(5.0), 1.0);
                    let mut termination = MaxIterations::new(iterations);
                    let result = AnnealRunner::run_minimal(
                        black_box(problem),
                        &mut portfolio,
                        &mut termination,
                        black_box(config),
                    );
                    black_box(result)
                })
            },
        );
    }
    group.finish();
}

criterion_group!(benches, bench_anneal_point_fit);
criterion_main!(benches);
