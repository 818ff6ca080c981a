//! Concurrent independent chains with best-of reduction.

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use super::config::AnnealConfig;
use super::runner::{AnnealRunner, SearchError, SearchResult};
use super::types::SearchProblem;
use crate::kernel::{Kernel, KernelPortfolio};
use crate::termination::TerminationCondition;

/// Configuration for a set of independent chains.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ChainSetConfig {
    /// Number of independent chains.
    pub chains: usize,

    /// Per-chain schedule. `seed` is the base: chain `i` runs with
    /// `seed + i`, so the whole set is reproducible from one seed.
    pub schedule: AnnealConfig,
}

impl ChainSetConfig {
    pub fn new(chains: usize, schedule: AnnealConfig) -> Self {
        Self { chains, schedule }
    }
}

/// Result of a chain-set run.
#[derive(Debug, Clone)]
pub struct ChainSetResult<T> {
    /// Index of the chain whose released best won the reduction.
    pub winner: usize,

    /// Results of every chain, in chain order.
    pub per_chain: Vec<SearchResult<T>>,
}

impl<T> ChainSetResult<T> {
    /// The winning chain's result.
    pub fn best(&self) -> &SearchResult<T> {
        &self.per_chain[self.winner]
    }

    /// Consumes the set, keeping only the winning chain's result.
    pub fn into_best(self) -> SearchResult<T> {
        let winner = self.winner;
        self.per_chain
            .into_iter()
            .nth(winner)
            .expect("winner index in range")
    }
}

/// Runs independent chains and reduces to the best released state.
///
/// Each chain owns its portfolio, termination condition, and RNG stream;
/// only the problem is shared, read-only. One chain is strictly sequential
/// internally, so parallelism lives at chain granularity: with the
/// `parallel` feature the chains run on rayon, otherwise sequentially.
pub struct MultiChainRunner;

impl MultiChainRunner {
    /// Runs the chain set.
    ///
    /// `make_portfolio` and `make_termination` are called once per chain
    /// with the chain index, so chains can differ in kernels or budgets.
    /// Energy ties in the reduction go to the lowest chain index.
    pub fn run<P, K, PF, TF>(
        problem: &P,
        make_portfolio: PF,
        make_termination: TF,
        config: &ChainSetConfig,
    ) -> Result<ChainSetResult<P::State>, SearchError>
    where
        P: SearchProblem,
        K: Kernel<P::State, P>,
        PF: Fn(usize) -> KernelPortfolio<K> + Sync,
        TF: Fn(usize) -> Box<dyn TerminationCondition> + Sync,
    {
        if config.chains == 0 {
            return Err(SearchError::InvalidConfig(
                "at least one chain required".into(),
            ));
        }
        config
            .schedule
            .validate()
            .map_err(SearchError::InvalidConfig)?;

        let base_seed = config.schedule.seed.unwrap_or_else(rand::random);

        let run_one = |chain: usize| -> Result<SearchResult<P::State>, SearchError> {
            let schedule = config
                .schedule
                .clone()
                .with_seed(base_seed.wrapping_add(chain as u64));
            let mut portfolio = make_portfolio(chain);
            let mut termination = make_termination(chain);
            AnnealRunner::run_minimal(problem, &mut portfolio, termination.as_mut(), &schedule)
        };

        #[cfg(feature = "parallel")]
        let collected: Result<Vec<_>, SearchError> =
            (0..config.chains).into_par_iter().map(run_one).collect();
        #[cfg(not(feature = "parallel"))]
        let collected: Result<Vec<_>, SearchError> =
            (0..config.chains).map(run_one).collect();

        let per_chain = collected?;

        let mut winner = 0usize;
        for (chain, result) in per_chain.iter().enumerate().skip(1) {
            if result.best_energy < per_chain[winner].best_energy {
                winner = chain;
            }
        }

        Ok(ChainSetResult { winner, per_chain })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernel::{EntityId, ProposalError};
    use crate::termination::MaxIterations;
    use rand::Rng;

    struct WalkProblem;

    impl SearchProblem for WalkProblem {
        type State = f64;

        fn initial_state<R: Rng>(&self, rng: &mut R) -> f64 {
            rng.random_range(-10.0..10.0)
        }

        fn energy(&self, state: &f64) -> f64 {
            state * state
        }

        fn entity_count(&self, _state: &f64) -> usize {
            1
        }
    }

    struct JitterKernel;

    impl Kernel<f64, WalkProblem> for JitterKernel {
        fn make_proposal<R: Rng>(
            &mut self,
            existing: &f64,
            _context: &WalkProblem,
            rng: &mut R,
        ) -> Result<Option<f64>, ProposalError> {
            Ok(Some(existing + rng.random_range(-1.0..1.0)))
        }

        fn changed_entity_ids(&self) -> Vec<EntityId> {
            vec![EntityId(0)]
        }
    }

    fn chain_set(chains: usize, iterations: usize, seed: u64) -> ChainSetResult<f64> {
        let config = ChainSetConfig::new(
            chains,
            AnnealConfig::default()
                .with_initial_temperature(5.0)
                .with_seed(seed),
        );
        MultiChainRunner::run(
            &WalkProblem,
            |_chain| KernelPortfolio::new().push("jitter", JitterKernel, 1.0),
            |_chain| Box::new(MaxIterations::new(iterations)) as Box<dyn TerminationCondition>,
            &config,
        )
        .unwrap()
    }

    #[test]
    fn test_reduction_picks_lowest_energy_chain() {
        let result = chain_set(4, 300, 42);

        assert_eq!(result.per_chain.len(), 4);
        let winning = result.best().best_energy;
        for chain in &result.per_chain {
            assert!(winning <= chain.best_energy);
        }
        assert_eq!(result.per_chain[result.winner].best_energy, winning);
    }

    #[test]
    fn test_chain_set_is_reproducible() {
        let first = chain_set(3, 200, 9);
        let second = chain_set(3, 200, 9);

        assert_eq!(first.winner, second.winner);
        for (a, b) in first.per_chain.iter().zip(&second.per_chain) {
            assert_eq!(a.best, b.best);
            assert_eq!(a.best_energy, b.best_energy);
        }
    }

    #[test]
    fn test_chains_use_distinct_seeds() {
        let result = chain_set(3, 200, 9);
        let energies: Vec<f64> = result
            .per_chain
            .iter()
            .map(|chain| chain.best_energy)
            .collect();
        assert!(
            energies.windows(2).any(|pair| pair[0] != pair[1]),
            "independent chains should not all coincide: {energies:?}"
        );
    }

    #[test]
    fn test_zero_chains_rejected() {
        let config = ChainSetConfig::new(0, AnnealConfig::default());
        let result = MultiChainRunner::run(
            &WalkProblem,
            |_chain| KernelPortfolio::new().push("jitter", JitterKernel, 1.0),
            |_chain| Box::new(MaxIterations::new(10)) as Box<dyn TerminationCondition>,
            &config,
        );
        assert!(matches!(result, Err(SearchError::InvalidConfig(_))));
    }

    #[test]
    fn test_into_best_returns_winner() {
        let result = chain_set(2, 100, 5);
        let winner_energy = result.best().best_energy;
        let best = result.into_best();
        assert_eq!(best.best_energy, winner_energy);
    }
}
