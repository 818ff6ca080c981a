//! Stock termination conditions.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use super::types::{RunStatus, StopReason, TerminationCondition};

/// Stops after a fixed number of proposal attempts.
///
/// No-proposal iterations count: with a limit of `k`, the loop performs
/// exactly `k` attempts regardless of their outcomes.
#[derive(Debug, Clone, Copy)]
pub struct MaxIterations {
    limit: usize,
}

impl MaxIterations {
    pub fn new(limit: usize) -> Self {
        Self { limit }
    }
}

impl TerminationCondition for MaxIterations {
    fn should_stop(&mut self, status: &RunStatus) -> Option<StopReason> {
        (status.iteration >= self.limit).then_some(StopReason::IterationBudget)
    }
}

/// Stops once the elapsed wall-clock time reaches the budget.
#[derive(Debug, Clone, Copy)]
pub struct TimeBudget {
    budget: Duration,
}

impl TimeBudget {
    pub fn new(budget: Duration) -> Self {
        Self { budget }
    }
}

impl TerminationCondition for TimeBudget {
    fn should_stop(&mut self, status: &RunStatus) -> Option<StopReason> {
        (status.elapsed >= self.budget).then_some(StopReason::TimeBudget)
    }
}

/// Stops when the best energy has not improved by more than `tolerance`
/// for `window` consecutive polls.
#[derive(Debug, Clone)]
pub struct Plateau {
    window: usize,
    tolerance: f64,
    reference: f64,
    stagnant: usize,
}

impl Plateau {
    pub fn new(window: usize, tolerance: f64) -> Self {
        Self {
            window,
            tolerance,
            reference: f64::INFINITY,
            stagnant: 0,
        }
    }
}

impl TerminationCondition for Plateau {
    fn should_stop(&mut self, status: &RunStatus) -> Option<StopReason> {
        if status.best_energy < self.reference - self.tolerance {
            self.reference = status.best_energy;
            self.stagnant = 0;
            return None;
        }
        self.stagnant += 1;
        (self.stagnant >= self.window).then_some(StopReason::Plateau)
    }
}

/// Stops when an externally shared flag is raised.
#[derive(Debug, Clone)]
pub struct CancelFlag {
    flag: Arc<AtomicBool>,
}

impl CancelFlag {
    pub fn new(flag: Arc<AtomicBool>) -> Self {
        Self { flag }
    }
}

impl TerminationCondition for CancelFlag {
    fn should_stop(&mut self, _status: &RunStatus) -> Option<StopReason> {
        self.flag
            .load(Ordering::Relaxed)
            .then_some(StopReason::Cancelled)
    }
}

/// Stops as soon as any inner condition fires; the first reason wins.
pub struct AnyOf {
    conditions: Vec<Box<dyn TerminationCondition>>,
}

impl AnyOf {
    pub fn new(conditions: Vec<Box<dyn TerminationCondition>>) -> Self {
        Self { conditions }
    }
}

impl TerminationCondition for AnyOf {
    fn should_stop(&mut self, status: &RunStatus) -> Option<StopReason> {
        self.conditions
            .iter_mut()
            .find_map(|condition| condition.should_stop(status))
    }
}
