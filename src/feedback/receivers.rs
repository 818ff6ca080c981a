//! Stock feedback receivers.

use log::{debug, info};

use super::report::IterationReport;
use super::types::{BeginParams, EndParams, FeedbackReceiver, MisconfiguredError};

/// Receiver that ignores every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullFeedback;

impl<U> FeedbackReceiver<U> for NullFeedback {}

/// Broadcasts every event to a list of receivers, in order.
pub struct FanOutFeedback<U> {
    receivers: Vec<Box<dyn FeedbackReceiver<U>>>,
}

impl<U> FanOutFeedback<U> {
    pub fn new(receivers: Vec<Box<dyn FeedbackReceiver<U>>>) -> Self {
        Self { receivers }
    }

    /// Appends a receiver. Builder-style.
    pub fn with(mut self, receiver: Box<dyn FeedbackReceiver<U>>) -> Self {
        self.receivers.push(receiver);
        self
    }
}

impl<U> Default for FanOutFeedback<U> {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl<U> FeedbackReceiver<U> for FanOutFeedback<U> {
    fn validate_configuration(&self, run: &BeginParams) -> Result<(), MisconfiguredError> {
        for receiver in &self.receivers {
            receiver.validate_configuration(run)?;
        }
        Ok(())
    }

    fn report_begin(&mut self, run: &BeginParams) {
        for receiver in &mut self.receivers {
            receiver.report_begin(run);
        }
    }

    fn report_iteration(&mut self, report: &IterationReport<U>) {
        for receiver in &mut self.receivers {
            receiver.report_iteration(report);
        }
    }

    fn report_new_best(&mut self, report: &IterationReport<U>) {
        for receiver in &mut self.receivers {
            receiver.report_new_best(report);
        }
    }

    fn report_end(&mut self, end: &EndParams) {
        for receiver in &mut self.receivers {
            receiver.report_end(end);
        }
    }
}

/// Bridges progress onto the `log` facade at a fixed iteration interval.
#[derive(Debug, Clone, Copy)]
pub struct LogFeedback {
    interval: usize,
}

impl LogFeedback {
    /// Logs one line every `interval` iterations, plus begin/end/new-best.
    pub fn every(interval: usize) -> Self {
        Self { interval }
    }
}

impl<U> FeedbackReceiver<U> for LogFeedback {
    fn validate_configuration(&self, _run: &BeginParams) -> Result<(), MisconfiguredError> {
        if self.interval == 0 {
            return Err(MisconfiguredError("log interval must be positive".into()));
        }
        Ok(())
    }

    fn report_begin(&mut self, run: &BeginParams) {
        debug!(
            "run started: {} kernels, seed {}, E0 {:.6}, T0 {:.6}",
            run.kernel_ids.len(),
            run.seed,
            run.initial_energy,
            run.initial_temperature
        );
    }

    fn report_iteration(&mut self, report: &IterationReport<U>) {
        if (report.iteration + 1).is_multiple_of(self.interval) {
            debug!(
                "iteration {}: E {:.6}, best {:.6}, T {:?}",
                report.iteration,
                report.current_energy,
                report.best_energy,
                report.outcome.temperature
            );
        }
    }

    fn report_new_best(&mut self, report: &IterationReport<U>) {
        info!(
            "new best at iteration {}: E {:.6}",
            report.iteration, report.best_energy
        );
    }

    fn report_end(&mut self, end: &EndParams) {
        info!(
            "run stopped after {} iterations ({:?}): best E {:.6}",
            end.iterations, end.stop, end.best_energy
        );
    }
}

/// Records the best-energy trajectory at a fixed sampling interval.
///
/// The trace starts at the initial energy and always ends with the final
/// best, so it is non-increasing front to back.
#[derive(Debug, Clone)]
pub struct HistoryFeedback {
    interval: usize,
    history: Vec<f64>,
}

impl HistoryFeedback {
    pub fn every(interval: usize) -> Self {
        Self {
            interval,
            history: Vec::new(),
        }
    }

    pub fn history(&self) -> &[f64] {
        &self.history
    }

    pub fn into_history(self) -> Vec<f64> {
        self.history
    }
}

impl<U> FeedbackReceiver<U> for HistoryFeedback {
    fn validate_configuration(&self, _run: &BeginParams) -> Result<(), MisconfiguredError> {
        if self.interval == 0 {
            return Err(MisconfiguredError(
                "history sampling interval must be positive".into(),
            ));
        }
        Ok(())
    }

    fn report_begin(&mut self, run: &BeginParams) {
        self.history.push(run.initial_energy);
    }

    fn report_iteration(&mut self, report: &IterationReport<U>) {
        if (report.iteration + 1).is_multiple_of(self.interval) {
            self.history.push(report.best_energy);
        }
    }

    fn report_end(&mut self, end: &EndParams) {
        if self
            .history
            .last()
            .is_none_or(|&last| (last - end.best_energy).abs() > 1e-15)
        {
            self.history.push(end.best_energy);
        }
    }
}
