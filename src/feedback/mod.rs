//! Observer protocol for run progress.
//!
//! The engine publishes immutable [`IterationReport`] snapshots through the
//! [`FeedbackReceiver`] contract; downstream writers, loggers, or display
//! layers pick their own reporting type via a transform supplied to the
//! runner, so nothing here depends on the engine's internal state type.

mod receivers;
mod report;
mod types;

pub use receivers::{FanOutFeedback, HistoryFeedback, LogFeedback, NullFeedback};
pub use report::IterationReport;
pub use types::{BeginParams, EndParams, FeedbackReceiver, MisconfiguredError};
