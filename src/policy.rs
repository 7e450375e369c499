//! Failure policy for refresh cycles
//!
//! Only an unknown account is terminal. Everything else is reported and
//! dropped; the last good view stays on screen and the next tick tries again.

use crate::error::FetchError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Stop refreshing and tell the presentation layer the resource is gone
    Terminal,
    /// Report, keep the previous view, retry on the next tick
    Retry,
}

pub fn classify(error: &FetchError) -> Disposition {
    if error.is_not_found() {
        Disposition::Terminal
    } else {
        Disposition::Retry
    }
}

/// Receives every swallowed failure. Handed to the scheduler explicitly
/// rather than attached to views.
pub trait ErrorReporter: Send + Sync {
    fn report(&self, context: &str, error: &FetchError);
}

/// Default reporter: a `warn` line per failed cycle
#[derive(Debug, Default, Clone, Copy)]
pub struct LogReporter;

impl ErrorReporter for LogReporter {
    fn report(&self, context: &str, error: &FetchError) {
        tracing::warn!(context, "refresh failed: {}", error);
    }
}
