use std::error::Error;

use tracing::error;

/// Sink for failures that happen in the background refresh, away from any caller.
pub trait ErrorReporter: Send + Sync {
    fn report(&self, source: &str, error: &(dyn Error + 'static));
}

/// Reports failures as `error` level tracing events.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingReporter;

impl ErrorReporter for TracingReporter {
    fn report(&self, source: &str, err: &(dyn Error + 'static)) {
        error!(source, error = %err, "background failure reported");
    }
}
