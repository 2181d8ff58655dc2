//! Diagnostic sink for setup and routing failures.
//!
//! The host reports plugin errors without their context, so failures are
//! written here before being returned. The sink is injected so callers can
//! capture output without a global subscriber.

use std::error::Error;
use std::sync::{Arc, Mutex, PoisonError};

/// Receives failure reports.
pub trait Diagnostics: Send + Sync {
    /// Report an error with a short context message.
    fn error(&self, message: &str, error: &(dyn Error + 'static));
}

/// Forwards reports to `tracing` at error level.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingDiagnostics;

impl Diagnostics for TracingDiagnostics {
    fn error(&self, message: &str, error: &(dyn Error + 'static)) {
        tracing::error!(error = %error, source = ?error.source(), "{}", message);
    }
}

/// Keeps every report in memory.
#[derive(Debug, Clone, Default)]
pub struct CapturedDiagnostics {
    entries: Arc<Mutex<Vec<String>>>,
}

impl CapturedDiagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reports so far, formatted as `message: error`.
    pub fn entries(&self) -> Vec<String> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn is_empty(&self) -> bool {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_empty()
    }
}

impl Diagnostics for CapturedDiagnostics {
    fn error(&self, message: &str, error: &(dyn Error + 'static)) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(format!("{message}: {error}"));
    }
}
