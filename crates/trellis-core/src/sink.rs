//! Report sinks for one render pass
//!
//! Errors and warnings are accumulated into a caller-supplied sink for the
//! lifetime of a pass and surfaced afterward. Concurrent subtree renders
//! append to the same sink, so appends must be lock-protected at a single
//! accumulation point rather than merged from per-task copies at join.

use crate::error::RenderError;
use crate::warning::AdapterWarning;
use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;

/// Destination for errors and warnings produced during a render pass.
///
/// # Threading
///
/// Appends happen from concurrent subtree renders; implementations must be
/// `Send + Sync` and must not lose concurrent appends.
pub trait ReportSink: Send + Sync {
    /// Records a render error.
    fn error(&self, error: RenderError);

    /// Records an adapter warning.
    fn warning(&self, warning: AdapterWarning);
}

/// Callback invoked as a warning is reported, before the pass completes.
pub type WarningCallback = Arc<dyn Fn(&AdapterWarning) + Send + Sync>;

/// Callback invoked as an error is reported, before the pass completes.
pub type ErrorCallback = Arc<dyn Fn(&RenderError) + Send + Sync>;

/// The standard sink: collects reports, optionally streaming each one to a
/// callback as it occurs.
#[derive(Default)]
pub struct CollectingSink {
    errors: Mutex<Vec<RenderError>>,
    warnings: Mutex<Vec<AdapterWarning>>,
    on_error: Option<ErrorCallback>,
    on_warning: Option<WarningCallback>,
}

impl CollectingSink {
    /// Creates an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Streams each error to `callback` as it is reported.
    #[must_use]
    pub fn with_error_callback(mut self, callback: ErrorCallback) -> Self {
        self.on_error = Some(callback);
        self
    }

    /// Streams each warning to `callback` as it is reported.
    #[must_use]
    pub fn with_warning_callback(mut self, callback: WarningCallback) -> Self {
        self.on_warning = Some(callback);
        self
    }

    /// Drains everything collected so far.
    pub fn take(&self) -> (Vec<RenderError>, Vec<AdapterWarning>) {
        (
            std::mem::take(&mut *self.errors.lock()),
            std::mem::take(&mut *self.warnings.lock()),
        )
    }

    /// Number of errors collected so far.
    pub fn error_count(&self) -> usize {
        self.errors.lock().len()
    }

    /// Number of warnings collected so far.
    pub fn warning_count(&self) -> usize {
        self.warnings.lock().len()
    }
}

impl ReportSink for CollectingSink {
    fn error(&self, error: RenderError) {
        if let Some(callback) = &self.on_error {
            callback(&error);
        }
        self.errors.lock().push(error);
    }

    fn warning(&self, warning: AdapterWarning) {
        if let Some(callback) = &self.on_warning {
            callback(&warning);
        }
        self.warnings.lock().push(warning);
    }
}

impl fmt::Debug for CollectingSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CollectingSink")
            .field("errors", &self.error_count())
            .field("warnings", &self.warning_count())
            .field("streaming", &(self.on_error.is_some() || self.on_warning.is_some()))
            .finish()
    }
}
