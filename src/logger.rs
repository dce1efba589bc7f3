//! Logging collaborator used by the notes pipeline.
//!
//! Hosts that embed the pipeline (a release tool, a CI wrapper) usually own the
//! log sink, so the pipeline reports through this trait instead of assuming a
//! global subscriber. [`TracingLogger`] forwards everything to `tracing`.

use std::fmt::Display;

use tracing::{error, info, warn};

/// Sink for pipeline progress, warnings and errors.
pub trait NotesLogger: Send + Sync {
    /// Informational progress message.
    fn log(&self, message: &str);

    /// Non-fatal problem the operator should know about.
    fn warn(&self, message: &str);

    /// Failure with the error that caused it.
    fn error(&self, message: &str, detail: &dyn Display);
}

/// Default logger that emits `tracing` events.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingLogger;

impl NotesLogger for TracingLogger {
    fn log(&self, message: &str) {
        info!("{}", message);
    }

    fn warn(&self, message: &str) {
        warn!("{}", message);
    }

    fn error(&self, message: &str, detail: &dyn Display) {
        error!(error = %detail, "{}", message);
    }
}
