//! Progress events for operation waits
//!
//! The CLI uses these to drive a spinner; library callers usually pass no
//! callback at all.

use std::time::Duration;

/// Progress events emitted while waiting on an operation
#[derive(Debug, Clone, PartialEq)]
pub enum ProgressEvent {
    /// Wait has started
    Started { operation: String },
    /// One refresh came back
    Polling {
        operation: String,
        done: bool,
        elapsed: Duration,
    },
    /// Operation finished without an error payload
    Completed { operation: String },
    /// Wait failed, either remotely or while polling
    Failed { operation: String, error: String },
}

/// Callback type for progress updates
pub type ProgressCallback = Box<dyn Fn(ProgressEvent) + Send + Sync>;

/// Helper to emit progress events
pub(crate) fn emit(callback: &Option<ProgressCallback>, event: ProgressEvent) {
    if let Some(cb) = callback {
        cb(event);
    }
}
