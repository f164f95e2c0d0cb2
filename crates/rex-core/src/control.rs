//! Cooperative cancellation for a run.
//!
//! The orchestrator checks the token before starting each queued check; a set
//! token fails every not-yet-started check with `FetchError::Aborted`.
//! Transfers already in flight run to completion.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Shared abort flag. Clones observe the same flag.
#[derive(Debug, Clone, Default)]
pub struct AbortToken(Arc<AtomicBool>);

impl AbortToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request abort (e.g. from a Ctrl-C handler on another thread).
    pub fn request_abort(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_aborted(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}
