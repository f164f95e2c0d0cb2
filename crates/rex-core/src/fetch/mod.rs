//! Transport for checks.
//!
//! The orchestrator only sees the `Fetcher` trait: submit a request for a
//! check, then poll for completions. `CurlFetcher` is the real implementation,
//! interleaving every in-flight transfer on one curl multi handle.

mod error;
mod multi;
#[cfg(test)]
pub(crate) mod scripted;

use std::time::Duration;

use crate::check::{CheckId, CheckRequest};
use crate::config::RexConfig;
use crate::response::FetchedResponse;

pub use error::FetchError;
pub use multi::CurlFetcher;

/// Result of one request/response cycle.
pub type FetchOutcome = Result<FetchedResponse, FetchError>;

/// A finished transfer, reported exactly once per submitted check.
#[derive(Debug)]
pub struct FetchEvent {
    pub id: CheckId,
    pub outcome: FetchOutcome,
}

/// Per-transfer settings shared by every request of a run.
#[derive(Debug, Clone)]
pub struct TransferOptions {
    pub user_agent: String,
    pub connect_timeout: Duration,
    pub timeout: Duration,
    /// Body bytes kept per response; the rest is counted and dropped.
    pub max_body_bytes: usize,
}

impl Default for TransferOptions {
    fn default() -> Self {
        Self::from(&RexConfig::default())
    }
}

impl From<&RexConfig> for TransferOptions {
    fn from(cfg: &RexConfig) -> Self {
        Self {
            user_agent: cfg.user_agent.clone(),
            connect_timeout: Duration::from_secs(cfg.connect_timeout_secs),
            timeout: Duration::from_secs(cfg.timeout_secs),
            max_body_bytes: cfg.max_body_bytes,
        }
    }
}

/// Performs requests on behalf of checks.
///
/// `submit` must not block on the network. Every accepted submission yields
/// exactly one `FetchEvent` from a later `poll`.
pub trait Fetcher {
    /// Queue a request for `id`. An error means the request was rejected
    /// outright and no event will follow.
    fn submit(&mut self, id: CheckId, request: &CheckRequest) -> Result<(), FetchError>;

    /// Drive transfers for up to `timeout` and return the ones that finished.
    fn poll(&mut self, timeout: Duration) -> Result<Vec<FetchEvent>, FetchError>;

    /// Submitted requests without a reported event yet.
    fn in_flight(&self) -> usize;
}
