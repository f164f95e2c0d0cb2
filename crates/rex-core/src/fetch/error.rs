//! Transport failure for one check.

use thiserror::Error;

/// Why a check did not get a response. HTTP error statuses are responses,
/// not failures, and never appear here.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Curl reported an error (timeout, connection, malformed response, ...).
    #[error("{0}")]
    Curl(#[from] curl::Error),
    /// The multi handle itself failed.
    #[error("curl multi: {0}")]
    Multi(#[from] curl::MultiError),
    /// The request could not be built (bad URI, bad header).
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    /// The run was aborted before this check was started.
    #[error("check aborted")]
    Aborted,
}
