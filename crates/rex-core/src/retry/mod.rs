//! Retry and backoff policy for transport failures.
//!
//! Only failures that never produced a response are retried; an HTTP error
//! status is a result worth reporting, not a reason to try again.

mod classify;
mod policy;

pub use classify::{classify, classify_curl_error};
pub use policy::{ErrorKind, RetryDecision, RetryPolicy};
