pub mod config;
pub mod logging;

pub mod check;
pub mod control;
pub mod extract;
pub mod fetch;
pub mod orchestrator;
pub mod probe;
pub mod report;
pub mod response;
pub mod retry;

pub use check::{Check, CheckId, CheckRequest, CheckState, Support, SupportFacts};
pub use control::AbortToken;
pub use extract::{HtmlLinkExtractor, LinkExtractor, ObservedLink};
pub use fetch::{CurlFetcher, FetchError, Fetcher};
pub use orchestrator::Orchestrator;
pub use report::CheckReport;
