//! Link discovery in response bodies.

mod html;

use serde::Serialize;

use crate::response::FetchedResponse;

pub use html::{HtmlLinkExtractor, SelectorError};

/// One link occurrence in a body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ObservedLink {
    /// URI the link is relative to.
    pub base: String,
    /// Link value as written in the body.
    pub link: String,
    /// Kind of reference, e.g. the element name (`img`, `script`, `a`).
    pub tag: String,
    pub title: String,
}

/// Finds links in a completed response, in document order.
pub trait LinkExtractor {
    fn extract(&self, request_uri: &str, response: &FetchedResponse) -> Vec<ObservedLink>;
}
