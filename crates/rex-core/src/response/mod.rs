//! Completed HTTP response as seen by a check.
//!
//! Built from the raw header lines curl hands us plus the (decoded) body.
//! Accessors cover the validators and codings the probes look at.

mod parse;

use serde::Serialize;

pub use parse::{parse_content_range, parse_header_lines, parse_status_line};

/// Result record for one request/response cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FetchedResponse {
    pub status: u32,
    pub reason: String,
    /// Header fields in the order received.
    pub headers: Vec<(String, String)>,
    /// Body after content decoding, capped at the configured maximum.
    #[serde(skip)]
    pub body: Vec<u8>,
    /// Decoded body length, including bytes beyond the cap.
    pub body_len: u64,
    /// Body bytes received on the wire, before content decoding.
    pub wire_len: u64,
    /// True if `body` holds only a prefix of the payload.
    pub truncated: bool,
    pub elapsed_ms: u64,
}

impl FetchedResponse {
    /// Assemble a response from collected header lines. A missing status line
    /// leaves `status` at 0.
    pub fn from_parts(header_lines: &[String], body: Vec<u8>, body_len: u64) -> Self {
        let (status_line, headers) = parse_header_lines(header_lines);
        let (status, reason) = status_line.unwrap_or((0, String::new()));
        Self {
            status,
            reason,
            headers,
            body,
            body_len,
            wire_len: body_len,
            truncated: false,
            elapsed_ms: 0,
        }
    }

    /// First value of header `name` (case-insensitive).
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Raw `ETag` value, quotes and weak prefix preserved for reuse in `If-None-Match`.
    pub fn etag(&self) -> Option<&str> {
        self.header("etag").filter(|v| !v.is_empty())
    }

    pub fn last_modified(&self) -> Option<&str> {
        self.header("last-modified").filter(|v| !v.is_empty())
    }

    /// True if `Content-Encoding` lists `coding` (e.g. "gzip").
    pub fn has_content_coding(&self, coding: &str) -> bool {
        self.headers
            .iter()
            .filter(|(k, _)| k.eq_ignore_ascii_case("content-encoding"))
            .flat_map(|(_, v)| v.split(','))
            .any(|c| c.trim().eq_ignore_ascii_case(coding))
    }

    /// Media type without parameters, lowercased.
    pub fn media_type(&self) -> Option<String> {
        self.header("content-type").map(|v| {
            v.split(';')
                .next()
                .unwrap_or("")
                .trim()
                .to_ascii_lowercase()
        })
    }
}
