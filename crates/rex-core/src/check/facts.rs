//! Protocol-support facts filled in by active probes.

use serde::Serialize;
use std::fmt;

/// Tri-state support flag. Stays `Unknown` when a probe fails or never ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Support {
    #[default]
    Unknown,
    Yes,
    No,
}

impl fmt::Display for Support {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Support::Unknown => "unknown",
            Support::Yes => "yes",
            Support::No => "no",
        };
        f.write_str(s)
    }
}

/// Facts about the resource that a single response cannot reveal.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SupportFacts {
    /// Byte ranges honored (206 with the requested bytes).
    pub partial: Support,
    /// Conditional GET with `If-None-Match` answered with 304.
    pub inm: Support,
    /// Conditional GET with `If-Modified-Since` answered with 304.
    pub ims: Support,
    /// gzip content-coding negotiated.
    pub gzip: Support,
    /// Percent saved on the wire by gzip (negative if gzip was larger).
    pub gzip_savings: i64,
}
