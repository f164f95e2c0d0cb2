//! Active probes: derived requests that reveal what one response cannot.
//!
//! `spawn_all` plans the catalog for a completed base check; the
//! orchestrator enqueues the `Run` plans as probe checks and records the
//! `Skip` plans directly. When a probe completes, `apply` judges its outcome
//! against the base response and writes the fact onto the base's
//! `SupportFacts`.

mod conneg;
mod range;
mod validators;

use serde::Serialize;
use std::fmt;

use crate::check::{Check, CheckRequest, Note, Support, SupportFacts};
use crate::fetch::FetchOutcome;
use crate::response::FetchedResponse;

pub use range::range_sample;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ProbeKind {
    #[serde(rename = "conneg")]
    Conneg,
    #[serde(rename = "range")]
    Range,
    #[serde(rename = "etag")]
    ETag,
    #[serde(rename = "last_modified")]
    LastModified,
}

impl ProbeKind {
    pub const ALL: [ProbeKind; 4] = [
        ProbeKind::Conneg,
        ProbeKind::Range,
        ProbeKind::ETag,
        ProbeKind::LastModified,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ProbeKind::Conneg => "conneg",
            ProbeKind::Range => "range",
            ProbeKind::ETag => "etag",
            ProbeKind::LastModified => "last_modified",
        }
    }

    /// The fact this probe determines.
    pub fn fact(self, facts: &SupportFacts) -> Support {
        match self {
            ProbeKind::Conneg => facts.gzip,
            ProbeKind::Range => facts.partial,
            ProbeKind::ETag => facts.inm,
            ProbeKind::LastModified => facts.ims,
        }
    }

    pub(crate) fn set_fact(self, facts: &mut SupportFacts, support: Support) {
        let slot = match self {
            ProbeKind::Conneg => &mut facts.gzip,
            ProbeKind::Range => &mut facts.partial,
            ProbeKind::ETag => &mut facts.inm,
            ProbeKind::LastModified => &mut facts.ims,
        };
        *slot = support;
    }
}

impl fmt::Display for ProbeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// What to do about one probe for a given base.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbePlan {
    /// Enqueue a probe check with this request.
    Run { kind: ProbeKind, request: CheckRequest },
    /// Do not send anything; the fact is settled (or left Unknown) now.
    Skip {
        kind: ProbeKind,
        support: Support,
        reason: String,
    },
}

impl ProbePlan {
    pub fn kind(&self) -> ProbeKind {
        match self {
            ProbePlan::Run { kind, .. } | ProbePlan::Skip { kind, .. } => *kind,
        }
    }

    fn skip(kind: ProbeKind, support: Support, reason: impl Into<String>) -> Self {
        ProbePlan::Skip {
            kind,
            support,
            reason: reason.into(),
        }
    }
}

/// Judgement of one probe outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeVerdict {
    pub support: Support,
    /// Only set by the conneg probe.
    pub savings: Option<i64>,
    pub note: Note,
}

impl ProbeVerdict {
    fn new(support: Support, note: Note) -> Self {
        Self {
            support,
            savings: None,
            note,
        }
    }
}

/// Plan the probe catalog for a completed base check.
///
/// Empty unless the base is a GET resource check with a response.
pub fn spawn_all(base: &Check) -> Vec<ProbePlan> {
    if base.is_probe() || !base.request().method.eq_ignore_ascii_case("GET") {
        return Vec::new();
    }
    let Some(response) = base.response() else {
        return Vec::new();
    };
    ProbeKind::ALL
        .iter()
        .map(|&kind| plan(kind, base, response))
        .collect()
}

fn plan(kind: ProbeKind, base: &Check, response: &FetchedResponse) -> ProbePlan {
    match kind {
        ProbeKind::Conneg => conneg::plan(base, response),
        ProbeKind::Range => range::plan(base, response),
        ProbeKind::ETag => validators::plan_etag(base, response),
        ProbeKind::LastModified => validators::plan_last_modified(base, response),
    }
}

/// The caller's headers without `Accept-Encoding`, so the origin sends the
/// identity representation.
fn identity_headers(base: &Check) -> Vec<(String, String)> {
    base.original_headers()
        .iter()
        .filter(|(k, _)| !k.eq_ignore_ascii_case("accept-encoding"))
        .cloned()
        .collect()
}

/// Judge a probe outcome against the base response.
pub fn evaluate(kind: ProbeKind, base: &FetchedResponse, outcome: &FetchOutcome) -> ProbeVerdict {
    let probe = match outcome {
        Ok(r) => r,
        Err(e) => {
            return ProbeVerdict::new(
                Support::Unknown,
                Note::warn(kind.name(), format!("probe request failed: {}", e)),
            )
        }
    };
    match kind {
        ProbeKind::Conneg => conneg::judge(base, probe),
        ProbeKind::Range => range::judge(base, probe),
        ProbeKind::ETag => validators::judge(kind, "If-None-Match", base, probe),
        ProbeKind::LastModified => validators::judge(kind, "If-Modified-Since", base, probe),
    }
}

/// Evaluate and write the fact (and gzip savings) into `facts`. Returns the
/// note describing the result.
pub fn apply(
    kind: ProbeKind,
    base: &FetchedResponse,
    outcome: &FetchOutcome,
    facts: &mut SupportFacts,
) -> Note {
    let verdict = evaluate(kind, base, outcome);
    kind.set_fact(facts, verdict.support);
    if let Some(savings) = verdict.savings {
        facts.gzip_savings = savings;
    }
    verdict.note
}

#[cfg(test)]
pub(crate) mod testing {
    use crate::response::FetchedResponse;

    /// Response with the given status, header lines and body.
    pub fn response(status: u32, headers: &[&str], body: &[u8]) -> FetchedResponse {
        let mut lines = vec![format!("HTTP/1.1 {} X", status)];
        lines.extend(headers.iter().map(|h| h.to_string()));
        FetchedResponse::from_parts(&lines, body.to_vec(), body.len() as u64)
    }
}
