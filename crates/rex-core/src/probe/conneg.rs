//! Content-encoding negotiation: refetch without `Accept-Encoding` and
//! compare the identity size with what gzip put on the wire.

use crate::check::{Check, CheckRequest, Note, Support};
use crate::response::FetchedResponse;

use super::{identity_headers, ProbeKind, ProbePlan, ProbeVerdict};

const GZIP: &str = "gzip";

pub(super) fn plan(base: &Check, response: &FetchedResponse) -> ProbePlan {
    if !response.has_content_coding(GZIP) {
        return ProbePlan::skip(
            ProbeKind::Conneg,
            Support::No,
            "response was not gzip-encoded when gzip was offered",
        );
    }
    ProbePlan::Run {
        kind: ProbeKind::Conneg,
        request: CheckRequest::get(base.request().uri.clone())
            .with_headers(identity_headers(base)),
    }
}

/// Percent of `identity_len` saved by sending `wire_len` bytes instead.
pub(super) fn savings(identity_len: u64, wire_len: u64) -> i64 {
    if identity_len == 0 {
        return 0;
    }
    let identity = identity_len as i128;
    (100 * (identity - wire_len as i128) / identity) as i64
}

pub(super) fn judge(base: &FetchedResponse, probe: &FetchedResponse) -> ProbeVerdict {
    if !probe.is_success() || probe.status != base.status {
        return ProbeVerdict::new(
            Support::Unknown,
            Note::warn(
                "conneg",
                format!(
                    "identity request got {} where the gzip request got {}",
                    probe.status, base.status
                ),
            ),
        );
    }
    if probe.has_content_coding(GZIP) {
        return ProbeVerdict::new(
            Support::Unknown,
            Note::warn("conneg", "gzip sent even though it was not accepted"),
        );
    }
    let pct = savings(probe.body_len, base.wire_len);
    ProbeVerdict {
        support: Support::Yes,
        savings: Some(pct),
        note: Note::info(
            "conneg",
            format!(
                "gzip saves {}% ({} bytes identity, {} bytes gzip)",
                pct, probe.body_len, base.wire_len
            ),
        ),
    }
}
