//! Partial content: ask for a few bytes from the middle of the body and
//! compare them with what the full response carried.

use crate::check::{Check, CheckRequest, Note, Support};
use crate::response::{parse_content_range, FetchedResponse};

use super::{identity_headers, ProbeKind, ProbePlan, ProbeVerdict};

/// Bytes requested by the probe (at most).
const SAMPLE_LEN: usize = 10;

/// Inclusive byte range sampled from a body of `len` bytes. `None` for an
/// empty body.
pub fn range_sample(len: usize) -> Option<(usize, usize)> {
    if len == 0 {
        return None;
    }
    let start = len / 2;
    let end = (start + SAMPLE_LEN - 1).min(len - 1);
    Some((start, end))
}

pub(super) fn plan(base: &Check, response: &FetchedResponse) -> ProbePlan {
    if response.status != 200 {
        return ProbePlan::skip(
            ProbeKind::Range,
            Support::Unknown,
            format!("status {} is not 200", response.status),
        );
    }
    if response.truncated {
        return ProbePlan::skip(ProbeKind::Range, Support::Unknown, "body was truncated");
    }
    let Some((start, end)) = range_sample(response.body.len()) else {
        return ProbePlan::skip(ProbeKind::Range, Support::Unknown, "body is empty");
    };
    // Offsets index the decoded body, so the 206 must be of the identity
    // representation.
    let request = CheckRequest::get(base.request().uri.clone())
        .with_headers(identity_headers(base))
        .with_header("Range", format!("bytes={}-{}", start, end));
    ProbePlan::Run {
        kind: ProbeKind::Range,
        request,
    }
}

pub(super) fn judge(base: &FetchedResponse, probe: &FetchedResponse) -> ProbeVerdict {
    let Some((start, end)) = range_sample(base.body.len()) else {
        return ProbeVerdict::new(Support::Unknown, Note::warn("range", "base body is empty"));
    };
    match probe.status {
        206 => {
            let expected = &base.body[start..=end];
            let range_ok = probe
                .header("content-range")
                .and_then(parse_content_range)
                .is_some_and(|(s, e, _)| s == start as u64 && e == end as u64);
            if range_ok && probe.body == expected {
                ProbeVerdict::new(
                    Support::Yes,
                    Note::info("range", format!("bytes {}-{} served as 206", start, end)),
                )
            } else {
                ProbeVerdict::new(
                    Support::No,
                    Note::bad(
                        "range",
                        format!("206 for bytes {}-{} did not carry the requested bytes", start, end),
                    ),
                )
            }
        }
        200 => ProbeVerdict::new(
            Support::No,
            Note::info("range", "Range ignored; full response sent"),
        ),
        other => ProbeVerdict::new(
            Support::Unknown,
            Note::warn("range", format!("range request got status {}", other)),
        ),
    }
}
