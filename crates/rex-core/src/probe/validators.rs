//! Conditional GET with the validators the base response carried.

use crate::check::{Check, CheckRequest, Note, Support};
use crate::response::FetchedResponse;

use super::{ProbeKind, ProbePlan, ProbeVerdict};

fn conditional(base: &Check, name: &str, value: &str) -> CheckRequest {
    CheckRequest::get(base.request().uri.clone())
        .with_headers(base.request().headers.clone())
        .with_header(name, value)
}

pub(super) fn plan_etag(base: &Check, response: &FetchedResponse) -> ProbePlan {
    match response.etag() {
        Some(etag) => ProbePlan::Run {
            kind: ProbeKind::ETag,
            request: conditional(base, "If-None-Match", etag),
        },
        None => ProbePlan::skip(ProbeKind::ETag, Support::Unknown, "no ETag"),
    }
}

pub(super) fn plan_last_modified(base: &Check, response: &FetchedResponse) -> ProbePlan {
    match response.last_modified() {
        Some(lm) => ProbePlan::Run {
            kind: ProbeKind::LastModified,
            request: conditional(base, "If-Modified-Since", lm),
        },
        None => ProbePlan::skip(ProbeKind::LastModified, Support::Unknown, "no Last-Modified"),
    }
}

pub(super) fn judge(
    kind: ProbeKind,
    header: &str,
    base: &FetchedResponse,
    probe: &FetchedResponse,
) -> ProbeVerdict {
    let subject = kind.name();
    if probe.status == 304 {
        ProbeVerdict::new(
            Support::Yes,
            Note::info(subject, format!("{} answered with 304", header)),
        )
    } else if probe.status == base.status {
        ProbeVerdict::new(
            Support::No,
            Note::warn(
                subject,
                format!("{} ignored; full {} response sent", header, probe.status),
            ),
        )
    } else {
        ProbeVerdict::new(
            Support::Unknown,
            Note::warn(
                subject,
                format!(
                    "{} request got {} where the base got {}",
                    header, probe.status, base.status
                ),
            ),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::super::testing::response;
    use super::*;
    use crate::check::CheckId;

    #[test]
    fn conditional_request_uses_derived_headers() {
        let headers = vec![("User-Agent".to_string(), "t".to_string())];
        let mut base = Check::resource(CheckId::new(0), "http://x/a", "GET", headers, None, false);
        base.begin_fetch().unwrap();
        let resp = response(200, &["ETag: W/\"v2\""], b"x");
        base.complete(Ok(resp.clone())).unwrap();

        let ProbePlan::Run { request, .. } = plan_etag(&base, &resp) else {
            panic!("expected a run plan");
        };
        assert_eq!(request.method, "GET");
        assert_eq!(request.header("If-None-Match"), Some("W/\"v2\""));
        assert_eq!(request.header("Accept-Encoding"), Some("gzip"));
        assert_eq!(request.header("User-Agent"), Some("t"));

        assert!(matches!(
            plan_last_modified(&base, &resp),
            ProbePlan::Skip { support: Support::Unknown, .. }
        ));
    }

    #[test]
    fn verdicts_by_status() {
        let base = response(200, &[], b"x");
        let judge_status = |s| judge(ProbeKind::ETag, "If-None-Match", &base, &response(s, &[], b"")).support;
        assert_eq!(judge_status(304), Support::Yes);
        assert_eq!(judge_status(200), Support::No);
        assert_eq!(judge_status(412), Support::Unknown);
    }
}
