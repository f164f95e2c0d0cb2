//! Build a configured Easy2 handle for one check request.

use curl::easy::{Easy2, List};

use crate::check::CheckRequest;
use crate::fetch::{FetchError, TransferOptions};

use super::handler::ResponseHandler;

/// Configure method, headers, body and timeouts. Redirects are not followed:
/// a 3xx is the response of the check.
///
/// An `Accept-Encoding` header is handed to curl's content decoding instead
/// of being sent raw, so the body arrives decoded while `download_size`
/// still reports the bytes on the wire.
pub(super) fn build_easy(
    request: &CheckRequest,
    options: &TransferOptions,
) -> Result<Easy2<ResponseHandler>, FetchError> {
    let mut easy = Easy2::new(ResponseHandler::new(options.max_body_bytes));
    easy.url(&request.uri)?;
    easy.follow_location(false)?;
    easy.useragent(&options.user_agent)?;
    easy.connect_timeout(options.connect_timeout)?;
    easy.timeout(options.timeout)?;

    let method = request.method.trim().to_ascii_uppercase();
    if method.is_empty() {
        return Err(FetchError::InvalidRequest("empty method".to_string()));
    }
    if method == "HEAD" {
        easy.nobody(true)?;
    } else if let Some(body) = &request.body {
        easy.post_fields_copy(body)?;
        if method != "POST" {
            easy.custom_request(&method)?;
        }
    } else if method == "GET" {
        easy.get(true)?;
    } else {
        easy.custom_request(&method)?;
    }

    let mut list = List::new();
    let mut any = false;
    for (name, value) in &request.headers {
        let name = name.trim();
        if name.is_empty() || name.contains(|c: char| c == ':' || c.is_whitespace()) {
            return Err(FetchError::InvalidRequest(format!("bad header name {:?}", name)));
        }
        if name.eq_ignore_ascii_case("accept-encoding") {
            easy.accept_encoding(value.trim())?;
            continue;
        }
        list.append(&format!("{}: {}", name, value.trim()))?;
        any = true;
    }
    if any {
        easy.http_headers(list)?;
    }

    Ok(easy)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_bad_header_name() {
        let req = CheckRequest::get("http://127.0.0.1/").with_header("Bad Name", "x");
        let err = build_easy(&req, &TransferOptions::default()).unwrap_err();
        assert!(matches!(err, FetchError::InvalidRequest(_)));
    }

    #[test]
    fn rejects_empty_method() {
        let req = CheckRequest::new("http://127.0.0.1/", " ");
        assert!(build_easy(&req, &TransferOptions::default()).is_err());
    }

    #[test]
    fn builds_with_body_and_negotiation() {
        let req = CheckRequest::new("http://127.0.0.1/form", "PUT")
            .with_header("Accept-Encoding", "gzip")
            .with_header("X-Trace", "1")
            .with_body(Some(b"payload".to_vec()));
        assert!(build_easy(&req, &TransferOptions::default()).is_ok());
    }
}
