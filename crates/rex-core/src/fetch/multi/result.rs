//! Build a FetchedResponse from a completed Easy2 transfer.

use std::mem;
use std::time::Instant;

use curl::easy::Easy2;

use crate::response::FetchedResponse;

use super::handler::ResponseHandler;

/// Take the collected headers and body out of the handler. Falls back to
/// curl's response code when no status line was seen.
pub(super) fn response_from_easy(
    easy: &mut Easy2<ResponseHandler>,
    started: Instant,
) -> FetchedResponse {
    let code = easy.response_code().unwrap_or(0);
    let wire_len = easy.download_size().ok().map(|n| n as u64);

    let handler = easy.get_mut();
    let lines = mem::take(&mut handler.header_lines);
    let body = mem::take(&mut handler.body);
    let mut response = FetchedResponse::from_parts(&lines, body, handler.body_len);
    if response.status == 0 {
        response.status = code;
    }
    response.truncated = response.body_len > response.body.len() as u64;
    response.wire_len = wire_len.unwrap_or(response.body_len);
    response.elapsed_ms = started.elapsed().as_millis() as u64;
    response
}
