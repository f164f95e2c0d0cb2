//! Easy2 Handler that collects one response: header lines and a capped body.

use std::str;

/// Handler state for one transfer. Implements curl's Handler for Easy2.
#[derive(Debug)]
pub struct ResponseHandler {
    pub(super) header_lines: Vec<String>,
    pub(super) body: Vec<u8>,
    /// Every decoded byte delivered, kept or not.
    pub(super) body_len: u64,
    max_body: usize,
}

impl ResponseHandler {
    pub(super) fn new(max_body: usize) -> Self {
        Self {
            header_lines: Vec::new(),
            body: Vec::new(),
            body_len: 0,
            max_body,
        }
    }
}

impl curl::easy::Handler for ResponseHandler {
    fn header(&mut self, data: &[u8]) -> bool {
        if let Ok(s) = str::from_utf8(data) {
            let line = s.trim_end();
            if line.starts_with("HTTP/") {
                self.header_lines.clear();
            }
            if !line.is_empty() {
                self.header_lines.push(line.to_string());
            }
        }
        true
    }

    fn write(&mut self, data: &[u8]) -> Result<usize, curl::easy::WriteError> {
        self.body_len += data.len() as u64;
        let room = self.max_body.saturating_sub(self.body.len());
        let keep = room.min(data.len());
        self.body.extend_from_slice(&data[..keep]);
        Ok(data.len())
    }
}
