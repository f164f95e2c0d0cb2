//! Parse raw HTTP response header lines.

/// Parse `HTTP/1.1 200 OK` into (200, "OK").
pub fn parse_status_line(line: &str) -> Option<(u32, String)> {
    let rest = line.trim().strip_prefix("HTTP/")?;
    let mut parts = rest.splitn(3, ' ');
    let _version = parts.next()?;
    let code = parts.next()?.trim().parse::<u32>().ok()?;
    let reason = parts.next().unwrap_or("").trim().to_string();
    Some((code, reason))
}

/// Split collected lines into the last status line and the header fields that
/// follow it. Blank lines and lines without a colon are skipped.
pub fn parse_header_lines(lines: &[String]) -> (Option<(u32, String)>, Vec<(String, String)>) {
    let mut status = None;
    let mut headers = Vec::new();

    for line in lines {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line.starts_with("HTTP/") {
            status = parse_status_line(line);
            headers.clear();
            continue;
        }
        if let Some((name, value)) = line.split_once(':') {
            headers.push((name.trim().to_string(), value.trim().to_string()));
        }
    }

    (status, headers)
}

/// Parse `Content-Range: bytes start-end/total` into (start, end_inclusive, total).
/// `total` is None for `*`.
pub fn parse_content_range(value: &str) -> Option<(u64, u64, Option<u64>)> {
    let value = value.trim();
    let spec = value
        .strip_prefix("bytes")
        .or_else(|| value.strip_prefix("BYTES"))?
        .trim();
    let (range, total) = spec.split_once('/')?;
    let (start, end) = range.trim().split_once('-')?;
    let start = start.trim().parse::<u64>().ok()?;
    let end = end.trim().parse::<u64>().ok()?;
    if end < start {
        return None;
    }
    let total = match total.trim() {
        "*" => None,
        t => Some(t.parse::<u64>().ok()?),
    };
    Some((start, end, total))
}
