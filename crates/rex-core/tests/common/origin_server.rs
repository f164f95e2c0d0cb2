//! Minimal HTTP/1.1 origin for integration tests.
//!
//! Serves a small site: an HTML page linking to a stylesheet, an image and
//! another page. Every resource honors `If-None-Match`, `If-Modified-Since`
//! and single `Range: bytes=a-b` requests; the page is also available
//! gzip-encoded when the request accepts it.

use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::thread;
use std::time::Duration;

pub const ETAG: &str = "\"v1\"";
pub const LAST_MODIFIED: &str = "Wed, 21 Oct 2015 07:28:00 GMT";

const PAGE_HEAD: &str = "<!DOCTYPE html>\n<html><head><title>origin</title>\n\
<link rel=\"stylesheet\" href=\"/style.css\">\n</head><body>\n\
<img src=\"/logo.png\" title=\"Logo\">\n<img src=\"/logo.png\">\n\
<a href=\"/other.html\">other</a>\n";
const PAGE_PARA: &str =
    "<p>Cacheable representations compress well when they repeat themselves.</p>\n";
const PAGE_TAIL: &str = "</body></html>\n";

/// `page()` compressed with gzip (mtime 0).
const PAGE_GZIP: &[u8] = &[
    0x1f, 0x8b, 0x08, 0x00, 0x00, 0x00, 0x00, 0x00, 0x02, 0x03, 0xed, 0x94,
    0x31, 0x6e, 0xc3, 0x30, 0x0c, 0x45, 0xf7, 0x9c, 0x82, 0xd1, 0x01, 0xac,
    0x0b, 0xc8, 0x5a, 0x92, 0x6e, 0x01, 0x92, 0x21, 0x4b, 0x47, 0xc5, 0x61,
    0x2c, 0xa1, 0xb4, 0x64, 0x88, 0x44, 0x0d, 0xdf, 0xbe, 0xb4, 0x82, 0x6e,
    0x9d, 0x3b, 0x79, 0x22, 0xf9, 0xf5, 0xf9, 0xc4, 0xe9, 0xbb, 0xe3, 0xf9,
    0x7a, 0xba, 0x7f, 0xde, 0x3e, 0x20, 0xca, 0x44, 0xfe, 0xe0, 0x5a, 0x71,
    0x11, 0xc3, 0xd3, 0x3b, 0x49, 0x42, 0xe8, 0x4b, 0x4d, 0x63, 0xca, 0xce,
    0xbe, 0xa7, 0x83, 0xa3, 0x94, 0xbf, 0xa0, 0x22, 0xf5, 0x86, 0x65, 0x25,
    0xe4, 0x88, 0x28, 0x06, 0x62, 0xc5, 0x57, 0x6f, 0x6c, 0x93, 0xba, 0x81,
    0xd9, 0xa8, 0xd3, 0xbe, 0x31, 0x8f, 0xf2, 0x5c, 0x75, 0x4a, 0xd3, 0x08,
    0x5c, 0x07, 0x35, 0x51, 0x19, 0x4b, 0x37, 0xe7, 0xd1, 0x40, 0x63, 0xf6,
    0xe6, 0xa2, 0x82, 0xf9, 0xdb, 0xa2, 0x6a, 0xf8, 0x85, 0x17, 0x89, 0x58,
    0xbb, 0xed, 0x42, 0xe3, 0x5b, 0xef, 0x6c, 0xd0, 0xf7, 0xd9, 0x9f, 0xc2,
    0xa0, 0x5f, 0x3d, 0x08, 0xf5, 0xae, 0xb9, 0x22, 0x63, 0x96, 0x20, 0xa9,
    0x64, 0x86, 0xa1, 0x4c, 0x9b, 0xc0, 0xb0, 0x20, 0x11, 0x2c, 0x11, 0x33,
    0xe8, 0xe2, 0xba, 0xf9, 0x30, 0xc8, 0xd6, 0x4f, 0x8c, 0xf4, 0x8d, 0xdc,
    0x39, 0x3b, 0xef, 0xac, 0x9d, 0xb5, 0xb3, 0x76, 0xd6, 0x3f, 0xb3, 0x6c,
    0x0b, 0x48, 0x4d, 0xcb, 0x96, 0xc0, 0x3f, 0xbb, 0x58, 0x78, 0x25, 0x92,
    0x05, 0x00, 0x00,
];

/// Identity representation of `/page.html`.
pub fn page() -> Vec<u8> {
    let mut s = String::from(PAGE_HEAD);
    for _ in 0..16 {
        s.push_str(PAGE_PARA);
    }
    s.push_str(PAGE_TAIL);
    s.into_bytes()
}

struct Resource {
    content_type: &'static str,
    body: Vec<u8>,
    gzip: Option<&'static [u8]>,
}

fn lookup(path: &str) -> Option<Resource> {
    let res = match path {
        "/page.html" => Resource {
            content_type: "text/html; charset=utf-8",
            body: page(),
            gzip: Some(PAGE_GZIP),
        },
        "/style.css" => Resource {
            content_type: "text/css",
            body: b"body { color: #333; margin: 0 auto; }\n".to_vec(),
            gzip: None,
        },
        "/logo.png" => Resource {
            content_type: "image/png",
            body: (0u8..64).collect(),
            gzip: None,
        },
        _ => return None,
    };
    Some(res)
}

/// Starts the origin in a background thread. Returns the base URL
/// (e.g. "http://127.0.0.1:12345"). The server runs until the process exits.
pub fn start() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().unwrap().port();
    thread::spawn(move || {
        for stream in listener.incoming().flatten() {
            thread::spawn(move || handle(stream));
        }
    });
    format!("http://127.0.0.1:{}", port)
}

struct Request {
    path: String,
    headers: Vec<(String, String)>,
}

impl Request {
    fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

fn read_request(stream: &mut TcpStream) -> Option<Request> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];
    while !buf.windows(4).any(|w| w == b"\r\n\r\n") {
        let n = stream.read(&mut chunk).ok()?;
        if n == 0 {
            return None;
        }
        buf.extend_from_slice(&chunk[..n]);
    }
    let text = String::from_utf8_lossy(&buf).into_owned();
    let mut lines = text.lines();
    let path = lines.next()?.split_whitespace().nth(1)?.to_string();
    let headers = lines
        .take_while(|l| !l.is_empty())
        .filter_map(|l| l.split_once(':'))
        .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
        .collect();
    Some(Request { path, headers })
}

/// (start, end inclusive) of `bytes=a-b`, clamped to `len`.
fn parse_range(value: &str, len: usize) -> Option<(usize, usize)> {
    let (a, b) = value.strip_prefix("bytes=")?.split_once('-')?;
    let start: usize = a.trim().parse().ok()?;
    let end: usize = b.trim().parse().ok()?;
    let end = end.min(len.checked_sub(1)?);
    (start <= end).then_some((start, end))
}

fn write_response(stream: &mut TcpStream, status: &str, headers: &[(&str, String)], body: &[u8]) {
    let mut head = format!("HTTP/1.1 {}\r\nConnection: close\r\nContent-Length: {}\r\n", status, body.len());
    for (k, v) in headers {
        head.push_str(&format!("{}: {}\r\n", k, v));
    }
    head.push_str("\r\n");
    let _ = stream.write_all(head.as_bytes());
    let _ = stream.write_all(body);
}

fn handle(mut stream: TcpStream) {
    let _ = stream.set_read_timeout(Some(Duration::from_secs(2)));
    let _ = stream.set_write_timeout(Some(Duration::from_secs(2)));
    let Some(req) = read_request(&mut stream) else {
        return;
    };
    let Some(res) = lookup(&req.path) else {
        write_response(&mut stream, "404 Not Found", &[], b"not found\n");
        return;
    };

    let mut headers = vec![
        ("Content-Type", res.content_type.to_string()),
        ("ETag", ETAG.to_string()),
        ("Last-Modified", LAST_MODIFIED.to_string()),
    ];
    if req.header("If-None-Match") == Some(ETAG)
        || req.header("If-Modified-Since") == Some(LAST_MODIFIED)
    {
        write_response(&mut stream, "304 Not Modified", &headers, b"");
        return;
    }

    let wants_gzip = req
        .header("Accept-Encoding")
        .is_some_and(|v| v.contains("gzip"));
    if let (true, Some(gz)) = (wants_gzip, res.gzip) {
        headers.push(("Content-Encoding", "gzip".to_string()));
        headers.push(("Vary", "Accept-Encoding".to_string()));
        write_response(&mut stream, "200 OK", &headers, gz);
        return;
    }

    if let Some((start, end)) = req
        .header("Range")
        .and_then(|v| parse_range(v, res.body.len()))
    {
        headers.push((
            "Content-Range",
            format!("bytes {}-{}/{}", start, end, res.body.len()),
        ));
        write_response(&mut stream, "206 Partial Content", &headers, &res.body[start..=end]);
        return;
    }

    write_response(&mut stream, "200 OK", &headers, &res.body);
}
