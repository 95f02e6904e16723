//! Minimal HTTP/1.1 server standing in for the marketplace in integration tests.
//!
//! `POST /_apis/public/gallery/extensionquery` answers with a canned catalog
//! body (`{base}` is replaced by the server's base URL, so assets can point
//! back at it). `GET /files/...` serves the package bytes with a misleading
//! server-side name and type. Every request is recorded.

#![allow(dead_code)]

use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::{Arc, Mutex};
use std::thread;

pub const QUERY_PATH: &str = "/_apis/public/gallery/extensionquery";

#[derive(Debug, Clone)]
pub struct ServerOptions {
    pub catalog_status: u16,
    pub catalog_body: String,
    pub file_status: u16,
    pub file_body: Vec<u8>,
}

impl Default for ServerOptions {
    fn default() -> Self {
        Self {
            catalog_status: 200,
            catalog_body: catalog_with_asset("{base}/files/download.zip"),
            file_status: 200,
            file_body: b"PK\x03\x04 fake vsix payload".to_vec(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl RecordedRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

pub struct MarketplaceServer {
    base: String,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl MarketplaceServer {
    pub fn endpoint(&self) -> String {
        format!("{}{}", self.base, QUERY_PATH)
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }
}

/// Catalog body with one entry, one version, one package-binary asset at `source`.
pub fn catalog_with_asset(source: &str) -> String {
    format!(
        r#"{{"results":[{{"extensions":[{{"extensionName":"tool","publisher":{{"publisherName":"acme"}},"versions":[{{"version":"1.0.0","files":[{{"assetType":"Microsoft.VisualStudio.Services.Icons.Default","source":"{{base}}/files/icon.png"}},{{"assetType":"Microsoft.VisualStudio.Services.VSIXPackage","source":"{source}"}}]}}]}}]}}]}}"#
    )
}

pub fn start(opts: ServerOptions) -> MarketplaceServer {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().unwrap().port();
    let base = format!("http://127.0.0.1:{}", port);
    let requests = Arc::new(Mutex::new(Vec::new()));

    let opts = Arc::new(opts);
    let recorded = Arc::clone(&requests);
    let base_for_thread = base.clone();
    thread::spawn(move || {
        for stream in listener.incoming().flatten() {
            let opts = Arc::clone(&opts);
            let recorded = Arc::clone(&recorded);
            let base = base_for_thread.clone();
            thread::spawn(move || handle(stream, &opts, &recorded, &base));
        }
    });
    MarketplaceServer { base, requests }
}

fn handle(mut stream: TcpStream, opts: &ServerOptions, recorded: &Mutex<Vec<RecordedRequest>>, base: &str) {
    let _ = stream.set_read_timeout(Some(std::time::Duration::from_secs(2)));
    let _ = stream.set_write_timeout(Some(std::time::Duration::from_secs(2)));
    let Some(request) = read_request(&mut stream) else {
        return;
    };
    let method = request.method.clone();
    let path = request.path.clone();
    recorded.lock().unwrap().push(request);

    let (status, content_type, extra, body): (u16, &str, &str, Vec<u8>) =
        if method == "POST" && path == QUERY_PATH {
            (
                opts.catalog_status,
                "application/json",
                "",
                opts.catalog_body.replace("{base}", base).into_bytes(),
            )
        } else if method == "GET" && path.starts_with("/files/") {
            (
                opts.file_status,
                "application/zip",
                "Content-Disposition: attachment; filename=\"server-name.zip\"\r\n",
                opts.file_body.clone(),
            )
        } else {
            (404, "text/plain", "", b"not found".to_vec())
        };

    let head = format!(
        "HTTP/1.1 {} {}\r\nContent-Type: {}\r\nContent-Length: {}\r\n{}Connection: close\r\n\r\n",
        status,
        reason(status),
        content_type,
        body.len(),
        extra
    );
    let _ = stream.write_all(head.as_bytes());
    let _ = stream.write_all(&body);
}

fn reason(status: u16) -> &'static str {
    match status {
        200 => "OK",
        404 => "Not Found",
        500 => "Internal Server Error",
        503 => "Service Unavailable",
        _ => "Status",
    }
}

/// Reads the request line, headers, and a `Content-Length` body.
fn read_request(stream: &mut TcpStream) -> Option<RecordedRequest> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];
    let header_end = loop {
        let n = stream.read(&mut chunk).ok()?;
        if n == 0 {
            return None;
        }
        buf.extend_from_slice(&chunk[..n]);
        if let Some(pos) = find(&buf, b"\r\n\r\n") {
            break pos + 4;
        }
    };

    let head = std::str::from_utf8(&buf[..header_end]).ok()?;
    let mut lines = head.lines();
    let mut first = lines.next()?.split_whitespace();
    let method = first.next()?.to_string();
    let path = first.next()?.to_string();
    let headers: Vec<(String, String)> = lines
        .filter_map(|l| l.split_once(':'))
        .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
        .collect();
    let content_length = headers
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case("content-length"))
        .and_then(|(_, v)| v.parse::<usize>().ok())
        .unwrap_or(0);

    let mut body = buf[header_end..].to_vec();
    while body.len() < content_length {
        let n = stream.read(&mut chunk).ok()?;
        if n == 0 {
            break;
        }
        body.extend_from_slice(&chunk[..n]);
    }

    Some(RecordedRequest {
        method,
        path,
        headers,
        body,
    })
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}
