//! Minimal HTTP/1.1 server for integration tests.
//!
//! Serves fixed bodies per path. GET with `Range: bytes=X-` gets 206 (or 416
//! past the end) unless the route ignores ranges. Routes can also answer with
//! a fixed status or fail with 503 a number of times first. Every request is
//! logged with its path and Range header.

use std::collections::HashMap;
use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestRecord {
    pub path: String,
    pub range: Option<String>,
}

enum Route {
    Body {
        body: Vec<u8>,
        support_ranges: bool,
        /// 503 replies still owed before the body is served.
        failures_left: AtomicUsize,
    },
    Status(u16),
}

#[derive(Default)]
pub struct ServerBuilder {
    routes: HashMap<String, Route>,
}

impl ServerBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    fn route(mut self, path: &str, route: Route) -> Self {
        self.routes.insert(path.to_string(), route);
        self
    }

    /// Serve `body` at `path` with range support.
    pub fn body(self, path: &str, body: impl Into<Vec<u8>>) -> Self {
        self.flaky(path, 0, body)
    }

    /// Serve `body` at `path`, always as a full 200 reply.
    pub fn body_ignoring_range(self, path: &str, body: impl Into<Vec<u8>>) -> Self {
        self.route(
            path,
            Route::Body {
                body: body.into(),
                support_ranges: false,
                failures_left: AtomicUsize::new(0),
            },
        )
    }

    /// Answer the first `failures` requests for `path` with 503, then serve `body`.
    pub fn flaky(self, path: &str, failures: usize, body: impl Into<Vec<u8>>) -> Self {
        self.route(
            path,
            Route::Body {
                body: body.into(),
                support_ranges: true,
                failures_left: AtomicUsize::new(failures),
            },
        )
    }

    /// Always answer `path` with `code` and a short text body.
    pub fn status(self, path: &str, code: u16) -> Self {
        self.route(path, Route::Status(code))
    }

    /// Start serving in a background thread. Runs until the process exits.
    pub fn start(self) -> AssetServer {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
        let port = listener.local_addr().unwrap().port();
        let routes = Arc::new(self.routes);
        let log = Arc::new(Mutex::new(Vec::new()));
        {
            let log = Arc::clone(&log);
            thread::spawn(move || {
                for stream in listener.incoming().flatten() {
                    let routes = Arc::clone(&routes);
                    let log = Arc::clone(&log);
                    thread::spawn(move || handle(stream, &routes, &log));
                }
            });
        }
        AssetServer {
            base: format!("http://127.0.0.1:{}", port),
            log,
        }
    }
}

pub struct AssetServer {
    base: String,
    log: Arc<Mutex<Vec<RequestRecord>>>,
}

impl AssetServer {
    /// Absolute URL for `path` (which starts with `/`).
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    pub fn requests(&self) -> Vec<RequestRecord> {
        self.log.lock().unwrap().clone()
    }

    /// Number of requests received for `path`.
    pub fn hits(&self, path: &str) -> usize {
        self.requests().iter().filter(|r| r.path == path).count()
    }
}

fn handle(mut stream: TcpStream, routes: &HashMap<String, Route>, log: &Mutex<Vec<RequestRecord>>) {
    let _ = stream.set_read_timeout(Some(Duration::from_secs(2)));
    let _ = stream.set_write_timeout(Some(Duration::from_secs(2)));
    let mut buf = [0u8; 8192];
    let n = match stream.read(&mut buf) {
        Ok(0) | Err(_) => return,
        Ok(n) => n,
    };
    let Ok(request) = std::str::from_utf8(&buf[..n]) else {
        return;
    };
    let (path, range) = parse_request(request);
    log.lock().unwrap().push(RequestRecord {
        path: path.clone(),
        range: range.clone(),
    });

    match routes.get(&path) {
        None => respond(&mut stream, "404 Not Found", &[], b"not found"),
        Some(Route::Status(code)) => {
            let status = format!("{} Test Status", code);
            respond(&mut stream, &status, &[], b"error body");
        }
        Some(Route::Body {
            body,
            support_ranges,
            failures_left,
        }) => {
            let owed = failures_left
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok();
            if owed {
                respond(&mut stream, "503 Service Unavailable", &[], b"busy");
                return;
            }
            serve_body(&mut stream, body, range.as_deref().filter(|_| *support_ranges));
        }
    }
}

fn serve_body(stream: &mut TcpStream, body: &[u8], range: Option<&str>) {
    let total = body.len();
    let Some(start) = range.and_then(range_start) else {
        respond(stream, "200 OK", &[], body);
        return;
    };
    if start >= total {
        let content_range = format!("Content-Range: bytes */{}", total);
        respond(stream, "416 Range Not Satisfiable", &[&content_range], b"");
        return;
    }
    let content_range = format!("Content-Range: bytes {}-{}/{}", start, total - 1, total);
    respond(stream, "206 Partial Content", &[&content_range], &body[start..]);
}

fn respond(stream: &mut TcpStream, status: &str, headers: &[&str], body: &[u8]) {
    let mut head = format!(
        "HTTP/1.1 {}\r\nContent-Length: {}\r\nConnection: close\r\n",
        status,
        body.len()
    );
    for h in headers {
        head.push_str(h);
        head.push_str("\r\n");
    }
    head.push_str("\r\n");
    let _ = stream.write_all(head.as_bytes());
    let _ = stream.write_all(body);
}

/// Start offset of `bytes=X-` (open-ended ranges only).
fn range_start(value: &str) -> Option<usize> {
    let spec = value.trim().strip_prefix("bytes=")?;
    let (start, _) = spec.split_once('-')?;
    start.trim().parse().ok()
}

/// Returns (path, Range header value).
fn parse_request(request: &str) -> (String, Option<String>) {
    let mut lines = request.lines();
    let path = lines
        .next()
        .and_then(|l| l.split_whitespace().nth(1))
        .unwrap_or("/")
        .to_string();
    let range = lines
        .take_while(|l| !l.trim().is_empty())
        .filter_map(|l| l.split_once(':'))
        .find(|(name, _)| name.trim().eq_ignore_ascii_case("range"))
        .map(|(_, value)| value.trim().to_string());
    (path, range)
}
