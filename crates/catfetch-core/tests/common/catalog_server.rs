//! Minimal HTTP/1.1 server for integration tests.
//!
//! Serves a mutable set of routes, each with an optional ETag and
//! Last-Modified. Answers HEAD with headers only, GET with the body, and a
//! `Range: bytes=0-0` GET with 206 and the first byte. Counts full-body GETs
//! per path so tests can assert what was re-downloaded.

#![allow(dead_code)]

use std::collections::HashMap;
use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Route {
    pub status: u16,
    pub etag: Option<String>,
    pub last_modified: Option<String>,
    pub body: Vec<u8>,
    /// If false, HEAD returns 405 (simulates servers that block HEAD).
    pub head_allowed: bool,
}

impl Route {
    pub fn csv(etag: &str, body: &str) -> Self {
        Self {
            status: 200,
            etag: Some(etag.to_string()),
            last_modified: None,
            body: body.as_bytes().to_vec(),
            head_allowed: true,
        }
    }

    pub fn json(body: String) -> Self {
        Self {
            status: 200,
            etag: None,
            last_modified: None,
            body: body.into_bytes(),
            head_allowed: true,
        }
    }

    pub fn status(status: u16) -> Self {
        Self {
            status,
            etag: None,
            last_modified: None,
            body: Vec::new(),
            head_allowed: true,
        }
    }
}

#[derive(Default)]
struct State {
    routes: Mutex<HashMap<String, Route>>,
    gets: Mutex<HashMap<String, usize>>,
}

#[derive(Clone)]
pub struct CatalogServer {
    base: String,
    state: Arc<State>,
}

impl CatalogServer {
    /// Start a server on an ephemeral port. It runs until the process exits.
    pub fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
        let port = listener.local_addr().unwrap().port();
        let state = Arc::new(State::default());
        let shared = Arc::clone(&state);
        thread::spawn(move || {
            for stream in listener.incoming().flatten() {
                let state = Arc::clone(&shared);
                thread::spawn(move || handle(stream, &state));
            }
        });
        Self {
            base: format!("http://127.0.0.1:{}", port),
            state,
        }
    }

    /// Absolute URL for `path` (which starts with '/').
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    pub fn set(&self, path: &str, route: Route) {
        self.state.routes.lock().unwrap().insert(path.to_string(), route);
    }

    /// Full-body GETs served for `path` so far.
    pub fn gets(&self, path: &str) -> usize {
        self.state.gets.lock().unwrap().get(path).copied().unwrap_or(0)
    }
}

fn handle(mut stream: TcpStream, state: &State) {
    let _ = stream.set_read_timeout(Some(Duration::from_secs(2)));
    let _ = stream.set_write_timeout(Some(Duration::from_secs(2)));
    let mut buf = [0u8; 8192];
    let n = match stream.read(&mut buf) {
        Ok(0) | Err(_) => return,
        Ok(n) => n,
    };
    let request = match std::str::from_utf8(&buf[..n]) {
        Ok(s) => s,
        Err(_) => return,
    };
    let (method, path, ranged) = parse_request(request);
    let route = state.routes.lock().unwrap().get(&path).cloned();
    let Some(route) = route else {
        let _ = stream.write_all(
            b"HTTP/1.1 404 Not Found\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
        );
        return;
    };

    let head = method.eq_ignore_ascii_case("HEAD");
    if head && !route.head_allowed {
        let _ = stream.write_all(
            b"HTTP/1.1 405 Method Not Allowed\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
        );
        return;
    }
    if !head && !method.eq_ignore_ascii_case("GET") {
        let _ = stream.write_all(
            b"HTTP/1.1 405 Method Not Allowed\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
        );
        return;
    }

    let mut headers = String::new();
    if let Some(etag) = &route.etag {
        headers.push_str(&format!("ETag: \"{}\"\r\n", etag));
    }
    if let Some(lm) = &route.last_modified {
        headers.push_str(&format!("Last-Modified: {}\r\n", lm));
    }

    let (status_line, body): (String, &[u8]) = if route.status != 200 {
        (format!("{} Error", route.status), &[])
    } else if ranged && !route.body.is_empty() {
        headers.push_str(&format!("Content-Range: bytes 0-0/{}\r\n", route.body.len()));
        ("206 Partial Content".to_string(), &route.body[..1])
    } else {
        ("200 OK".to_string(), &route.body[..])
    };

    if !head && !ranged && route.status == 200 {
        *state.gets.lock().unwrap().entry(path.clone()).or_default() += 1;
    }

    let response = format!(
        "HTTP/1.1 {}\r\nContent-Length: {}\r\n{}Connection: close\r\n\r\n",
        status_line,
        body.len(),
        headers
    );
    let _ = stream.write_all(response.as_bytes());
    if !head {
        let _ = stream.write_all(body);
    }
}

/// Returns (method, path, whether a `Range` header was sent).
fn parse_request(request: &str) -> (String, String, bool) {
    let mut lines = request.lines();
    let mut first = lines.next().unwrap_or("").split_whitespace();
    let method = first.next().unwrap_or("").to_string();
    let path = first.next().unwrap_or("/").to_string();
    let ranged = lines
        .take_while(|l| !l.trim().is_empty())
        .filter_map(|l| l.split_once(':'))
        .any(|(name, _)| name.trim().eq_ignore_ascii_case("range"));
    (method, path, ranged)
}
