//! Minimal HTTP/1.1 server for transport tests.
//!
//! Serves a fixed route table from a background thread. Every request gets a
//! fresh connection (`Connection: close`).

use std::collections::HashMap;
use std::io::{Read, Write};
use std::net::TcpListener;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;

#[derive(Debug, Clone)]
pub enum Route {
    /// 200 with this body.
    Body(Vec<u8>),
    /// Empty response with this status.
    Status(u16),
    /// Announces `announced` bytes, sends `body`, then closes the connection.
    Truncated { announced: u64, body: Vec<u8> },
}

pub struct MediaServer {
    base: String,
    hits: Arc<AtomicUsize>,
}

impl MediaServer {
    /// Absolute URL for `path` (with or without a leading slash).
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path.trim_start_matches('/'))
    }

    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }
}

/// Starts the server; it runs until the process exits. Unknown paths get 404.
pub fn start(routes: Vec<(&str, Route)>) -> MediaServer {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().unwrap().port();
    let routes: Arc<HashMap<String, Route>> = Arc::new(
        routes
            .into_iter()
            .map(|(p, r)| (format!("/{}", p.trim_start_matches('/')), r))
            .collect(),
    );
    let hits = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&hits);
    thread::spawn(move || {
        for stream in listener.incoming().flatten() {
            let routes = Arc::clone(&routes);
            counter.fetch_add(1, Ordering::SeqCst);
            thread::spawn(move || handle(stream, &routes));
        }
    });
    MediaServer {
        base: format!("http://127.0.0.1:{}/", port),
        hits,
    }
}

fn handle(mut stream: std::net::TcpStream, routes: &HashMap<String, Route>) {
    let _ = stream.set_read_timeout(Some(std::time::Duration::from_secs(2)));
    let _ = stream.set_write_timeout(Some(std::time::Duration::from_secs(2)));
    let mut buf = [0u8; 8192];
    let n = match stream.read(&mut buf) {
        Ok(0) | Err(_) => return,
        Ok(n) => n,
    };
    let request = match std::str::from_utf8(&buf[..n]) {
        Ok(s) => s,
        Err(_) => return,
    };
    let path = request
        .lines()
        .next()
        .and_then(|line| line.split_whitespace().nth(1))
        .map(|p| p.split('?').next().unwrap_or(p))
        .unwrap_or("/");

    match routes.get(path) {
        Some(Route::Body(body)) => {
            let head = format!(
                "HTTP/1.1 200 OK\r\nContent-Length: {}\r\nContent-Type: audio/mpeg\r\nConnection: close\r\n\r\n",
                body.len()
            );
            let _ = stream.write_all(head.as_bytes());
            let _ = stream.write_all(body);
        }
        Some(Route::Truncated { announced, body }) => {
            let head = format!(
                "HTTP/1.1 200 OK\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                announced
            );
            let _ = stream.write_all(head.as_bytes());
            let _ = stream.write_all(body);
        }
        Some(Route::Status(code)) => {
            let head = format!(
                "HTTP/1.1 {} {}\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
                code,
                reason(*code)
            );
            let _ = stream.write_all(head.as_bytes());
        }
        None => {
            let _ = stream.write_all(
                b"HTTP/1.1 404 Not Found\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
            );
        }
    }
    let _ = stream.flush();
}

fn reason(code: u16) -> &'static str {
    match code {
        404 => "Not Found",
        429 => "Too Many Requests",
        500 => "Internal Server Error",
        503 => "Service Unavailable",
        _ => "Status",
    }
}
