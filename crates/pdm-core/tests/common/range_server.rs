//! Minimal threaded HTTP/1.1 server answering HEAD and Range GET, for
//! exercising the libcurl transport end to end.

use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct ServerOptions {
    pub head_status: u16,
    pub content_type: Option<&'static str>,
    /// If false, HEAD omits Content-Length and GET bodies are close-delimited.
    pub send_length: bool,
}

impl Default for ServerOptions {
    fn default() -> Self {
        Self {
            head_status: 200,
            content_type: None,
            send_length: true,
        }
    }
}

/// A running server. Lives until the test process exits.
pub struct RangeServer {
    pub base_url: String,
    gets: Arc<AtomicUsize>,
}

impl RangeServer {
    /// URL for `name` on this server (the path does not affect the body).
    pub fn url(&self, name: &str) -> String {
        format!("{}{}", self.base_url, name)
    }

    /// GET requests served so far.
    pub fn gets(&self) -> usize {
        self.gets.load(Ordering::SeqCst)
    }
}

pub fn start(body: Vec<u8>) -> RangeServer {
    start_with_options(body, ServerOptions::default())
}

pub fn start_with_options(body: Vec<u8>, opts: ServerOptions) -> RangeServer {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().unwrap().port();
    let body = Arc::new(body);
    let gets = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&gets);
    thread::spawn(move || {
        for stream in listener.incoming().flatten() {
            let body = Arc::clone(&body);
            let opts = opts.clone();
            let counter = Arc::clone(&counter);
            thread::spawn(move || handle(stream, &body, &opts, &counter));
        }
    });
    RangeServer {
        base_url: format!("http://127.0.0.1:{}/", port),
        gets,
    }
}

fn handle(mut stream: TcpStream, body: &[u8], opts: &ServerOptions, gets: &AtomicUsize) {
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
    let (method, range) = parse_request(request);
    let total = body.len() as u64;
    let content_type = opts
        .content_type
        .map(|ct| format!("Content-Type: {}\r\n", ct))
        .unwrap_or_default();

    if method.eq_ignore_ascii_case("HEAD") {
        let length = if opts.send_length {
            format!("Content-Length: {}\r\n", total)
        } else {
            String::new()
        };
        let response = format!(
            "HTTP/1.1 {} Status\r\n{}{}Accept-Ranges: bytes\r\nConnection: close\r\n\r\n",
            opts.head_status, length, content_type
        );
        let _ = stream.write_all(response.as_bytes());
        return;
    }
    if !method.eq_ignore_ascii_case("GET") {
        let _ = stream.write_all(b"HTTP/1.1 405 Method Not Allowed\r\nConnection: close\r\n\r\n");
        return;
    }
    gets.fetch_add(1, Ordering::SeqCst);

    let (status, slice, content_range) = match range {
        Some((start, end_incl)) if start < total => {
            let end_excl = end_incl.saturating_add(1).min(total);
            (
                "206 Partial Content",
                &body[start as usize..end_excl as usize],
                format!("Content-Range: bytes {}-{}/{}\r\n", start, end_excl - 1, total),
            )
        }
        Some(_) => (
            "416 Range Not Satisfiable",
            &body[0..0],
            format!("Content-Range: bytes */{}\r\n", total),
        ),
        None => ("200 OK", body, String::new()),
    };
    let length = if opts.send_length {
        format!("Content-Length: {}\r\n", slice.len())
    } else {
        String::new()
    };
    let head = format!(
        "HTTP/1.1 {}\r\n{}{}{}Connection: close\r\n\r\n",
        status, length, content_range, content_type
    );
    let _ = stream.write_all(head.as_bytes());
    let _ = stream.write_all(slice);
}

/// (method, optional (start, end_inclusive) from `Range: bytes=X-Y`).
fn parse_request(request: &str) -> (&str, Option<(u64, u64)>) {
    let mut lines = request.lines();
    let method = lines
        .next()
        .and_then(|l| l.split_whitespace().next())
        .unwrap_or("");
    let range = lines
        .take_while(|l| !l.trim().is_empty())
        .filter_map(|l| l.split_once(':'))
        .find(|(name, _)| name.trim().eq_ignore_ascii_case("range"))
        .and_then(|(_, value)| value.trim().strip_prefix("bytes="))
        .and_then(|bytes| bytes.split_once('-'))
        .map(|(a, b)| {
            let start = a.trim().parse::<u64>().unwrap_or(0);
            let end = b.trim().parse::<u64>().unwrap_or(u64::MAX);
            (start, end)
        });
    (method, range)
}
