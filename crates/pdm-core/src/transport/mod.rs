//! HTTP transport capability.
//!
//! The engine only needs two operations: a HEAD that yields the status code
//! and headers, and a GET (optionally ranged) whose body is pushed to a
//! `BodySink` chunk by chunk. `CurlTransport` is the libcurl implementation;
//! tests substitute scripted transports.

mod libcurl;
mod parse;

pub use libcurl::{CurlOptions, CurlTransport};
pub use parse::{parse_header_lines, parse_status_line};

use std::io;

use crate::segmenter::Segment;

/// Failure reported by a transport.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Connect or transfer timed out.
    #[error("timed out: {0}")]
    Timeout(String),
    /// Network-level failure (refused, reset, DNS, closed early).
    #[error("connection failed: {0}")]
    Connection(String),
    /// Reading the body failed.
    #[error("read failed: {0}")]
    Io(#[from] io::Error),
    /// The body sink refused further data.
    #[error("transfer stopped by consumer: {0}")]
    Aborted(io::Error),
    #[error("{0}")]
    Other(String),
}

/// Status and headers of a HEAD response (final hop after redirects).
#[derive(Debug, Clone, Default)]
pub struct HeadResponse {
    pub status: u32,
    pub headers: Vec<(String, String)>,
}

impl HeadResponse {
    /// First value of header `name`, compared case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// `Content-Length`, if present and numeric.
    pub fn content_length(&self) -> Option<u64> {
        self.header("content-length")
            .and_then(|v| v.trim().parse::<u64>().ok())
    }

    pub fn content_type(&self) -> Option<&str> {
        self.header("content-type")
    }
}

/// Consumer of a GET response body.
///
/// `begin` is called once with the final status before any body bytes; `write`
/// receives the body in order. Returning an error from either stops the
/// transfer, and the transport reports `TransportError::Aborted`.
pub trait BodySink {
    fn begin(&mut self, status: u32) -> io::Result<()>;

    fn write(&mut self, chunk: &[u8]) -> io::Result<()>;

    /// Polled while waiting for data; `false` aborts the request.
    fn keep_going(&self) -> bool {
        true
    }
}

/// HEAD and GET, as used by the download engine.
pub trait HttpTransport: Send + Sync {
    fn head(&self, url: &str) -> Result<HeadResponse, TransportError>;

    /// GET `url`, restricted to `range` when given, streaming the body into `sink`.
    fn get(
        &self,
        url: &str,
        range: Option<Segment>,
        sink: &mut dyn BodySink,
    ) -> Result<(), TransportError>;
}
