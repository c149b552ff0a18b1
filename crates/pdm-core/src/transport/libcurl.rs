//! libcurl-backed transport (one easy handle per request).

use std::cell::{Cell, RefCell};
use std::io;
use std::str;
use std::time::Duration;

use super::parse::{parse_header_lines, parse_status_line};
use super::{BodySink, HeadResponse, HttpTransport, TransportError};
use crate::segmenter::Segment;

/// Per-request libcurl settings.
#[derive(Debug, Clone)]
pub struct CurlOptions {
    pub connect_timeout: Duration,
    /// Receive buffer size, i.e. the largest chunk handed to the body sink.
    pub buffer_size: Option<usize>,
    pub user_agent: Option<String>,
    /// Abort if throughput stays below `low_speed_limit` bytes/s for `low_speed_time`.
    pub low_speed_limit: u32,
    pub low_speed_time: Duration,
}

impl Default for CurlOptions {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(30),
            buffer_size: None,
            user_agent: None,
            low_speed_limit: 1024,
            low_speed_time: Duration::from_secs(60),
        }
    }
}

/// `HttpTransport` over libcurl's easy interface. Blocking; call from worker threads.
#[derive(Debug, Clone, Default)]
pub struct CurlTransport {
    options: CurlOptions,
}

impl CurlTransport {
    pub fn new(options: CurlOptions) -> Self {
        Self { options }
    }

    fn easy(&self, url: &str) -> Result<curl::easy::Easy, TransportError> {
        let mut easy = curl::easy::Easy::new();
        easy.url(url).map_err(map_curl_error)?;
        easy.follow_location(true).map_err(map_curl_error)?;
        easy.max_redirections(10).map_err(map_curl_error)?;
        easy.connect_timeout(self.options.connect_timeout)
            .map_err(map_curl_error)?;
        easy.low_speed_limit(self.options.low_speed_limit)
            .map_err(map_curl_error)?;
        easy.low_speed_time(self.options.low_speed_time)
            .map_err(map_curl_error)?;
        if let Some(agent) = &self.options.user_agent {
            easy.useragent(agent).map_err(map_curl_error)?;
        }
        if let Some(size) = self.options.buffer_size {
            easy.buffer_size(size).map_err(map_curl_error)?;
        }
        Ok(easy)
    }
}

impl HttpTransport for CurlTransport {
    fn head(&self, url: &str) -> Result<HeadResponse, TransportError> {
        let mut lines: Vec<String> = Vec::new();
        let mut easy = self.easy(url)?;
        easy.nobody(true).map_err(map_curl_error)?;
        easy.timeout(Duration::from_secs(30)).map_err(map_curl_error)?;

        {
            let mut transfer = easy.transfer();
            transfer
                .header_function(|data| {
                    if let Ok(s) = str::from_utf8(data) {
                        lines.push(s.trim_end().to_string());
                    }
                    true
                })
                .map_err(map_curl_error)?;
            transfer.perform().map_err(map_curl_error)?;
        }

        let status = easy.response_code().map_err(map_curl_error)?;
        let (_, headers) = parse_header_lines(&lines);
        Ok(HeadResponse { status, headers })
    }

    fn get(
        &self,
        url: &str,
        range: Option<Segment>,
        sink: &mut dyn BodySink,
    ) -> Result<(), TransportError> {
        let mut easy = self.easy(url)?;
        if let Some(value) = range.and_then(|r| r.range_header_value()) {
            let mut list = curl::easy::List::new();
            list.append(&format!("Range: {}", value))
                .map_err(map_curl_error)?;
            easy.http_headers(list).map_err(map_curl_error)?;
        }
        easy.progress(true).map_err(map_curl_error)?;

        let status = Cell::new(0u32);
        let begun = Cell::new(false);
        let refused: RefCell<Option<io::Error>> = RefCell::new(None);
        let sink = RefCell::new(sink);

        let performed = {
            let mut transfer = easy.transfer();
            transfer
                .header_function(|data| {
                    if let Some(code) = str::from_utf8(data).ok().and_then(parse_status_line) {
                        status.set(code);
                    }
                    true
                })
                .map_err(map_curl_error)?;
            transfer
                .write_function(|data| {
                    let mut sink = sink.borrow_mut();
                    if !begun.get() {
                        begun.set(true);
                        if let Err(e) = sink.begin(status.get()) {
                            *refused.borrow_mut() = Some(e);
                            return Ok(0);
                        }
                    }
                    match sink.write(data) {
                        Ok(()) => Ok(data.len()),
                        Err(e) => {
                            // Returning a short count makes libcurl abort the transfer.
                            *refused.borrow_mut() = Some(e);
                            Ok(0)
                        }
                    }
                })
                .map_err(map_curl_error)?;
            transfer
                .progress_function(|_, _, _, _| sink.borrow().keep_going())
                .map_err(map_curl_error)?;
            transfer.perform()
        };

        if let Some(e) = refused.into_inner() {
            return Err(TransportError::Aborted(e));
        }
        if let Err(e) = performed {
            if e.is_aborted_by_callback() {
                return Err(TransportError::Aborted(io::Error::new(
                    io::ErrorKind::Interrupted,
                    "transfer cancelled",
                )));
            }
            return Err(map_curl_error(e));
        }
        if !begun.get() {
            // Empty body: the sink still gets to judge the status.
            let code = easy.response_code().map_err(map_curl_error)?;
            sink.into_inner()
                .begin(code)
                .map_err(TransportError::Aborted)?;
        }
        Ok(())
    }
}

/// Map a libcurl error onto the transport error kinds used for retry decisions.
fn map_curl_error(e: curl::Error) -> TransportError {
    if e.is_operation_timedout() {
        return TransportError::Timeout(e.to_string());
    }
    if e.is_couldnt_connect()
        || e.is_couldnt_resolve_host()
        || e.is_couldnt_resolve_proxy()
        || e.is_read_error()
        || e.is_recv_error()
        || e.is_send_error()
        || e.is_got_nothing()
        || e.is_partial_file()
    {
        return TransportError::Connection(e.to_string());
    }
    TransportError::Other(e.to_string())
}
