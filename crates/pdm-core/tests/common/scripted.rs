//! In-memory `HttpTransport` with fault injection, a hold gate and a request log.

use std::io;
use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use std::time::Duration;

use parking_lot::Mutex;
use pdm_core::segmenter::Segment;
use pdm_core::transport::{BodySink, HeadResponse, HttpTransport, TransportError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    Head,
    Get(Option<Segment>),
}

pub struct ScriptedTransport {
    body: Vec<u8>,
    head_status: AtomicU32,
    /// Fail the HEAD with a connection error.
    pub head_refused: bool,
    pub send_length: bool,
    pub content_type: Option<String>,
    pub chunk_size: usize,
    /// Answer ranged GETs with 200 and the full body.
    pub ignore_ranges: bool,
    /// Number of GETs that die with a reset after `fault_after_chunks` chunks.
    faults: AtomicU32,
    pub fault_after_chunks: usize,
    /// GETs stall after this many chunks until the gate opens or the sink gives up.
    pub hold_after_chunks: Option<usize>,
    gate_open: Mutex<bool>,
    held: AtomicUsize,
    log: Mutex<Vec<Request>>,
}

impl ScriptedTransport {
    pub fn new(body: Vec<u8>) -> Self {
        Self {
            body,
            head_status: AtomicU32::new(200),
            head_refused: false,
            send_length: true,
            content_type: None,
            chunk_size: 1024,
            ignore_ranges: false,
            faults: AtomicU32::new(0),
            fault_after_chunks: 0,
            hold_after_chunks: None,
            gate_open: Mutex::new(false),
            held: AtomicUsize::new(0),
            log: Mutex::new(Vec::new()),
        }
    }

    pub fn set_head_status(&self, status: u32) {
        self.head_status.store(status, Ordering::SeqCst);
    }

    pub fn inject_faults(&self, count: u32) {
        self.faults.store(count, Ordering::SeqCst);
    }

    pub fn open_gate(&self) {
        *self.gate_open.lock() = true;
    }

    /// GETs currently stalled at the gate.
    pub fn held(&self) -> usize {
        self.held.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<Request> {
        self.log.lock().clone()
    }

    pub fn gets(&self) -> Vec<Option<Segment>> {
        self.requests()
            .into_iter()
            .filter_map(|r| match r {
                Request::Get(range) => Some(range),
                Request::Head => None,
            })
            .collect()
    }

    fn take_fault(&self) -> bool {
        self.faults
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }

    /// Waits at the gate. `false` when the sink gave up first.
    fn hold(&self, sink: &dyn BodySink) -> bool {
        self.held.fetch_add(1, Ordering::SeqCst);
        let passed = loop {
            if !sink.keep_going() {
                break false;
            }
            if *self.gate_open.lock() {
                break true;
            }
            std::thread::sleep(Duration::from_millis(2));
        };
        self.held.fetch_sub(1, Ordering::SeqCst);
        passed
    }
}

impl HttpTransport for ScriptedTransport {
    fn head(&self, _url: &str) -> Result<HeadResponse, TransportError> {
        self.log.lock().push(Request::Head);
        if self.head_refused {
            return Err(TransportError::Connection("connection refused".into()));
        }
        let mut headers = Vec::new();
        if self.send_length {
            headers.push(("Content-Length".to_string(), self.body.len().to_string()));
        }
        if let Some(ct) = &self.content_type {
            headers.push(("Content-Type".to_string(), ct.clone()));
        }
        Ok(HeadResponse {
            status: self.head_status.load(Ordering::SeqCst),
            headers,
        })
    }

    fn get(
        &self,
        _url: &str,
        range: Option<Segment>,
        sink: &mut dyn BodySink,
    ) -> Result<(), TransportError> {
        self.log.lock().push(Request::Get(range));
        // An empty segment has no Range form; like libcurl, that is a plain GET.
        let (status, bytes) = match range {
            Some(r) if !self.ignore_ranges && !r.is_empty() => {
                let end = (r.end as usize).min(self.body.len());
                let start = (r.start as usize).min(end);
                (206, &self.body[start..end])
            }
            _ => (200, &self.body[..]),
        };
        sink.begin(status).map_err(TransportError::Aborted)?;

        let fault = self.take_fault();
        for (i, chunk) in bytes.chunks(self.chunk_size.max(1)).enumerate() {
            if fault && i == self.fault_after_chunks {
                return Err(TransportError::Io(io::Error::new(
                    io::ErrorKind::ConnectionReset,
                    "connection reset by peer",
                )));
            }
            if self.hold_after_chunks == Some(i) && !self.hold(sink) {
                return Err(TransportError::Aborted(io::Error::new(
                    io::ErrorKind::Interrupted,
                    "transfer cancelled",
                )));
            }
            sink.write(chunk).map_err(TransportError::Aborted)?;
        }
        if fault && bytes.chunks(self.chunk_size.max(1)).len() <= self.fault_after_chunks {
            return Err(TransportError::Io(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "body cut short",
            )));
        }
        Ok(())
    }
}
