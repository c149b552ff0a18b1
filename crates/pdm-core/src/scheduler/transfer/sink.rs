//! Body sink that writes one unit's response into the destination file.

use std::io;

use super::Unit;
use crate::retry::UnitError;
use crate::segmenter::Segment;
use crate::transport::{BodySink, TransportError};

enum Accept {
    /// 206, or 200 when the request covers the whole file.
    Partial { whole_file: bool },
    /// Any 2xx.
    Success,
}

/// Writes chunks at their absolute offset, records them in the tracker and
/// raises progress events. Stops the request on cancellation, on bytes past
/// the unit's range and on write failures, remembering why.
pub(super) struct ChunkWriter<'u, 'a> {
    unit: &'u Unit<'a>,
    start: u64,
    position: u64,
    end: Option<u64>,
    accept: Accept,
    halted: Option<UnitError>,
}

impl<'u, 'a> ChunkWriter<'u, 'a> {
    pub(super) fn ranged(unit: &'u Unit<'a>, range: Segment, whole_file: bool) -> Self {
        Self {
            unit,
            start: range.start,
            position: range.start,
            end: Some(range.end),
            accept: Accept::Partial { whole_file },
            halted: None,
        }
    }

    pub(super) fn stream(unit: &'u Unit<'a>) -> Self {
        Self {
            unit,
            start: 0,
            position: 0,
            end: None,
            accept: Accept::Success,
            halted: None,
        }
    }

    /// Offset just past the last byte written.
    pub(super) fn position(&self) -> u64 {
        self.position
    }

    /// Turns the transport outcome into the unit's result.
    pub(super) fn finish(self, outcome: Result<(), TransportError>) -> Result<(), UnitError> {
        if let Some(reason) = self.halted {
            return Err(reason);
        }
        if let Err(e) = outcome {
            if self.unit.stopped() {
                return Err(UnitError::Cancelled);
            }
            if self.end == Some(self.position) {
                tracing::debug!(
                    url = self.unit.download.url(),
                    error = %e,
                    "transport failed after the last byte, range complete"
                );
                return Ok(());
            }
            return Err(e.into());
        }
        match self.end {
            Some(end) if self.position < end => Err(UnitError::PartialTransfer {
                expected: end - self.start,
                received: self.position - self.start,
            }),
            _ => Ok(()),
        }
    }

    fn halt(&mut self, reason: UnitError) -> io::Result<()> {
        let err = io::Error::other(reason.to_string());
        self.halted = Some(reason);
        Err(err)
    }
}

impl BodySink for ChunkWriter<'_, '_> {
    fn begin(&mut self, status: u32) -> io::Result<()> {
        let accepted = match self.accept {
            Accept::Partial { whole_file } => status == 206 || (whole_file && status == 200),
            Accept::Success => (200..300).contains(&status),
        };
        if accepted {
            Ok(())
        } else {
            self.halt(UnitError::Http(status))
        }
    }

    fn write(&mut self, chunk: &[u8]) -> io::Result<()> {
        if self.unit.stopped() {
            return self.halt(UnitError::Cancelled);
        }
        let len = chunk.len() as u64;
        if let Some(end) = self.end {
            if self.position + len > end {
                return self.halt(UnitError::Overrun {
                    expected: end - self.start,
                });
            }
        }
        if let Err(e) = self.unit.storage.write_at(self.position, chunk) {
            return self.halt(UnitError::Storage(e));
        }
        self.unit.tracker.add_progress(self.position, len);
        self.position += len;
        self.unit.ctx.shared.events.progress_changed(self.unit.download);
        Ok(())
    }

    fn keep_going(&self) -> bool {
        !self.unit.stopped()
    }
}
