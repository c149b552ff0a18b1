//! Received-bytes bookkeeping for one download.
//!
//! `ProgressTracker` keeps the set of byte ranges that have been written as a
//! sorted list of disjoint, non-adjacent half-open segments. Every insert
//! merges into that shape, so completion and the list of missing ranges fall
//! out of a single scan.

use parking_lot::Mutex;

use crate::segmenter::Segment;

/// Disjoint-interval progress for one download.
///
/// All access goes through an internal lock, so leaf transfers of the same
/// download can record progress concurrently.
#[derive(Debug)]
pub struct ProgressTracker {
    size: Option<u64>,
    parts: Mutex<Vec<Segment>>,
}

impl ProgressTracker {
    /// New empty tracker. `None` means the server did not report a length.
    pub fn new(size: Option<u64>) -> Self {
        Self {
            size,
            parts: Mutex::new(Vec::new()),
        }
    }

    /// Total size in bytes, if known.
    pub fn size(&self) -> Option<u64> {
        self.size
    }

    /// Records `length` bytes written at `offset`.
    ///
    /// Overlapping, touching and contained ranges are absorbed into a single
    /// segment. With a known size the range is clamped to `[0, size)`; bytes
    /// past the end are dropped rather than counted.
    pub fn add_progress(&self, offset: u64, length: u64) {
        let mut start = offset;
        let mut end = offset.saturating_add(length);
        if let Some(size) = self.size {
            end = end.min(size);
        }
        if start >= end {
            return;
        }

        let mut parts = self.parts.lock();
        // First segment that ends at or after `start` may touch the candidate.
        let first = parts.partition_point(|p| p.end < start);
        let mut last = first;
        while last < parts.len() && parts[last].start <= end {
            start = start.min(parts[last].start);
            end = end.max(parts[last].end);
            last += 1;
        }
        parts.splice(first..last, std::iter::once(Segment::new(start, end)));
    }

    /// Sum of the lengths of all recorded segments.
    pub fn absolute_progress(&self) -> u64 {
        self.parts.lock().iter().map(Segment::len).sum()
    }

    /// Fraction of the declared size received; 0 when the size is unknown or zero.
    pub fn completion_ratio(&self) -> f64 {
        match self.size {
            Some(size) if size > 0 => self.absolute_progress() as f64 / size as f64,
            _ => 0.0,
        }
    }

    /// True when `[0, size)` is fully covered. Never true for an unknown size.
    pub fn is_complete(&self) -> bool {
        let Some(size) = self.size else {
            return false;
        };
        let parts = self.parts.lock();
        size == 0 || (parts.len() == 1 && parts[0] == Segment::new(0, size))
    }

    /// Snapshot of the recorded segments, sorted by start.
    pub fn parts(&self) -> Vec<Segment> {
        self.parts.lock().clone()
    }

    /// Sorted complement of the recorded segments.
    ///
    /// With an unknown size the tail after the last recorded byte is reported
    /// as `[end, u64::MAX)`, so the list is never empty for such a tracker.
    pub fn missing_parts(&self) -> Vec<Segment> {
        let parts = self.parts.lock();
        let limit = self.size.unwrap_or(u64::MAX);
        let mut missing = Vec::with_capacity(parts.len() + 1);
        let mut cursor = 0u64;
        for part in parts.iter() {
            if part.start > cursor {
                missing.push(Segment::new(cursor, part.start));
            }
            cursor = part.end;
        }
        if cursor < limit {
            missing.push(Segment::new(cursor, limit));
        }
        missing
    }
}
