//! Segment type and halving.

use std::fmt;

/// Leaves are never split below this many bytes unless configured otherwise (10 MiB).
pub const DEFAULT_MIN_PART_SIZE: u64 = 10 * 1024 * 1024;

/// A byte range [start, end) (half-open).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Segment {
    /// Start offset (inclusive).
    pub start: u64,
    /// End offset (exclusive).
    pub end: u64,
}

impl Segment {
    pub fn new(start: u64, end: u64) -> Self {
        Self { start, end }
    }

    /// Length of this segment in bytes.
    pub fn len(&self) -> u64 {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }

    /// HTTP Range header value (inclusive end): `bytes=start-(end-1)`.
    /// `None` for an empty segment, which has no valid Range form.
    pub fn range_header_value(&self) -> Option<String> {
        if self.is_empty() {
            None
        } else {
            Some(format!("bytes={}-{}", self.start, self.end - 1))
        }
    }

    /// Cuts the segment in half when it is longer than `min_part_size`.
    ///
    /// Returns `None` for a leaf. A threshold of 0 behaves like 1 so the
    /// recursion always bottoms out.
    pub fn split_half(&self, min_part_size: u64) -> Option<(Segment, Segment)> {
        if self.len() <= min_part_size.max(1) {
            return None;
        }
        let mid = self.start + self.len() / 2;
        Some((Segment::new(self.start, mid), Segment::new(mid, self.end)))
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.start, self.end)
    }
}
