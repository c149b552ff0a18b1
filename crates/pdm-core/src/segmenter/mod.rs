//! Range math and recursive splitting.
//!
//! A download of known size is fetched as a tree of half-open byte ranges:
//! any range longer than the minimum part size is cut in half until every
//! leaf is small enough to become one ranged GET.

mod range;

pub use range::{Segment, DEFAULT_MIN_PART_SIZE};
