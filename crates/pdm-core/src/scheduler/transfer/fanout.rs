//! Ranged fan-out for downloads with a known size.

use rayon::prelude::*;
use std::sync::atomic::Ordering;

use super::sink::ChunkWriter;
use super::Unit;
use crate::retry::{run_with_retry, UnitError};
use crate::segmenter::Segment;

/// Fetches every range the tracker reports missing. Ranges recorded by an
/// earlier run are never requested again.
pub(super) fn fetch_missing(unit: &Unit<'_>) -> Result<(), UnitError> {
    let missing = unit.tracker.missing_parts();
    tracing::debug!(
        url = unit.download.url(),
        ranges = missing.len(),
        bytes = missing.iter().map(Segment::len).sum::<u64>(),
        "fetching missing ranges"
    );
    missing
        .par_iter()
        .map(|segment| fetch(unit, *segment))
        .reduce(|| Ok(()), combine)
}

/// Halves `segment` until it is no longer than the minimum part size and
/// fetches the leaves in parallel; returns once both halves have joined.
fn fetch(unit: &Unit<'_>, segment: Segment) -> Result<(), UnitError> {
    if unit.stopped() {
        return Err(UnitError::Cancelled);
    }
    match segment.split_half(unit.ctx.shared.config.min_part_size) {
        Some((left, right)) => {
            let (a, b) = rayon::join(|| fetch(unit, left), || fetch(unit, right));
            combine(a, b)
        }
        None => fetch_leaf(unit, segment),
    }
}

/// Keeps the first real failure; cancellation only wins when nothing else failed.
fn combine(a: Result<(), UnitError>, b: Result<(), UnitError>) -> Result<(), UnitError> {
    match (a, b) {
        (Ok(()), Ok(())) => Ok(()),
        (Err(e), Ok(())) | (Ok(()), Err(e)) => Err(e),
        (Err(UnitError::Cancelled), Err(e)) | (Err(e), Err(_)) => Err(e),
    }
}

/// One ranged GET unit. A retry asks only for `[cursor, end)`.
fn fetch_leaf(unit: &Unit<'_>, segment: Segment) -> Result<(), UnitError> {
    tracing::debug!(url = unit.download.url(), range = %segment, "leaf started");
    let whole_file = unit.tracker.size().map(|size| Segment::new(0, size));
    let mut cursor = segment.start;

    let result = run_with_retry(&unit.ctx.shared.retry, &unit.ctx.abort, || {
        if unit.stopped() {
            return Err(UnitError::Cancelled);
        }
        // Everything up to `end` is already recorded; an empty Range cannot be sent.
        if cursor >= segment.end {
            return Ok(());
        }
        let pending = Segment::new(cursor, segment.end);
        let mut writer = ChunkWriter::ranged(unit, pending, Some(pending) == whole_file);
        let outcome = unit
            .ctx
            .shared
            .transport
            .get(unit.download.url(), Some(pending), &mut writer);
        cursor = writer.position();
        writer.finish(outcome)
    });

    match &result {
        Ok(()) => {}
        Err(UnitError::Cancelled) => {
            tracing::debug!(url = unit.download.url(), range = %segment, cursor, "leaf cancelled");
        }
        Err(e) => {
            unit.failed.store(true, Ordering::Release);
            tracing::warn!(url = unit.download.url(), range = %segment, error = %e, "leaf gave up");
        }
    }
    result
}
