//! Whole-stream transfer for downloads without a declared size.

use super::sink::ChunkWriter;
use super::Unit;
use crate::retry::{run_with_retry, UnitError};

/// GETs the whole body. Without a size there is nothing to resume against,
/// so every retry starts again at byte 0. The file is cut to the streamed
/// length afterwards.
pub(super) fn fetch_stream(unit: &Unit<'_>) -> Result<(), UnitError> {
    let mut written = 0u64;
    run_with_retry(&unit.ctx.shared.retry, &unit.ctx.abort, || {
        if unit.stopped() {
            return Err(UnitError::Cancelled);
        }
        let mut writer = ChunkWriter::stream(unit);
        let outcome = unit
            .ctx
            .shared
            .transport
            .get(unit.download.url(), None, &mut writer);
        written = writer.position();
        writer.finish(outcome)
    })?;
    tracing::debug!(url = unit.download.url(), bytes = written, "stream complete");
    unit.storage.set_len(written).map_err(UnitError::Storage)
}
