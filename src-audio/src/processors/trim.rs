// ============================================================================
// Trim
// ============================================================================
//
// Cuts a time range out of a buffer. Offsets follow slice rules: negative
// values count back from the end, everything is clamped to the buffer, and
// an end at or before the start yields an empty buffer.

use crate::buffer::AudioBuffer;
use crate::errors::{ProcessingResult, require_finite};

/// Frame index for a millisecond offset, clamped to the buffer
fn resolve_offset(buffer: &AudioBuffer, ms: f64) -> usize {
    let total = buffer.frame_count();
    let frames = buffer.ms_to_frames(ms.abs()).min(total);
    if ms < 0.0 { total - frames } else { frames }
}

/// Keep `[start_ms, end_ms)` of `buffer`
///
/// # Arguments
/// * `buffer` - Source audio
/// * `start_ms` - First kept instant (negative: from the end)
/// * `end_ms` - End of the kept range, exclusive (negative: from the end)
pub fn trim(buffer: &AudioBuffer, start_ms: f64, end_ms: f64) -> ProcessingResult<AudioBuffer> {
    let start_ms = require_finite("start_ms", start_ms)?;
    let end_ms = require_finite("end_ms", end_ms)?;

    let start = resolve_offset(buffer, start_ms);
    let end = resolve_offset(buffer, end_ms).max(start);
    let channels = buffer.channels() as usize;
    log::debug!("trim: frames {}..{} of {}", start, end, buffer.frame_count());
    buffer.with_samples(buffer.samples()[start * channels..end * channels].to_vec())
}
