// ============================================================================
// Fade In / Fade Out
// ============================================================================
//
// Linear ramps. Frame k of an n-frame fade-in is scaled by k/n (the first
// frame is silent); frame j of an m-frame fade-out by (m-1-j)/m (the last
// frame is silent). When both requested ramps together exceed the buffer
// they are rescaled to fill it, keeping their ratio, so they meet instead of
// overlapping.

use crate::buffer::AudioBuffer;
use crate::errors::{ProcessingResult, require_duration_ms};

/// Ramp lengths in frames, fitted into the buffer
fn fade_lengths(total: usize, fade_in: usize, fade_out: usize) -> (usize, usize) {
    let requested = fade_in.saturating_add(fade_out);
    if requested <= total {
        return (fade_in, fade_out);
    }
    let scaled_in = (total as f64 * fade_in as f64 / requested as f64).round() as usize;
    let scaled_in = scaled_in.min(total);
    (scaled_in, total - scaled_in)
}

/// Apply a fade-in and a fade-out
///
/// # Arguments
/// * `buffer` - Source audio
/// * `fade_in_ms` - Fade-in length in milliseconds (0 disables)
/// * `fade_out_ms` - Fade-out length in milliseconds (0 disables)
pub fn apply_fade(
    buffer: &AudioBuffer,
    fade_in_ms: f64,
    fade_out_ms: f64,
) -> ProcessingResult<AudioBuffer> {
    let fade_in_ms = require_duration_ms("fade_in_ms", fade_in_ms)?;
    let fade_out_ms = require_duration_ms("fade_out_ms", fade_out_ms)?;

    let total = buffer.frame_count();
    let (fade_in, fade_out) = fade_lengths(
        total,
        buffer.ms_to_frames(fade_in_ms),
        buffer.ms_to_frames(fade_out_ms),
    );
    if fade_in == 0 && fade_out == 0 {
        return Ok(buffer.clone());
    }

    let channels = buffer.channels() as usize;
    let format = buffer.format();
    let mut samples = buffer.samples().to_vec();
    for (k, frame) in samples.chunks_exact_mut(channels).enumerate() {
        let mut gain = 1.0;
        if k < fade_in {
            gain *= k as f64 / fade_in as f64;
        }
        let from_end = total - 1 - k;
        if from_end < fade_out {
            gain *= from_end as f64 / fade_out as f64;
        }
        if gain != 1.0 {
            for sample in frame.iter_mut() {
                *sample = format.quantize(*sample * gain);
            }
        }
    }
    buffer.with_samples(samples)
}
