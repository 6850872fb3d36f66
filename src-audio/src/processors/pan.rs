// ============================================================================
// Constant-Power Pan
// ============================================================================

use crate::buffer::AudioBuffer;
use crate::errors::{ProcessingError, ProcessingResult, require_finite};
use std::f64::consts::{FRAC_PI_4, SQRT_2};

/// Left/right gains for a pan position in `[-1, 1]`
///
/// Both gains are 1.0 at center; hard left gives `(sqrt(2), 0)`.
pub fn pan_gains(position: f64) -> (f64, f64) {
    let theta = (position + 1.0) * FRAC_PI_4;
    (SQRT_2 * theta.cos(), SQRT_2 * theta.sin())
}

/// Pan a stereo buffer
///
/// Non-stereo buffers are returned unchanged.
///
/// # Arguments
/// * `buffer` - Source audio
/// * `pan_percent` - Position from -100 (hard left) to 100 (hard right)
pub fn apply_pan(buffer: &AudioBuffer, pan_percent: f64) -> ProcessingResult<AudioBuffer> {
    let pan_percent = require_finite("pan_percent", pan_percent)?;
    if !(-100.0..=100.0).contains(&pan_percent) {
        return Err(ProcessingError::parameter(
            "pan_percent",
            format!("must be within -100..=100, got {}", pan_percent),
        ));
    }
    if buffer.channels() != 2 {
        log::debug!(
            "pan skipped: {} channel(s), stereo required",
            buffer.channels()
        );
        return Ok(buffer.clone());
    }
    if pan_percent == 0.0 {
        return Ok(buffer.clone());
    }

    let (left, right) = pan_gains(pan_percent / 100.0);
    let format = buffer.format();
    let mut samples = buffer.samples().to_vec();
    for frame in samples.chunks_exact_mut(2) {
        frame[0] = format.quantize(frame[0] * left);
        frame[1] = format.quantize(frame[1] * right);
    }
    buffer.with_samples(samples)
}
