// ============================================================================
// Static Compressor
// ============================================================================
//
// Whole-file decision: the level is the RMS of the peak-normalized signal.
// Above the threshold the buffer is attenuated by a constant 1/ratio,
// otherwise it is returned unchanged. There is no attack, release or knee.

use super::gain::scale;
use crate::buffer::{AudioBuffer, gain_to_db};
use crate::errors::{ProcessingError, ProcessingResult, require_finite};

const LEVEL_FLOOR: f64 = 1e-12;

/// RMS level of the peak-normalized signal, in dB
///
/// A full-scale sine measures about -3 dB regardless of its absolute level;
/// silence measures -240 dB.
pub fn measure_level_db(buffer: &AudioBuffer) -> f64 {
    let peak = buffer.peak();
    let samples = buffer.samples();
    if peak == 0.0 || samples.is_empty() {
        return gain_to_db(LEVEL_FLOOR);
    }
    let mean_square = samples
        .iter()
        .map(|&x| {
            let n = x / peak;
            n * n
        })
        .sum::<f64>()
        / samples.len() as f64;
    gain_to_db(mean_square.sqrt() + LEVEL_FLOOR)
}

/// Attenuate by `1/ratio` when the measured level exceeds `threshold_db`
///
/// # Arguments
/// * `buffer` - Source audio
/// * `threshold_db` - Level above which compression applies
/// * `ratio` - Compression ratio, at least 1.0
pub fn apply_compressor(
    buffer: &AudioBuffer,
    threshold_db: f64,
    ratio: f64,
) -> ProcessingResult<AudioBuffer> {
    let threshold_db = require_finite("threshold_db", threshold_db)?;
    let ratio = require_finite("ratio", ratio)?;
    if ratio < 1.0 {
        return Err(ProcessingError::parameter(
            "ratio",
            format!("must be at least 1.0, got {}", ratio),
        ));
    }

    let level = measure_level_db(buffer);
    if level > threshold_db {
        log::debug!(
            "compressor: level {:.2} dB > threshold {:.2} dB, gain 1/{}",
            level,
            threshold_db,
            ratio
        );
        Ok(scale(buffer, 1.0 / ratio))
    } else {
        Ok(buffer.clone())
    }
}
