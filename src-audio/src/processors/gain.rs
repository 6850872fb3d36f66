// ============================================================================
// Gain
// ============================================================================

use crate::buffer::{AudioBuffer, db_to_gain};
use crate::errors::{ProcessingError, ProcessingResult, require_finite};

/// Change the level of every sample by `db_change` dB
///
/// Samples that would leave the format's range saturate at its limits.
///
/// # Arguments
/// * `buffer` - Source audio
/// * `db_change` - Gain in dB (0.0 = unity, negative = attenuation)
pub fn apply_gain(buffer: &AudioBuffer, db_change: f64) -> ProcessingResult<AudioBuffer> {
    let db_change = require_finite("db_change", db_change)?;
    let factor = db_to_gain(db_change);
    if !factor.is_finite() {
        return Err(ProcessingError::parameter(
            "db_change",
            format!("{} dB overflows the linear gain", db_change),
        ));
    }
    Ok(scale(buffer, factor))
}

/// Multiply every sample by a linear factor
pub(crate) fn scale(buffer: &AudioBuffer, factor: f64) -> AudioBuffer {
    if factor == 1.0 {
        return buffer.clone();
    }
    buffer.map_samples(|x| x * factor)
}
