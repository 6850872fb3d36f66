// ============================================================================
// Peak Normalization
// ============================================================================

use super::gain::scale;
use crate::buffer::AudioBuffer;
use crate::errors::ProcessingResult;

/// Scale so the absolute peak sits at the format's largest value
///
/// Silent buffers are returned unchanged. Applying it twice gives the same
/// result as applying it once.
pub fn normalize(buffer: &AudioBuffer) -> ProcessingResult<AudioBuffer> {
    let peak = buffer.peak();
    if peak == 0.0 {
        return Ok(buffer.clone());
    }
    let factor = buffer.format().max_value() / peak;
    log::debug!(
        "normalize: peak {:.1} -> {:.1} (x{:.4})",
        peak,
        buffer.format().max_value(),
        factor
    );
    Ok(scale(buffer, factor))
}
