// ============================================================================
// Noise Reduction
// ============================================================================

use crate::buffer::AudioBuffer;
use crate::capabilities::{Capabilities, NoiseReducer};
use crate::errors::{ProcessingError, ProcessingResult};
use rayon::prelude::*;

/// Denoise every channel with the installed noise reducer
///
/// Without a noise reducer this logs a warning and returns an unchanged
/// copy. Use [`reduce_with`] together with
/// [`Capabilities::require_noise_reducer`] when a missing engine must fail.
pub fn apply_denoise(buffer: &AudioBuffer, caps: &Capabilities) -> ProcessingResult<AudioBuffer> {
    match caps.noise_reducer() {
        Some(reducer) => reduce_with(buffer, reducer),
        None => {
            log::warn!("noise reduction unavailable, returning input unchanged");
            Ok(buffer.clone())
        }
    }
}

/// Denoise every channel with `reducer`, channels in parallel
pub fn reduce_with(buffer: &AudioBuffer, reducer: &dyn NoiseReducer) -> ProcessingResult<AudioBuffer> {
    if buffer.is_empty() {
        return Ok(buffer.clone());
    }
    let sample_rate = buffer.sample_rate();
    let reduced = buffer
        .split_channels()
        .par_iter()
        .map(|channel| {
            let out = reducer.reduce_noise(channel, sample_rate)?;
            if out.len() != channel.len() {
                return Err(ProcessingError::CapabilityFailed(format!(
                    "{} returned {} samples for a {} sample channel",
                    reducer.name(),
                    out.len(),
                    channel.len()
                )));
            }
            Ok(out)
        })
        .collect::<ProcessingResult<Vec<Vec<f64>>>>()?;
    log::debug!(
        "denoised {} channel(s) with {}",
        reduced.len(),
        reducer.name()
    );
    AudioBuffer::from_channels(sample_rate, buffer.format(), &reduced)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::SampleFormat;
    use std::sync::Arc;

    struct Truncating;

    impl NoiseReducer for Truncating {
        fn name(&self) -> &str {
            "truncating"
        }

        fn reduce_noise(&self, signal: &[f64], _sample_rate: u32) -> ProcessingResult<Vec<f64>> {
            Ok(signal[..signal.len() / 2].to_vec())
        }
    }

    struct Zeroing;

    impl NoiseReducer for Zeroing {
        fn name(&self) -> &str {
            "zeroing"
        }

        fn reduce_noise(&self, signal: &[f64], _sample_rate: u32) -> ProcessingResult<Vec<f64>> {
            Ok(vec![0.0; signal.len()])
        }
    }

    fn stereo() -> AudioBuffer {
        AudioBuffer::new(8000, 2, SampleFormat::I16, vec![10.0, -10.0, 20.0, -20.0]).unwrap()
    }

    #[test]
    fn test_unavailable_is_fail_soft() {
        let buf = stereo();
        assert_eq!(apply_denoise(&buf, &Capabilities::none()).unwrap(), buf);
    }

    #[test]
    fn test_reducer_output_is_used() {
        let caps = Capabilities::none().with_noise_reducer(Arc::new(Zeroing));
        let out = apply_denoise(&stereo(), &caps).unwrap();
        assert_eq!(out.samples(), &[0.0; 4]);
        assert_eq!(out.channels(), 2);
    }

    #[test]
    fn test_length_mismatch_is_capability_failure() {
        let caps = Capabilities::none().with_noise_reducer(Arc::new(Truncating));
        assert!(matches!(
            apply_denoise(&stereo(), &caps),
            Err(ProcessingError::CapabilityFailed(_))
        ));
    }
}
