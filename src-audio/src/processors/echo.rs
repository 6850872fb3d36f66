// ============================================================================
// Echo Effects: Delay and Reverb
// ============================================================================
//
// Both effects overlay attenuated, time-shifted copies of the source on top
// of it. The output grows by the largest shift so no tail is cut, and the
// sum saturates at the format limits.

use crate::buffer::{AudioBuffer, db_to_gain};
use crate::errors::{ProcessingResult, require_duration_ms};

/// Attenuation added per delay repeat
pub const DELAY_STEP_DB: f64 = -6.0;

/// Reverb taps as (offset ms, level dB)
pub const REVERB_TAPS: [(f64, f64); 3] = [(50.0, -3.0), (120.0, -6.0), (200.0, -9.0)];

/// A delayed copy of the source
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tap {
    /// Offset in frames
    pub offset: usize,
    /// Linear gain
    pub gain: f64,
}

/// Mix `taps` onto `buffer`, extending it to fit the longest offset
pub fn overlay_taps(buffer: &AudioBuffer, taps: &[Tap]) -> ProcessingResult<AudioBuffer> {
    let channels = buffer.channels() as usize;
    let source = buffer.samples();
    let tail = taps.iter().map(|t| t.offset).max().unwrap_or(0);

    let mut mixed = Vec::with_capacity(source.len() + tail * channels);
    mixed.extend_from_slice(source);
    mixed.resize(source.len() + tail * channels, 0.0);

    for tap in taps {
        let start = tap.offset * channels;
        for (dst, &src) in mixed[start..start + source.len()].iter_mut().zip(source) {
            *dst += src * tap.gain;
        }
    }
    buffer.with_samples(mixed)
}

/// Repeating echo
///
/// Copy `i` (1-based) starts `i * delay_ms` after the source and is
/// attenuated by `6 * i` dB.
///
/// # Arguments
/// * `buffer` - Source audio
/// * `delay_ms` - Spacing between repeats in milliseconds
/// * `repeats` - Number of echoes (0 returns the source unchanged)
pub fn apply_delay(
    buffer: &AudioBuffer,
    delay_ms: f64,
    repeats: u32,
) -> ProcessingResult<AudioBuffer> {
    let delay_ms = require_duration_ms("delay_ms", delay_ms)?;
    if repeats == 0 {
        return Ok(buffer.clone());
    }
    let taps: Vec<Tap> = (1..=repeats)
        .map(|i| Tap {
            offset: buffer.ms_to_frames(delay_ms * i as f64),
            gain: db_to_gain(DELAY_STEP_DB * i as f64),
        })
        .collect();
    overlay_taps(buffer, &taps)
}

/// Small-room reverb from three fixed reflections
pub fn apply_reverb_simple(buffer: &AudioBuffer) -> ProcessingResult<AudioBuffer> {
    let taps: Vec<Tap> = REVERB_TAPS
        .iter()
        .map(|&(ms, db)| Tap {
            offset: buffer.ms_to_frames(ms),
            gain: db_to_gain(db),
        })
        .collect();
    overlay_taps(buffer, &taps)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::SampleFormat;

    fn impulse(frames: usize) -> AudioBuffer {
        let mut samples = vec![0.0; frames];
        samples[0] = 10000.0;
        AudioBuffer::new(1000, 1, SampleFormat::I16, samples).unwrap()
    }

    #[test]
    fn test_delay_places_attenuated_copies() {
        let out = apply_delay(&impulse(10), 100.0, 2).unwrap();
        assert_eq!(out.frame_count(), 210);
        let s = out.samples();
        assert_eq!(s[0], 10000.0);
        assert_eq!(s[100], (10000.0 * db_to_gain(-6.0)).round());
        assert_eq!(s[200], (10000.0 * db_to_gain(-12.0)).round());
        assert_eq!(s[50], 0.0);
    }

    #[test]
    fn test_zero_repeats_identity() {
        let buf = impulse(8);
        assert_eq!(apply_delay(&buf, 250.0, 0).unwrap(), buf);
    }

    #[test]
    fn test_delay_rejects_negative() {
        assert!(apply_delay(&impulse(8), -1.0, 2).is_err());
    }

    #[test]
    fn test_reverb_extends_by_longest_tap() {
        let out = apply_reverb_simple(&impulse(20)).unwrap();
        assert_eq!(out.frame_count(), 220);
        let s = out.samples();
        assert_eq!(s[50], (10000.0 * db_to_gain(-3.0)).round());
        assert_eq!(s[120], (10000.0 * db_to_gain(-6.0)).round());
        assert_eq!(s[200], (10000.0 * db_to_gain(-9.0)).round());
    }

    #[test]
    fn test_overlay_saturates() {
        let buf = AudioBuffer::new(1000, 1, SampleFormat::I16, vec![30000.0; 4]).unwrap();
        let out = overlay_taps(&buf, &[Tap { offset: 1, gain: 1.0 }]).unwrap();
        assert_eq!(out.samples(), &[30000.0, 32767.0, 32767.0, 32767.0, 30000.0]);
    }

    #[test]
    fn test_stereo_offsets_whole_frames() {
        let buf = AudioBuffer::new(1000, 2, SampleFormat::I16, vec![100.0, -100.0]).unwrap();
        let out = overlay_taps(&buf, &[Tap { offset: 2, gain: 0.5 }]).unwrap();
        assert_eq!(out.samples(), &[100.0, -100.0, 0.0, 0.0, 50.0, -50.0]);
    }
}
