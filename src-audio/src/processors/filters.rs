// ============================================================================
// Band-Split Equalizers
// ============================================================================
//
// Low-pass and high-pass filtering, and equalizers that split the signal
// into bands, scale each band and mix the bands back together:
//
//     out = sum(band_filter(x) * 10^(gain/20))
//
// Every section is a second-order Butterworth biquad. A band that cannot be
// designed (cutoff outside (0, Nyquist)) is a parameter error.

use crate::buffer::{AudioBuffer, db_to_gain};
use crate::errors::{ProcessingError, ProcessingResult, require_finite};
use amax_iir::{BUTTERWORTH_Q, Biquad};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Upper edge of the low band of [`apply_3band_eq`]
pub const THREE_BAND_LOW_HZ: f64 = 200.0;

/// Lower edge of the high band of [`apply_3band_eq`]
pub const THREE_BAND_HIGH_HZ: f64 = 4000.0;

/// One band of [`apply_multiband_eq`]
///
/// ```
/// use amax_audio::processors::FilterBand;
///
/// let band: FilterBand = serde_json::from_str(r#"{"type": "band", "low": 200, "high": 2000, "gain": -2}"#).unwrap();
/// assert_eq!(band, FilterBand::Band { low: 200.0, high: 2000.0, gain: -2.0 });
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FilterBand {
    /// Everything below `freq`
    Lowpass {
        freq: f64,
        #[serde(default)]
        gain: f64,
    },
    /// Everything above `freq`
    Highpass {
        freq: f64,
        #[serde(default)]
        gain: f64,
    },
    /// Between `low` and `high`
    Band {
        low: f64,
        high: f64,
        #[serde(default)]
        gain: f64,
    },
}

impl FilterBand {
    /// Band gain in dB
    pub fn gain_db(&self) -> f64 {
        match *self {
            FilterBand::Lowpass { gain, .. }
            | FilterBand::Highpass { gain, .. }
            | FilterBand::Band { gain, .. } => gain,
        }
    }

    /// Filter cascade isolating this band
    fn stages(&self, srate: f64) -> ProcessingResult<Vec<Biquad>> {
        match *self {
            FilterBand::Lowpass { freq, .. } => Ok(vec![lowpass_stage(freq, srate)?]),
            FilterBand::Highpass { freq, .. } => Ok(vec![highpass_stage(freq, srate)?]),
            FilterBand::Band { low, high, .. } => {
                if low.is_nan() || high.is_nan() || low >= high {
                    return Err(ProcessingError::parameter(
                        "bands",
                        format!("band edges must satisfy low < high, got {}..{} Hz", low, high),
                    ));
                }
                Ok(vec![highpass_stage(low, srate)?, lowpass_stage(high, srate)?])
            }
        }
    }
}

fn lowpass_stage(freq: f64, srate: f64) -> ProcessingResult<Biquad> {
    Biquad::lowpass(freq, srate, BUTTERWORTH_Q)
        .map_err(|e| ProcessingError::parameter("cutoff_hz", e.to_string()))
}

fn highpass_stage(freq: f64, srate: f64) -> ProcessingResult<Biquad> {
    Biquad::highpass(freq, srate, BUTTERWORTH_Q)
        .map_err(|e| ProcessingError::parameter("cutoff_hz", e.to_string()))
}

fn cascade(signal: &[f64], stages: &[Biquad]) -> Vec<f64> {
    stages
        .iter()
        .fold(signal.to_vec(), |acc, stage| stage.filter(&acc))
}

fn filter_channels(buffer: &AudioBuffer, stages: &[Biquad]) -> ProcessingResult<AudioBuffer> {
    let channels: Vec<Vec<f64>> = buffer
        .split_channels()
        .par_iter()
        .map(|channel| cascade(channel, stages))
        .collect();
    AudioBuffer::from_channels(buffer.sample_rate(), buffer.format(), &channels)
}

/// Remove content above `cutoff_hz`
pub fn apply_lowpass(buffer: &AudioBuffer, cutoff_hz: f64) -> ProcessingResult<AudioBuffer> {
    let cutoff_hz = require_finite("cutoff_hz", cutoff_hz)?;
    let stage = lowpass_stage(cutoff_hz, buffer.sample_rate() as f64)?;
    if buffer.is_empty() {
        return Ok(buffer.clone());
    }
    log::debug!("{}, {:.2} dB at cutoff", stage, stage.log_result(cutoff_hz));
    filter_channels(buffer, &[stage])
}

/// Remove content below `cutoff_hz`
pub fn apply_highpass(buffer: &AudioBuffer, cutoff_hz: f64) -> ProcessingResult<AudioBuffer> {
    let cutoff_hz = require_finite("cutoff_hz", cutoff_hz)?;
    let stage = highpass_stage(cutoff_hz, buffer.sample_rate() as f64)?;
    if buffer.is_empty() {
        return Ok(buffer.clone());
    }
    log::debug!("{}, {:.2} dB at cutoff", stage, stage.log_result(cutoff_hz));
    filter_channels(buffer, &[stage])
}

/// Split into bands, scale each band and mix them
///
/// An empty band list yields silence of the same length.
///
/// # Errors
/// `Parameter` for non-finite gains, inverted band edges or cutoffs outside
/// `(0, Nyquist)`.
pub fn apply_multiband_eq(buffer: &AudioBuffer, bands: &[FilterBand]) -> ProcessingResult<AudioBuffer> {
    let srate = buffer.sample_rate() as f64;
    let mut designed = Vec::with_capacity(bands.len());
    for band in bands {
        let gain_db = require_finite("bands", band.gain_db())?;
        designed.push((band.stages(srate)?, db_to_gain(gain_db)));
    }
    if buffer.is_empty() {
        return Ok(buffer.clone());
    }

    let channels: Vec<Vec<f64>> = buffer
        .split_channels()
        .par_iter()
        .map(|channel| {
            let mut mixed = vec![0.0; channel.len()];
            for (stages, gain_lin) in &designed {
                for (m, y) in mixed.iter_mut().zip(cascade(channel, stages)) {
                    *m += y * gain_lin;
                }
            }
            mixed
        })
        .collect();
    AudioBuffer::from_channels(buffer.sample_rate(), buffer.format(), &channels)
}

/// Low / mid / high equalizer split at 200 Hz and 4 kHz
pub fn apply_3band_eq(
    buffer: &AudioBuffer,
    low_db: f64,
    mid_db: f64,
    high_db: f64,
) -> ProcessingResult<AudioBuffer> {
    apply_multiband_eq(
        buffer,
        &[
            FilterBand::Lowpass {
                freq: THREE_BAND_LOW_HZ,
                gain: low_db,
            },
            FilterBand::Band {
                low: THREE_BAND_LOW_HZ,
                high: THREE_BAND_HIGH_HZ,
                gain: mid_db,
            },
            FilterBand::Highpass {
                freq: THREE_BAND_HIGH_HZ,
                gain: high_db,
            },
        ],
    )
}
