// ============================================================================
// 10-Band Graphic Equalizer
// ============================================================================
//
// Each active band runs the signal through a unity-peak resonator (Q = 1)
// centered on the band and blends the result back in:
//
//     out += (filtered - out) * (10^(gain/20) - 1) * 0.5
//
// Bands are applied in order, each one on the output of the previous one.
// Bands that cannot be designed at the buffer's sample rate (a center at or
// above Nyquist) are skipped with a warning.

use crate::buffer::{AudioBuffer, db_to_gain};
use crate::errors::{ProcessingError, ProcessingResult};
use amax_iir::Biquad;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Fixed band centers in Hz
pub const EQ_CENTERS_HZ: [f64; 10] = [
    31.0, 62.0, 125.0, 250.0, 500.0, 1000.0, 2000.0, 4000.0, 8000.0, 16000.0,
];

/// Resonator Q for every band
pub const EQ_Q: f64 = 1.0;

/// Bands with a smaller absolute gain are left out
pub const EQ_MIN_GAIN_DB: f64 = 0.01;

/// One equalizer band
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EqBandSpec {
    pub center_hz: f64,
    pub gain_db: f64,
}

impl EqBandSpec {
    /// Ten bands on the standard centers
    pub fn from_gains(gains_db: [f64; 10]) -> [EqBandSpec; 10] {
        let mut bands = [EqBandSpec {
            center_hz: 0.0,
            gain_db: 0.0,
        }; 10];
        for (band, (&center_hz, &gain_db)) in bands
            .iter_mut()
            .zip(EQ_CENTERS_HZ.iter().zip(gains_db.iter()))
        {
            *band = EqBandSpec { center_hz, gain_db };
        }
        bands
    }

    pub fn is_active(&self) -> bool {
        self.gain_db.abs() >= EQ_MIN_GAIN_DB
    }
}

fn validate(bands: &[EqBandSpec; 10]) -> ProcessingResult<()> {
    for (band, &expected) in bands.iter().zip(EQ_CENTERS_HZ.iter()) {
        if band.center_hz != expected {
            return Err(ProcessingError::parameter(
                "bands",
                format!(
                    "expected center {} Hz, got {} Hz (bands must be 31..16000 Hz in order)",
                    expected, band.center_hz
                ),
            ));
        }
        if !band.gain_db.is_finite() {
            return Err(ProcessingError::parameter(
                "bands",
                format!("gain at {} Hz is not finite", band.center_hz),
            ));
        }
    }
    Ok(())
}

/// Run one channel through every designed band
fn equalize_channel(signal: &[f64], stages: &[(Biquad, f64)]) -> Vec<f64> {
    let mut out = signal.to_vec();
    for (resonator, gain_lin) in stages {
        let filtered = resonator.filter(&out);
        for (o, f) in out.iter_mut().zip(filtered) {
            *o += (f - *o) * (gain_lin - 1.0) * 0.5;
        }
    }
    out
}

/// Apply the 10-band equalizer
///
/// # Arguments
/// * `buffer` - Source audio
/// * `bands` - Gains on the fixed centers, see [`EqBandSpec::from_gains`]
///
/// # Errors
/// `Parameter` for misplaced centers or non-finite gains, `AllBandsFailed`
/// when at least one band is active but none could be designed.
pub fn apply_eq_10band(
    buffer: &AudioBuffer,
    bands: &[EqBandSpec; 10],
) -> ProcessingResult<AudioBuffer> {
    validate(bands)?;
    let active: Vec<&EqBandSpec> = bands.iter().filter(|b| b.is_active()).collect();
    if active.is_empty() || buffer.is_empty() {
        return Ok(buffer.clone());
    }

    let srate = buffer.sample_rate() as f64;
    let mut stages = Vec::with_capacity(active.len());
    for band in &active {
        match Biquad::resonator(band.center_hz, srate, EQ_Q) {
            Ok(resonator) => {
                log::debug!(
                    "eq band {} gain {:+.2} dB, response {:.2} dB at center",
                    resonator,
                    band.gain_db,
                    resonator.log_result(band.center_hz)
                );
                stages.push((resonator, db_to_gain(band.gain_db)));
            }
            Err(e) => log::warn!("eq band {} Hz skipped: {}", band.center_hz, e),
        }
    }
    if stages.is_empty() {
        return Err(ProcessingError::AllBandsFailed {
            attempted: active.len(),
        });
    }

    let channels: Vec<Vec<f64>> = buffer
        .split_channels()
        .par_iter()
        .map(|channel| equalize_channel(channel, &stages))
        .collect();
    AudioBuffer::from_channels(buffer.sample_rate(), buffer.format(), &channels)
}
