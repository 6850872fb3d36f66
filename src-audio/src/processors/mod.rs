// ============================================================================
// Audio Processors
// ============================================================================
//
// Every processor is a pure function from an input buffer (plus parameters)
// to a new buffer; the input is never modified. `Operation` describes one
// processor invocation as data so it can be read from JSON/YAML, logged and
// handed to the file pipeline.

mod compressor;
mod denoise;
mod echo;
mod eq;
mod fade;
mod filters;
mod gain;
mod normalize;
mod pan;
mod trim;

pub use compressor::{apply_compressor, measure_level_db};
pub use denoise::{apply_denoise, reduce_with};
pub use echo::{DELAY_STEP_DB, REVERB_TAPS, Tap, apply_delay, apply_reverb_simple, overlay_taps};
pub use eq::{EQ_CENTERS_HZ, EQ_MIN_GAIN_DB, EQ_Q, EqBandSpec, apply_eq_10band};
pub use fade::apply_fade;
pub use filters::{
    FilterBand, THREE_BAND_HIGH_HZ, THREE_BAND_LOW_HZ, apply_3band_eq, apply_highpass,
    apply_lowpass, apply_multiband_eq,
};
pub use gain::apply_gain;
pub use normalize::normalize;
pub use pan::{apply_pan, pan_gains};
pub use trim::trim;

use crate::buffer::AudioBuffer;
use crate::capabilities::Capabilities;
use crate::errors::ProcessingResult;
use serde::{Deserialize, Serialize};

fn default_delay_ms() -> f64 {
    250.0
}

fn default_repeats() -> u32 {
    2
}

fn default_threshold_db() -> f64 {
    -20.0
}

fn default_ratio() -> f64 {
    4.0
}

/// One processor invocation
///
/// ```
/// use amax_audio::Operation;
///
/// let op: Operation = serde_json::from_str(r#"{"op": "gain", "db": -3.0}"#).unwrap();
/// assert_eq!(op, Operation::Gain { db: -3.0 });
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Operation {
    Gain {
        db: f64,
    },
    Fade {
        #[serde(default)]
        fade_in_ms: f64,
        #[serde(default)]
        fade_out_ms: f64,
    },
    Pan {
        percent: f64,
    },
    Normalize,
    Delay {
        #[serde(default = "default_delay_ms")]
        delay_ms: f64,
        #[serde(default = "default_repeats")]
        repeats: u32,
    },
    Reverb,
    Compressor {
        #[serde(default = "default_threshold_db")]
        threshold_db: f64,
        #[serde(default = "default_ratio")]
        ratio: f64,
    },
    Denoise,
    Eq {
        gains_db: [f64; 10],
    },
    Trim {
        #[serde(default)]
        start_ms: f64,
        end_ms: f64,
    },
    Lowpass {
        cutoff_hz: f64,
    },
    Highpass {
        cutoff_hz: f64,
    },
    #[serde(rename = "eq_3band")]
    Eq3Band {
        #[serde(default)]
        low_db: f64,
        #[serde(default)]
        mid_db: f64,
        #[serde(default)]
        high_db: f64,
    },
    MultibandEq {
        bands: Vec<FilterBand>,
    },
}

impl Operation {
    /// Short name used in logs and output file names
    pub fn name(&self) -> &'static str {
        match self {
            Operation::Gain { .. } => "gain",
            Operation::Fade { .. } => "fade",
            Operation::Pan { .. } => "pan",
            Operation::Normalize => "normalize",
            Operation::Delay { .. } => "delay",
            Operation::Reverb => "reverb",
            Operation::Compressor { .. } => "compressor",
            Operation::Denoise => "denoise",
            Operation::Eq { .. } => "eq",
            Operation::Trim { .. } => "trim",
            Operation::Lowpass { .. } => "lowpass",
            Operation::Highpass { .. } => "highpass",
            Operation::Eq3Band { .. } => "eq_3band",
            Operation::MultibandEq { .. } => "multiband_eq",
        }
    }

    /// Run the processor on `buffer`
    pub fn apply(&self, buffer: &AudioBuffer, caps: &Capabilities) -> ProcessingResult<AudioBuffer> {
        match *self {
            Operation::Gain { db } => apply_gain(buffer, db),
            Operation::Fade {
                fade_in_ms,
                fade_out_ms,
            } => apply_fade(buffer, fade_in_ms, fade_out_ms),
            Operation::Pan { percent } => apply_pan(buffer, percent),
            Operation::Normalize => normalize(buffer),
            Operation::Delay { delay_ms, repeats } => apply_delay(buffer, delay_ms, repeats),
            Operation::Reverb => apply_reverb_simple(buffer),
            Operation::Compressor {
                threshold_db,
                ratio,
            } => apply_compressor(buffer, threshold_db, ratio),
            Operation::Denoise => apply_denoise(buffer, caps),
            Operation::Eq { gains_db } => apply_eq_10band(buffer, &EqBandSpec::from_gains(gains_db)),
            Operation::Trim { start_ms, end_ms } => trim(buffer, start_ms, end_ms),
            Operation::Lowpass { cutoff_hz } => apply_lowpass(buffer, cutoff_hz),
            Operation::Highpass { cutoff_hz } => apply_highpass(buffer, cutoff_hz),
            Operation::Eq3Band {
                low_db,
                mid_db,
                high_db,
            } => apply_3band_eq(buffer, low_db, mid_db, high_db),
            Operation::MultibandEq { ref bands } => apply_multiband_eq(buffer, bands),
        }
    }
}

/// Apply operations in order, each on the previous result
pub fn apply_chain(
    buffer: &AudioBuffer,
    operations: &[Operation],
    caps: &Capabilities,
) -> ProcessingResult<AudioBuffer> {
    let mut current = buffer.clone();
    for op in operations {
        log::debug!("applying {}", op.name());
        current = op.apply(&current, caps)?;
    }
    Ok(current)
}
