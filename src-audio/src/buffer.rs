//! In-memory audio buffer
//!
//! Samples are stored interleaved as `f64` in the native scale of the
//! buffer's [`SampleFormat`]: integer formats hold integer values
//! (e.g. -32768..=32767 for 16-bit), `F32` holds values in `[-1, 1]` that
//! are exactly representable as `f32`. Every constructor conforms incoming
//! values to that range by saturating, never by wrapping.

use crate::errors::{ProcessingError, ProcessingResult};
use serde::{Deserialize, Serialize};
use std::slice::ChunksExact;

/// Convert dB to linear gain
#[inline]
pub fn db_to_gain(db: f64) -> f64 {
    10.0_f64.powf(db / 20.0)
}

/// Convert linear gain to dB (`-inf` for zero)
#[inline]
pub fn gain_to_db(gain: f64) -> f64 {
    20.0 * gain.log10()
}

/// Sample encoding, which fixes the representable range and byte width
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SampleFormat {
    /// 8-bit signed integer
    I8,
    /// 16-bit signed integer
    I16,
    /// 24-bit signed integer
    I24,
    /// 32-bit signed integer
    I32,
    /// 32-bit IEEE float, full scale = 1.0
    F32,
}

impl SampleFormat {
    /// Bits per sample
    pub fn bits(self) -> u16 {
        match self {
            SampleFormat::I8 => 8,
            SampleFormat::I16 => 16,
            SampleFormat::I24 => 24,
            SampleFormat::I32 | SampleFormat::F32 => 32,
        }
    }

    /// Bytes per sample
    pub fn bytes_per_sample(self) -> usize {
        self.bits() as usize / 8
    }

    pub fn is_float(self) -> bool {
        matches!(self, SampleFormat::F32)
    }

    /// Amplitude corresponding to 0 dBFS
    pub fn full_scale(self) -> f64 {
        match self {
            SampleFormat::F32 => 1.0,
            other => (1_u64 << (other.bits() - 1)) as f64,
        }
    }

    /// Largest representable value
    pub fn max_value(self) -> f64 {
        match self {
            SampleFormat::F32 => 1.0,
            other => other.full_scale() - 1.0,
        }
    }

    /// Smallest representable value
    pub fn min_value(self) -> f64 {
        -self.full_scale()
    }

    /// Saturate (and round, for integer formats) a value into this format
    #[inline]
    pub fn quantize(self, value: f64) -> f64 {
        let clamped = value.clamp(self.min_value(), self.max_value());
        match self {
            SampleFormat::F32 => clamped as f32 as f64,
            _ => clamped.round(),
        }
    }

    /// Pick a format from a container's bit depth
    pub fn from_bits(bits: u32, float: bool) -> Option<Self> {
        match (bits, float) {
            (32, true) => Some(SampleFormat::F32),
            (_, true) => None,
            (8, false) => Some(SampleFormat::I8),
            (16, false) => Some(SampleFormat::I16),
            (24, false) => Some(SampleFormat::I24),
            (32, false) => Some(SampleFormat::I32),
            _ => None,
        }
    }

    /// Short name for logs and the CLI
    pub fn as_str(self) -> &'static str {
        match self {
            SampleFormat::I8 => "s8",
            SampleFormat::I16 => "s16",
            SampleFormat::I24 => "s24",
            SampleFormat::I32 => "s32",
            SampleFormat::F32 => "f32",
        }
    }
}

/// Decoded audio: interleaved samples plus format metadata
#[derive(Debug, Clone, PartialEq)]
pub struct AudioBuffer {
    sample_rate: u32,
    channels: u16,
    format: SampleFormat,
    samples: Vec<f64>,
}

impl AudioBuffer {
    /// Create a buffer from interleaved samples in the format's native scale
    pub fn new(
        sample_rate: u32,
        channels: u16,
        format: SampleFormat,
        samples: Vec<f64>,
    ) -> ProcessingResult<Self> {
        if sample_rate == 0 {
            return Err(ProcessingError::parameter("sample_rate", "must be positive"));
        }
        if channels == 0 {
            return Err(ProcessingError::parameter("channels", "must be positive"));
        }
        let mut buffer = Self {
            sample_rate,
            channels,
            format,
            samples: Vec::new(),
        };
        buffer.samples = buffer.conform(samples)?;
        Ok(buffer)
    }

    /// Create a silent buffer of `frames` frames
    pub fn silent(
        sample_rate: u32,
        channels: u16,
        format: SampleFormat,
        frames: usize,
    ) -> ProcessingResult<Self> {
        Self::new(
            sample_rate,
            channels,
            format,
            vec![0.0; frames * channels as usize],
        )
    }

    /// Create a buffer from interleaved samples normalized to `[-1, 1]`
    pub fn from_normalized(
        sample_rate: u32,
        channels: u16,
        format: SampleFormat,
        normalized: &[f64],
    ) -> ProcessingResult<Self> {
        let scale = format.full_scale();
        Self::new(
            sample_rate,
            channels,
            format,
            normalized.iter().map(|&x| x * scale).collect(),
        )
    }

    /// Create a buffer from one sample vector per channel
    pub fn from_channels(
        sample_rate: u32,
        format: SampleFormat,
        per_channel: &[Vec<f64>],
    ) -> ProcessingResult<Self> {
        let channels = u16::try_from(per_channel.len())
            .map_err(|_| ProcessingError::parameter("channels", "too many channels"))?;
        if channels == 0 {
            return Err(ProcessingError::parameter("channels", "must be positive"));
        }
        let n_frames = per_channel[0].len();
        if per_channel.iter().any(|ch| ch.len() != n_frames) {
            return Err(ProcessingError::parameter(
                "channels",
                "all channels must have the same length",
            ));
        }
        let mut interleaved = Vec::with_capacity(n_frames * per_channel.len());
        for frame in 0..n_frames {
            for ch in per_channel {
                interleaved.push(ch[frame]);
            }
        }
        Self::new(sample_rate, channels, format, interleaved)
    }

    /// New buffer with the same metadata and different samples
    ///
    /// The length must stay a multiple of the channel count; the duration
    /// may change (delay and reverb extend their input).
    pub fn with_samples(&self, samples: Vec<f64>) -> ProcessingResult<Self> {
        Ok(Self {
            sample_rate: self.sample_rate,
            channels: self.channels,
            format: self.format,
            samples: self.conform(samples)?,
        })
    }

    /// New buffer with `f` applied to every sample, then saturated
    pub fn map_samples<F>(&self, f: F) -> Self
    where
        F: Fn(f64) -> f64,
    {
        let format = self.format;
        Self {
            sample_rate: self.sample_rate,
            channels: self.channels,
            format,
            samples: self.samples.iter().map(|&x| format.quantize(f(x))).collect(),
        }
    }

    fn conform(&self, mut samples: Vec<f64>) -> ProcessingResult<Vec<f64>> {
        if samples.len() % self.channels as usize != 0 {
            return Err(ProcessingError::parameter(
                "samples",
                format!(
                    "{} samples do not divide into {} channels",
                    samples.len(),
                    self.channels
                ),
            ));
        }
        if let Some(bad) = samples.iter().find(|x| !x.is_finite()) {
            return Err(ProcessingError::parameter(
                "samples",
                format!("non-finite sample value {}", bad),
            ));
        }
        for sample in samples.iter_mut() {
            *sample = self.format.quantize(*sample);
        }
        Ok(samples)
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn channels(&self) -> u16 {
        self.channels
    }

    pub fn format(&self) -> SampleFormat {
        self.format
    }

    /// Interleaved samples in native scale
    pub fn samples(&self) -> &[f64] {
        &self.samples
    }

    pub fn into_samples(self) -> Vec<f64> {
        self.samples
    }

    pub fn frame_count(&self) -> usize {
        self.samples.len() / self.channels as usize
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Iterate over frames, one slice of `channels` samples each
    pub fn frames(&self) -> ChunksExact<'_, f64> {
        self.samples.chunks_exact(self.channels as usize)
    }

    /// Copy out one channel
    pub fn channel(&self, index: usize) -> Option<Vec<f64>> {
        if index >= self.channels as usize {
            return None;
        }
        Some(self.frames().map(|frame| frame[index]).collect())
    }

    /// Copy out every channel
    pub fn split_channels(&self) -> Vec<Vec<f64>> {
        (0..self.channels as usize)
            .map(|ch| self.frames().map(|frame| frame[ch]).collect())
            .collect()
    }

    /// Duration in milliseconds
    pub fn duration_ms(&self) -> f64 {
        self.frames_to_ms(self.frame_count())
    }

    /// Frame count covering `ms` milliseconds (rounded)
    pub fn ms_to_frames(&self, ms: f64) -> usize {
        (ms * self.sample_rate as f64 / 1000.0).round().max(0.0) as usize
    }

    /// Time of a frame index in milliseconds
    pub fn frames_to_ms(&self, frames: usize) -> f64 {
        frames as f64 * 1000.0 / self.sample_rate as f64
    }

    /// Largest absolute sample value
    pub fn peak(&self) -> f64 {
        self.samples.iter().fold(0.0_f64, |acc, &x| acc.max(x.abs()))
    }

    /// Peak level in dBFS (`-inf` for silence)
    pub fn peak_dbfs(&self) -> f64 {
        gain_to_db(self.peak() / self.format.full_scale())
    }

    /// Samples normalized to `[-1, 1]`
    pub fn to_normalized(&self) -> Vec<f64> {
        let scale = self.format.full_scale();
        self.samples.iter().map(|&x| x / scale).collect()
    }
}
