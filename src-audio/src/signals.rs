//! Audio signal generation utilities
//!
//! Deterministic test signals used by the CLI's `tone` command and by the
//! test suites:
//! - Pure tones (sine waves)
//! - White noise
//! - Silence with an optional burst
//!
//! Generators return mono `f64` signals normalized to `[-1, 1]`; use
//! [`interleave_per_channel`] or [`replicate_mono`] to build multichannel
//! material and [`crate::AudioBuffer::from_normalized`] to wrap it.

use std::f64::consts::PI;

/// Calculate number of frames for given duration and sample rate
#[inline]
pub fn frames_for(duration: f64, sample_rate: u32) -> usize {
    (duration * sample_rate as f64).round().max(0.0) as usize
}

/// Generate a pure tone (sine wave)
///
/// # Arguments
/// * `freq` - Frequency in Hz
/// * `amp` - Amplitude (0.0 to 1.0)
/// * `sample_rate` - Sample rate in Hz
/// * `duration` - Duration in seconds
pub fn gen_tone(freq: f64, amp: f64, sample_rate: u32, duration: f64) -> Vec<f64> {
    let n_frames = frames_for(duration, sample_rate);
    let dphi = 2.0 * PI * freq / sample_rate as f64;
    (0..n_frames)
        .map(|n| (amp * (dphi * n as f64).sin()).clamp(-1.0, 1.0))
        .collect()
}

/// Generate white noise
///
/// Produces noise with a flat frequency spectrum, uniformly distributed in
/// `[-amp, amp]`. Uses a deterministic LCG so runs are reproducible.
///
/// # Arguments
/// * `amp` - Amplitude (0.0 to 1.0)
/// * `sample_rate` - Sample rate in Hz
/// * `duration` - Duration in seconds
/// * `seed` - Generator seed
pub fn gen_white_noise(amp: f64, sample_rate: u32, duration: f64, seed: u64) -> Vec<f64> {
    let n_frames = frames_for(duration, sample_rate);
    let mut state = seed;
    (0..n_frames)
        .map(|_| {
            // Knuth MMIX constants; high bits have the best period
            state = state
                .wrapping_mul(6364136223846793005)
                .wrapping_add(1442695040888963407);
            let unit = (state >> 32) as f64 / u32::MAX as f64;
            (amp * (unit * 2.0 - 1.0)).clamp(-1.0, 1.0)
        })
        .collect()
}

/// Silence of `duration` seconds with a constant-level burst in the middle
///
/// # Arguments
/// * `level` - Burst amplitude (0.0 to 1.0)
/// * `burst_start` - Burst start in seconds
/// * `burst_len` - Burst length in seconds
pub fn gen_burst(
    level: f64,
    sample_rate: u32,
    duration: f64,
    burst_start: f64,
    burst_len: f64,
) -> Vec<f64> {
    let n_frames = frames_for(duration, sample_rate);
    let start = frames_for(burst_start, sample_rate).min(n_frames);
    let end = frames_for(burst_start + burst_len, sample_rate).min(n_frames);
    let mut signal = vec![0.0; n_frames];
    for sample in &mut signal[start..end] {
        *sample = level.clamp(-1.0, 1.0);
    }
    signal
}

/// Sum two signals sample by sample; the result has the longer length
pub fn mix(a: &[f64], b: &[f64]) -> Vec<f64> {
    let n = a.len().max(b.len());
    (0..n)
        .map(|i| {
            let x = a.get(i).copied().unwrap_or(0.0) + b.get(i).copied().unwrap_or(0.0);
            x.clamp(-1.0, 1.0)
        })
        .collect()
}

/// Interleave per-channel signals into one buffer
///
/// Shorter channels are padded with silence.
pub fn interleave_per_channel(per_channel: &[Vec<f64>]) -> Vec<f64> {
    let channels = per_channel.len();
    let n_frames = per_channel.iter().map(|c| c.len()).max().unwrap_or(0);
    let mut interleaved = Vec::with_capacity(n_frames * channels);
    for frame in 0..n_frames {
        for ch in per_channel {
            interleaved.push(ch.get(frame).copied().unwrap_or(0.0));
        }
    }
    interleaved
}

/// Copy a mono signal into every channel
pub fn replicate_mono(mono: &[f64], channels: u16) -> Vec<f64> {
    let channels = channels.max(1) as usize;
    let mut interleaved = Vec::with_capacity(mono.len() * channels);
    for &sample in mono {
        for _ in 0..channels {
            interleaved.push(sample);
        }
    }
    interleaved
}

/// Root-mean-square of a signal (0 for an empty slice)
pub fn rms(signal: &[f64]) -> f64 {
    if signal.is_empty() {
        return 0.0;
    }
    (signal.iter().map(|x| x * x).sum::<f64>() / signal.len() as f64).sqrt()
}
