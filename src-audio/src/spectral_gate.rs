//! Stationary spectral-gate noise reduction
//!
//! A short-time Fourier transform splits the signal into overlapping Hann
//! windowed frames. A per-bin noise threshold (mean + `n_std_thresh` standard
//! deviations of the bin's level in dB) is estimated from the quietest
//! frames; bins at or below it are attenuated by `prop_decrease`, and the
//! frames are resynthesized by weighted overlap-add.

use crate::capabilities::NoiseReducer;
use crate::errors::{ProcessingError, ProcessingResult};
use rustfft::{FftPlanner, num_complex::Complex};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

const MAGNITUDE_FLOOR: f64 = 1e-10;

fn default_n_fft() -> usize {
    2048
}

fn default_hop() -> usize {
    512
}

fn default_n_std_thresh() -> f64 {
    1.5
}

fn default_prop_decrease() -> f64 {
    1.0
}

fn default_noise_fraction() -> f64 {
    0.1
}

/// Spectral gate settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpectralGateConfig {
    /// FFT size (power of two)
    #[serde(default = "default_n_fft")]
    pub n_fft: usize,
    /// Hop between frames in samples
    #[serde(default = "default_hop")]
    pub hop: usize,
    /// Standard deviations above the noise mean a bin must exceed to pass
    #[serde(default = "default_n_std_thresh")]
    pub n_std_thresh: f64,
    /// Attenuation of gated bins (1.0 removes them entirely)
    #[serde(default = "default_prop_decrease")]
    pub prop_decrease: f64,
    /// Share of the quietest frames used as the noise profile
    #[serde(default = "default_noise_fraction")]
    pub noise_fraction: f64,
}

impl Default for SpectralGateConfig {
    fn default() -> Self {
        Self {
            n_fft: default_n_fft(),
            hop: default_hop(),
            n_std_thresh: default_n_std_thresh(),
            prop_decrease: default_prop_decrease(),
            noise_fraction: default_noise_fraction(),
        }
    }
}

impl SpectralGateConfig {
    pub fn validate(&self) -> ProcessingResult<()> {
        if self.n_fft < 16 || !self.n_fft.is_power_of_two() {
            return Err(ProcessingError::parameter(
                "n_fft",
                format!("must be a power of two >= 16, got {}", self.n_fft),
            ));
        }
        if self.hop == 0 || self.hop > self.n_fft / 2 {
            return Err(ProcessingError::parameter(
                "hop",
                format!("must be within 1..={}, got {}", self.n_fft / 2, self.hop),
            ));
        }
        if !self.n_std_thresh.is_finite() {
            return Err(ProcessingError::parameter("n_std_thresh", "must be finite"));
        }
        if !(0.0..=1.0).contains(&self.prop_decrease) {
            return Err(ProcessingError::parameter(
                "prop_decrease",
                format!("must be within 0..=1, got {}", self.prop_decrease),
            ));
        }
        if !(self.noise_fraction > 0.0 && self.noise_fraction <= 1.0) {
            return Err(ProcessingError::parameter(
                "noise_fraction",
                format!("must be within (0, 1], got {}", self.noise_fraction),
            ));
        }
        Ok(())
    }
}

/// Built-in [`NoiseReducer`]
#[derive(Debug, Clone, Default)]
pub struct SpectralGate {
    config: SpectralGateConfig,
}

impl SpectralGate {
    pub fn new(config: SpectralGateConfig) -> ProcessingResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &SpectralGateConfig {
        &self.config
    }

    /// Per-bin gate thresholds in dB from the quietest frames
    fn noise_thresholds(&self, spectra: &[Vec<Complex<f64>>], levels_db: &[Vec<f64>]) -> Vec<f64> {
        let n_bins = levels_db.first().map_or(0, |l| l.len());
        let mut order: Vec<(usize, f64)> = spectra
            .iter()
            .enumerate()
            .map(|(i, s)| (i, s[..n_bins].iter().map(|c| c.norm_sqr()).sum::<f64>()))
            .collect();
        order.sort_by(|a, b| a.1.total_cmp(&b.1));

        let count = ((spectra.len() as f64 * self.config.noise_fraction).ceil() as usize)
            .clamp(1, spectra.len());
        let quiet: Vec<usize> = order.iter().take(count).map(|&(i, _)| i).collect();

        (0..n_bins)
            .map(|bin| {
                let mean = quiet.iter().map(|&f| levels_db[f][bin]).sum::<f64>() / count as f64;
                let var = quiet
                    .iter()
                    .map(|&f| (levels_db[f][bin] - mean).powi(2))
                    .sum::<f64>()
                    / count as f64;
                mean + self.config.n_std_thresh * var.sqrt()
            })
            .collect()
    }
}

/// Periodic Hann window
fn hann(len: usize) -> Vec<f64> {
    (0..len)
        .map(|i| 0.5 * (1.0 - (2.0 * PI * i as f64 / len as f64).cos()))
        .collect()
}

impl NoiseReducer for SpectralGate {
    fn name(&self) -> &str {
        "spectral-gate"
    }

    fn reduce_noise(&self, signal: &[f64], _sample_rate: u32) -> ProcessingResult<Vec<f64>> {
        if signal.is_empty() {
            return Ok(Vec::new());
        }
        let n_fft = self.config.n_fft;
        let hop = self.config.hop;

        // centered frames: pad half a window on each side, then up to a whole hop
        let pad = n_fft / 2;
        let padded_len = signal.len() + 2 * pad;
        let n_frames = (padded_len - n_fft).div_ceil(hop) + 1;
        let total = (n_frames - 1) * hop + n_fft;
        let mut padded = vec![0.0; total];
        padded[pad..pad + signal.len()].copy_from_slice(signal);

        let window = hann(n_fft);
        let mut planner = FftPlanner::<f64>::new();
        let fft = planner.plan_fft_forward(n_fft);
        let ifft = planner.plan_fft_inverse(n_fft);

        let mut spectra: Vec<Vec<Complex<f64>>> = (0..n_frames)
            .map(|f| {
                let start = f * hop;
                let mut frame: Vec<Complex<f64>> = padded[start..start + n_fft]
                    .iter()
                    .zip(&window)
                    .map(|(&x, &w)| Complex::new(x * w, 0.0))
                    .collect();
                fft.process(&mut frame);
                frame
            })
            .collect();

        let n_bins = n_fft / 2 + 1;
        let levels_db: Vec<Vec<f64>> = spectra
            .iter()
            .map(|s| {
                s[..n_bins]
                    .iter()
                    .map(|c| 20.0 * (c.norm() + MAGNITUDE_FLOOR).log10())
                    .collect()
            })
            .collect();
        let thresholds = self.noise_thresholds(&spectra, &levels_db);

        let floor_gain = 1.0 - self.config.prop_decrease;
        let mut out = vec![0.0; total];
        let mut norm = vec![0.0; total];
        for (f, spectrum) in spectra.iter_mut().enumerate() {
            for bin in 0..n_bins {
                if levels_db[f][bin] <= thresholds[bin] {
                    spectrum[bin] *= floor_gain;
                    let mirror = n_fft - bin;
                    if bin != 0 && mirror != bin {
                        spectrum[mirror] *= floor_gain;
                    }
                }
            }
            ifft.process(spectrum);
            let start = f * hop;
            for (i, (&w, c)) in window.iter().zip(spectrum.iter()).enumerate() {
                out[start + i] += c.re / n_fft as f64 * w;
                norm[start + i] += w * w;
            }
        }

        Ok((pad..pad + signal.len())
            .map(|i| if norm[i] > 1e-8 { out[i] / norm[i] } else { 0.0 })
            .collect())
    }
}
