//! Second-order IIR filters used by the Audio Max equalizers.
//!
//! The graphic equalizer works with a constant 0 dB peak gain resonator (the
//! classic "iirpeak" design): unity gain at the center frequency, zeros at DC
//! and Nyquist, and a -3 dB bandwidth of `center / Q`. Frequencies are
//! normalized to the Nyquist frequency of the signal being filtered.
//!
//! The band-split equalizers use cookbook low-pass and high-pass sections,
//! Butterworth by default.

use std::f64::consts::{FRAC_1_SQRT_2, PI};
use std::fmt;

/// Q of a second-order Butterworth section
pub const BUTTERWORTH_Q: f64 = FRAC_1_SQRT_2;

/// Biquad filter types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BiquadFilterType {
    /// Constant peak gain resonator
    Resonator,
    /// Low-pass filter
    Lowpass,
    /// High-pass filter
    Highpass,
}

impl BiquadFilterType {
    /// Returns the short string representation of the filter type (e.g., "LP").
    pub fn short_name(&self) -> &'static str {
        match self {
            BiquadFilterType::Resonator => "RES",
            BiquadFilterType::Lowpass => "LP",
            BiquadFilterType::Highpass => "HP",
        }
    }
}

/// Error raised when a filter cannot be designed for the requested parameters.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FilterDesignError {
    /// Center frequency is not strictly inside `(0, nyquist)`.
    #[error("center frequency {freq} Hz must lie strictly between 0 and Nyquist ({nyquist} Hz)")]
    FrequencyOutOfRange { freq: f64, nyquist: f64 },

    /// Sample rate is zero, negative or not finite.
    #[error("invalid sample rate: {0}")]
    InvalidSampleRate(f64),

    /// Q factor is zero, negative or not finite.
    #[error("invalid Q factor: {0}")]
    InvalidQ(f64),

    /// Bandwidth `center / Q` reaches Nyquist, the design degenerates.
    #[error("bandwidth {bandwidth} Hz is too wide for a {nyquist} Hz Nyquist")]
    BandwidthTooWide { bandwidth: f64, nyquist: f64 },
}

/// Represents a single biquad IIR filter.
#[derive(Debug, Clone)]
pub struct Biquad {
    /// The type of filter
    pub filter_type: BiquadFilterType,
    /// Center (or cutoff) frequency in Hz
    pub freq: f64,
    /// Sample rate in Hz
    pub srate: f64,
    /// Q factor (quality factor)
    pub q: f64,
    /// Filter coefficients (a0 normalized to 1)
    a1: f64,
    a2: f64,
    b0: f64,
    b1: f64,
    b2: f64,
    /// Filter state (for processing samples)
    x1: f64,
    x2: f64,
    y1: f64,
    y2: f64,
    /// Pre-computed coefficients for fast frequency response calculation
    r_up0: f64,
    r_up1: f64,
    r_up2: f64,
    r_dw0: f64,
    r_dw1: f64,
    r_dw2: f64,
}

/// Checks sample rate, Q and frequency; returns `freq / nyquist`.
fn normalized_frequency(freq: f64, srate: f64, q: f64) -> Result<f64, FilterDesignError> {
    if !srate.is_finite() || srate <= 0.0 {
        return Err(FilterDesignError::InvalidSampleRate(srate));
    }
    if !q.is_finite() || q <= 0.0 {
        return Err(FilterDesignError::InvalidQ(q));
    }
    let nyquist = srate / 2.0;
    let w0 = freq / nyquist;
    if !w0.is_finite() || w0 <= 0.0 || w0 >= 1.0 {
        return Err(FilterDesignError::FrequencyOutOfRange { freq, nyquist });
    }
    Ok(w0)
}

impl Biquad {
    fn with_coefficients(
        filter_type: BiquadFilterType,
        freq: f64,
        srate: f64,
        q: f64,
        (b0, b1, b2, a0, a1, a2): (f64, f64, f64, f64, f64, f64),
    ) -> Self {
        let mut biquad = Biquad {
            filter_type,
            freq,
            srate,
            q,
            a1: a1 / a0,
            a2: a2 / a0,
            b0: b0 / a0,
            b1: b1 / a0,
            b2: b2 / a0,
            x1: 0.0,
            x2: 0.0,
            y1: 0.0,
            y2: 0.0,
            r_up0: 0.0,
            r_up1: 0.0,
            r_up2: 0.0,
            r_dw0: 0.0,
            r_dw1: 0.0,
            r_dw2: 0.0,
        };
        biquad.precompute_response();
        biquad
    }

    /// Designs a constant-peak-gain resonator centered on `freq`.
    ///
    /// Fails when `freq` is not strictly between 0 and Nyquist, or when the
    /// resulting bandwidth would reach Nyquist.
    pub fn resonator(freq: f64, srate: f64, q: f64) -> Result<Self, FilterDesignError> {
        let w0 = normalized_frequency(freq, srate, q)?;
        let nyquist = srate / 2.0;
        let bw = w0 / q;
        if bw >= 1.0 {
            return Err(FilterDesignError::BandwidthTooWide {
                bandwidth: freq / q,
                nyquist,
            });
        }

        // -3 dB points: gb = 1/sqrt(2) makes the bandwidth scale factor exactly 1
        let beta = (bw * PI / 2.0).tan();
        let gain = 1.0 / (1.0 + beta);
        let cs = (w0 * PI).cos();

        Ok(Self::with_coefficients(
            BiquadFilterType::Resonator,
            freq,
            srate,
            q,
            (1.0 - gain, 0.0, -(1.0 - gain), 1.0, -2.0 * gain * cs, 2.0 * gain - 1.0),
        ))
    }

    /// Designs a second-order low-pass with cutoff `freq`.
    pub fn lowpass(freq: f64, srate: f64, q: f64) -> Result<Self, FilterDesignError> {
        let w0 = normalized_frequency(freq, srate, q)?;
        let (sn, cs) = (w0 * PI).sin_cos();
        let alpha = sn / (2.0 * q);
        Ok(Self::with_coefficients(
            BiquadFilterType::Lowpass,
            freq,
            srate,
            q,
            (
                (1.0 - cs) / 2.0,
                1.0 - cs,
                (1.0 - cs) / 2.0,
                1.0 + alpha,
                -2.0 * cs,
                1.0 - alpha,
            ),
        ))
    }

    /// Designs a second-order high-pass with cutoff `freq`.
    pub fn highpass(freq: f64, srate: f64, q: f64) -> Result<Self, FilterDesignError> {
        let w0 = normalized_frequency(freq, srate, q)?;
        let (sn, cs) = (w0 * PI).sin_cos();
        let alpha = sn / (2.0 * q);
        Ok(Self::with_coefficients(
            BiquadFilterType::Highpass,
            freq,
            srate,
            q,
            (
                (1.0 + cs) / 2.0,
                -(1.0 + cs),
                (1.0 + cs) / 2.0,
                1.0 + alpha,
                -2.0 * cs,
                1.0 - alpha,
            ),
        ))
    }

    fn precompute_response(&mut self) {
        self.r_up0 = (self.b0 + self.b1 + self.b2).powi(2);
        self.r_up1 = -4.0 * (self.b0 * self.b1 + 4.0 * self.b0 * self.b2 + self.b1 * self.b2);
        self.r_up2 = 16.0 * self.b0 * self.b2;
        self.r_dw0 = (1.0 + self.a1 + self.a2).powi(2);
        self.r_dw1 = -4.0 * (self.a1 + 4.0 * self.a2 + self.a1 * self.a2);
        self.r_dw2 = 16.0 * self.a2;
    }

    /// Processes a single audio sample through the filter.
    pub fn process(&mut self, x: f64) -> f64 {
        let y = self.b0 * x + self.b1 * self.x1 + self.b2 * self.x2
            - self.a1 * self.y1
            - self.a2 * self.y2;

        self.x2 = self.x1;
        self.x1 = x;
        self.y2 = self.y1;
        self.y1 = y;

        y
    }

    /// Clears the delay line.
    pub fn reset(&mut self) {
        self.x1 = 0.0;
        self.x2 = 0.0;
        self.y1 = 0.0;
        self.y2 = 0.0;
    }

    /// Filters a whole signal starting from rest, leaving `self` untouched.
    pub fn filter(&self, signal: &[f64]) -> Vec<f64> {
        let mut stage = self.clone();
        stage.reset();
        signal.iter().map(|&x| stage.process(x)).collect()
    }

    /// Calculates the filter's magnitude response at a single frequency `f`.
    pub fn result(&self, f: f64) -> f64 {
        let phi = (PI * f / self.srate).sin().powi(2);
        let phi2 = phi * phi;

        let numerator = self.r_up0 + self.r_up1 * phi + self.r_up2 * phi2;
        let denominator = self.r_dw0 + self.r_dw1 * phi + self.r_dw2 * phi2;

        let result = (numerator / denominator).max(0.0);
        result.sqrt()
    }

    /// Calculates the filter's response in dB at a single frequency `f`.
    pub fn log_result(&self, f: f64) -> f64 {
        let result = self.result(f);
        if result > 0.0 {
            20.0 * result.log10()
        } else {
            -200.0
        }
    }

    /// Returns the filter coefficients as `(a1, a2, b0, b1, b2)`.
    pub fn constants(&self) -> (f64, f64, f64, f64, f64) {
        (self.a1, self.a2, self.b0, self.b1, self.b2)
    }
}

impl fmt::Display for Biquad {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Type:{},Freq:{:.1},Rate:{:.1},Q:{:.1}",
            self.filter_type.short_name(),
            self.freq,
            self.srate,
            self.q
        )
    }
}
