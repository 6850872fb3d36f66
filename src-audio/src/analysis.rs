// ============================================================================
// Signal Analysis
// ============================================================================
//
// Read-only measurements over an `AudioBuffer`. Levels are expressed in dB
// relative to the format's full scale (dBFS) and times in milliseconds from
// the start of the buffer.

use crate::buffer::{AudioBuffer, db_to_gain, gain_to_db};
use crate::errors::{ProcessingError, ProcessingResult, require_nonzero_ms};
use serde::{Deserialize, Serialize};

/// Upper bound on reported peak positions
pub const MAX_PEAK_POSITIONS: usize = 50;

/// Samples above a level threshold
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeakReport {
    pub threshold_db: f64,
    /// Total number of samples above the threshold
    pub count: usize,
    /// Evenly decimated match times, at most [`MAX_PEAK_POSITIONS`]
    pub positions_ms: Vec<f64>,
}

/// Chunks whose peak reaches the clip level
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClipReport {
    pub clip_db: f64,
    pub chunk_ms: u32,
    pub starts_ms: Vec<f64>,
}

/// A half-open silent stretch `[start_ms, end_ms)`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SilenceInterval {
    pub start_ms: f64,
    pub end_ms: f64,
}

impl SilenceInterval {
    pub fn duration_ms(&self) -> f64 {
        self.end_ms - self.start_ms
    }
}

/// Silent stretches of at least `min_silence_ms`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SilenceReport {
    pub threshold_db: f64,
    pub min_silence_ms: u32,
    pub intervals: Vec<SilenceInterval>,
}

/// RMS level per chunk as a fraction of full scale
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RmsTrace {
    pub chunk_ms: u32,
    pub values: Vec<f64>,
}

/// Any analyzer result, tagged for JSON output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AnalysisReport {
    Peaks(PeakReport),
    Clipping(ClipReport),
    Silence(SilenceReport),
    Rms(RmsTrace),
}

fn require_level(name: &'static str, db: f64) -> ProcessingResult<f64> {
    if db.is_nan() {
        return Err(ProcessingError::parameter(name, "must not be NaN"));
    }
    Ok(db)
}

/// Fixed-duration chunks as (start ms, first frame, end frame); the last one
/// may be shorter
fn chunks(buffer: &AudioBuffer, chunk_ms: u32) -> Vec<(f64, usize, usize)> {
    let total = buffer.frame_count();
    let mut out = Vec::new();
    let mut k: u64 = 0;
    loop {
        let start_ms = (k * chunk_ms as u64) as f64;
        let start = buffer.ms_to_frames(start_ms);
        if start >= total {
            break;
        }
        let end = buffer.ms_to_frames(start_ms + chunk_ms as f64).min(total);
        if end > start {
            out.push((start_ms, start, end));
        }
        k += 1;
    }
    out
}

/// Count samples louder than `threshold_db` dBFS
///
/// A sample matches when `|x| > full_scale * 10^(threshold_db / 20)`.
/// Positions are the frame times of every `ceil(count / 50)`-th match.
pub fn detect_peaks(buffer: &AudioBuffer, threshold_db: f64) -> ProcessingResult<PeakReport> {
    let threshold_db = require_level("threshold_db", threshold_db)?;
    let limit = buffer.format().full_scale() * db_to_gain(threshold_db);
    let channels = buffer.channels() as usize;

    let is_peak = |x: f64| x.abs() > limit;
    let samples = buffer.samples();

    let count = samples.iter().filter(|&&x| is_peak(x)).count();
    let stride = count.div_ceil(MAX_PEAK_POSITIONS).max(1);
    let positions_ms = samples
        .iter()
        .enumerate()
        .filter(|&(_, &x)| is_peak(x))
        .step_by(stride)
        .map(|(i, _)| buffer.frames_to_ms(i / channels))
        .collect();

    Ok(PeakReport {
        threshold_db,
        count,
        positions_ms,
    })
}

/// Start times of chunks whose peak level is at least `clip_db` dBFS
///
/// Levels are relative to the format's full scale (32768 for 16-bit), so
/// the largest positive integer sample sits slightly below 0 dBFS (about
/// -0.0003 dB at 16 bit). A `clip_db` of 0 only catches negative full-scale
/// samples; pass a level like -0.1 to catch saturation either way.
pub fn detect_clipping(
    buffer: &AudioBuffer,
    clip_db: f64,
    chunk_ms: u32,
) -> ProcessingResult<ClipReport> {
    let clip_db = require_level("clip_db", clip_db)?;
    let chunk_ms = require_nonzero_ms("chunk_ms", chunk_ms)?;
    let channels = buffer.channels() as usize;
    let full_scale = buffer.format().full_scale();
    let samples = buffer.samples();

    let starts_ms = chunks(buffer, chunk_ms)
        .into_iter()
        .filter(|&(_, start, end)| {
            let peak = samples[start * channels..end * channels]
                .iter()
                .fold(0.0_f64, |m, x| m.max(x.abs()));
            gain_to_db(peak / full_scale) >= clip_db
        })
        .map(|(start_ms, _, _)| start_ms)
        .collect();

    Ok(ClipReport {
        clip_db,
        chunk_ms,
        starts_ms,
    })
}

/// Find stretches of at least `min_silence_ms` whose RMS stays at or below
/// `silence_thresh_db` dBFS
///
/// Windows of `min_silence_ms` are tested every millisecond (the last one
/// ends exactly at the buffer end); overlapping or touching silent windows
/// are merged.
pub fn detect_silence(
    buffer: &AudioBuffer,
    min_silence_ms: u32,
    silence_thresh_db: f64,
) -> ProcessingResult<SilenceReport> {
    let min_silence_ms = require_nonzero_ms("min_silence_ms", min_silence_ms)?;
    let silence_thresh_db = require_level("silence_thresh_db", silence_thresh_db)?;
    let mut report = SilenceReport {
        threshold_db: silence_thresh_db,
        min_silence_ms,
        intervals: Vec::new(),
    };

    let total = buffer.frame_count();
    let window = buffer.ms_to_frames(min_silence_ms as f64).max(1);
    if total == 0 || window > total {
        return Ok(report);
    }

    // prefix sums of normalized frame energy
    let full_scale = buffer.format().full_scale();
    let mut energy = Vec::with_capacity(total + 1);
    energy.push(0.0);
    let mut acc = 0.0;
    for frame in buffer.frames() {
        acc += frame
            .iter()
            .map(|&x| {
                let n = x / full_scale;
                n * n
            })
            .sum::<f64>();
        energy.push(acc);
    }

    let thresh = db_to_gain(silence_thresh_db);
    let limit = thresh * thresh * (window * buffer.channels() as usize) as f64;
    let is_silent = |start: usize| energy[start + window] - energy[start] <= limit;

    let last_start = total - window;
    let mut starts = Vec::new();
    let mut ms: u64 = 0;
    loop {
        let start = buffer.ms_to_frames(ms as f64);
        if start > last_start {
            break;
        }
        starts.push(start);
        ms += 1;
    }
    if starts.last() != Some(&last_start) {
        starts.push(last_start);
    }

    let mut current: Option<(usize, usize)> = None;
    for start in starts.into_iter().filter(|&s| is_silent(s)) {
        let end = start + window;
        current = match current {
            Some((s, e)) if start <= e => Some((s, e.max(end))),
            Some((s, e)) => {
                report.intervals.push(SilenceInterval {
                    start_ms: buffer.frames_to_ms(s),
                    end_ms: buffer.frames_to_ms(e),
                });
                Some((start, end))
            }
            None => Some((start, end)),
        };
    }
    if let Some((s, e)) = current {
        report.intervals.push(SilenceInterval {
            start_ms: buffer.frames_to_ms(s),
            end_ms: buffer.frames_to_ms(e),
        });
    }
    Ok(report)
}

/// RMS per chunk, as a fraction of full scale
pub fn rms_over_time(buffer: &AudioBuffer, chunk_ms: u32) -> ProcessingResult<RmsTrace> {
    let chunk_ms = require_nonzero_ms("chunk_ms", chunk_ms)?;
    let channels = buffer.channels() as usize;
    let full_scale = buffer.format().full_scale();
    let samples = buffer.samples();

    let values = chunks(buffer, chunk_ms)
        .into_iter()
        .map(|(_, start, end)| {
            let chunk = &samples[start * channels..end * channels];
            let mean_square = chunk
                .iter()
                .map(|&x| {
                    let n = x / full_scale;
                    n * n
                })
                .sum::<f64>()
                / chunk.len() as f64;
            mean_square.sqrt()
        })
        .collect();

    Ok(RmsTrace { chunk_ms, values })
}
