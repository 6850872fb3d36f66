// Integration tests for the analyzers

use amax_audio::signals::gen_burst;
use amax_audio::{
    AnalysisReport, AudioBuffer, SampleFormat, apply_gain, detect_clipping, detect_peaks,
    detect_silence, rms_over_time,
};

#[test]
fn test_all_zero_buffer_is_one_silent_interval() {
    let buf = AudioBuffer::silent(8000, 2, SampleFormat::I16, 8000).unwrap();
    let report = detect_silence(&buf, 500, -50.0).unwrap();
    assert_eq!(report.intervals.len(), 1);
    assert_eq!(report.intervals[0].start_ms, 0.0);
    assert_eq!(report.intervals[0].end_ms, 1000.0);
}

#[test]
fn test_silence_around_burst() {
    let signal = gen_burst(0.5, 1000, 3.0, 1.0, 1.0);
    let buf = AudioBuffer::from_normalized(1000, 1, SampleFormat::I16, &signal).unwrap();
    let report = detect_silence(&buf, 500, -40.0).unwrap();
    assert_eq!(report.intervals.len(), 2);
    assert_eq!(report.intervals[0].start_ms, 0.0);
    assert_eq!(report.intervals[0].end_ms, 1000.0);
    assert_eq!(report.intervals[1].start_ms, 2000.0);
    assert_eq!(report.intervals[1].end_ms, 3000.0);
}

#[test]
fn test_silence_after_gain_has_no_peaks() {
    let buf = AudioBuffer::silent(8000, 1, SampleFormat::I16, 800).unwrap();
    let louder = apply_gain(&buf, 12.0).unwrap();
    let report = detect_peaks(&louder, -60.0).unwrap();
    assert_eq!(report.count, 0);
    assert!(report.positions_ms.is_empty());
}

#[test]
fn test_peak_positions_are_capped() {
    let buf = AudioBuffer::new(1000, 1, SampleFormat::I16, vec![30000.0; 1000]).unwrap();
    let report = detect_peaks(&buf, -1.0).unwrap();
    assert_eq!(report.count, 1000);
    assert_eq!(report.positions_ms.len(), 50);
    assert_eq!(report.positions_ms[1], 20.0);
}

#[test]
fn test_clipping_and_rms_per_chunk() {
    let mut samples = vec![1000.0; 30];
    samples[15] = 32767.0;
    let buf = AudioBuffer::new(1000, 1, SampleFormat::I16, samples).unwrap();

    let clips = detect_clipping(&buf, -0.1, 10).unwrap();
    assert_eq!(clips.starts_ms, vec![10.0]);

    let rms = rms_over_time(&buf, 10).unwrap();
    assert_eq!(rms.values.len(), 3);
    assert!((rms.values[0] - 1000.0 / 32768.0).abs() < 1e-12);
    assert!(rms.values[1] > rms.values[0]);
}

#[test]
fn test_report_json_is_tagged() {
    let buf = AudioBuffer::silent(1000, 1, SampleFormat::I16, 10).unwrap();
    let report = AnalysisReport::Peaks(detect_peaks(&buf, -1.0).unwrap());
    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["kind"], "peaks");
    assert_eq!(json["count"], 0);
}
