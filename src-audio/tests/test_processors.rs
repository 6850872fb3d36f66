// Integration tests for the offline processors

use amax_audio::signals::{gen_tone, replicate_mono};
use amax_audio::{
    AudioBuffer, Capabilities, EqBandSpec, Operation, SampleFormat, apply_chain, apply_delay,
    apply_eq_10band, apply_fade, apply_gain, apply_reverb_simple, normalize,
};

fn stereo_tone(freq: f64, amp: f64, format: SampleFormat) -> AudioBuffer {
    let mono = gen_tone(freq, amp, 44100, 0.25);
    AudioBuffer::from_normalized(44100, 2, format, &replicate_mono(&mono, 2)).unwrap()
}

#[test]
fn test_gain_round_trip_within_one_step() {
    let buf = stereo_tone(440.0, 0.3, SampleFormat::I16);
    for db in [1.5, 6.0, 9.0] {
        let back = apply_gain(&apply_gain(&buf, db).unwrap(), -db).unwrap();
        assert_eq!(back.frame_count(), buf.frame_count());
        let worst = buf
            .samples()
            .iter()
            .zip(back.samples())
            .map(|(a, b)| (a - b).abs())
            .fold(0.0_f64, f64::max);
        assert!(worst <= 1.0, "{} dB: max deviation {}", db, worst);
    }
}

#[test]
fn test_normalize_is_idempotent() {
    for format in [SampleFormat::I16, SampleFormat::I24, SampleFormat::F32] {
        let buf = stereo_tone(1000.0, 0.2, format);
        let once = normalize(&buf).unwrap();
        assert_eq!(once.peak(), format.max_value());
        assert_eq!(normalize(&once).unwrap(), once, "{:?}", format);
    }
}

#[test]
fn test_zero_fades_are_identity() {
    let buf = stereo_tone(220.0, 0.5, SampleFormat::I16);
    assert_eq!(apply_fade(&buf, 0.0, 0.0).unwrap(), buf);
}

#[test]
fn test_fade_ramps_start_and_end() {
    let buf = AudioBuffer::new(1000, 1, SampleFormat::I16, vec![1000.0; 100]).unwrap();
    let out = apply_fade(&buf, 10.0, 10.0).unwrap();
    let s = out.samples();
    assert_eq!(s[0], 0.0);
    assert_eq!(s[5], 500.0);
    assert_eq!(s[50], 1000.0);
    assert_eq!(s[99], 0.0);
}

#[test]
fn test_flat_eq_is_bit_identical() {
    let buf = stereo_tone(1000.0, 0.5, SampleFormat::I16);
    let bands = EqBandSpec::from_gains([0.0; 10]);
    assert_eq!(apply_eq_10band(&buf, &bands).unwrap(), buf);
}

#[test]
fn test_delay_and_reverb_extend_output() {
    let buf = AudioBuffer::silent(1000, 2, SampleFormat::I16, 100).unwrap();
    assert_eq!(apply_delay(&buf, 50.0, 2).unwrap().frame_count(), 200);
    assert_eq!(apply_reverb_simple(&buf).unwrap().frame_count(), 300);
}

#[test]
fn test_chain_runs_in_order() {
    let buf = AudioBuffer::new(1000, 1, SampleFormat::I16, vec![1000.0, -2000.0, 500.0]).unwrap();
    let ops: Vec<Operation> =
        serde_json::from_str(r#"[{"op": "normalize"}, {"op": "gain", "db": 0.0}]"#).unwrap();
    let caps = Capabilities::none();
    let out = apply_chain(&buf, &ops, &caps).unwrap();
    assert_eq!(out, normalize(&buf).unwrap());
    assert_eq!(apply_chain(&buf, &[], &caps).unwrap(), buf);
}

#[test]
fn test_denoise_without_reducer_copies_input() {
    let buf = stereo_tone(440.0, 0.3, SampleFormat::I16);
    let out = Operation::Denoise.apply(&buf, &Capabilities::none()).unwrap();
    assert_eq!(out, buf);
}
