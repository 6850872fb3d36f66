// Integration tests for the file pipeline and external host round trips

use amax_audio::signals::{gen_tone, replicate_mono};
use amax_audio::{
    AudioBuffer, Capabilities, Operation, SampleFormat, decode_file, encode_wav, process_file,
};

fn tone_buffer() -> AudioBuffer {
    let mono = gen_tone(440.0, 0.4, 22050, 0.2);
    AudioBuffer::from_normalized(22050, 2, SampleFormat::I16, &replicate_mono(&mono, 2)).unwrap()
}

#[test]
fn test_process_file_with_operation() {
    let scratch = tempfile::tempdir().unwrap();
    let source = scratch.path().join("tone.wav");
    let buf = tone_buffer();
    encode_wav(&buf, &source).unwrap();

    let out_dir = scratch.path().join("out");
    let caps = Capabilities::none();
    let op = Operation::Gain { db: -6.0 };
    let written = process_file(&source, &out_dir, |b| op.apply(b, &caps)).unwrap();

    let decoded = decode_file(&written).unwrap();
    assert_eq!(decoded, op.apply(&buf, &caps).unwrap());
    // source untouched
    assert_eq!(decode_file(&source).unwrap(), buf);
}

#[cfg(unix)]
mod unix {
    use super::*;
    use amax_audio::{ExternalJob, PipelineError, run_external};
    use amax_env::Preferences;

    #[test]
    fn test_copy_host_round_trip() {
        let Ok(cp) = which::which("cp") else {
            return;
        };
        let scratch = tempfile::tempdir().unwrap();
        let buf = tone_buffer();
        let job = ExternalJob::from_prefs(cp, &Preferences::default());

        let result = run_external(&buf, &job, scratch.path()).unwrap();
        assert_eq!(result.buffer, buf);
        assert!(result.output_path.is_file());
        assert!(result.output_dir.starts_with(scratch.path()));
    }

    #[test]
    fn test_silent_host_is_missing_output() {
        let Ok(host) = which::which("true") else {
            return;
        };
        let scratch = tempfile::tempdir().unwrap();
        let job = ExternalJob::from_prefs(host, &Preferences::default());

        let err = run_external(&tone_buffer(), &job, scratch.path()).unwrap_err();
        assert!(matches!(err, PipelineError::MissingOutput(_)), "{:?}", err);
    }

    #[test]
    fn test_failing_host_is_dispatch_error() {
        let Ok(host) = which::which("false") else {
            return;
        };
        let scratch = tempfile::tempdir().unwrap();
        let job = ExternalJob::from_prefs(host, &Preferences::default());

        let err = run_external(&tone_buffer(), &job, scratch.path()).unwrap_err();
        assert!(
            matches!(
                err,
                PipelineError::Dispatch(amax_audio::DispatchError::NonZeroExit { .. })
            ),
            "{:?}",
            err
        );
        assert_eq!(std::fs::read_dir(scratch.path()).unwrap().count(), 0);
    }
}
