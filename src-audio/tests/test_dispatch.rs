// Integration tests for external command dispatch

use amax_audio::external::{PlaceholderValues, Platform, build_command_for};
use amax_audio::{DispatchError, ExternalCommandRequest, build_command, execute};

#[test]
fn test_posix_quoting() {
    let values = PlaceholderValues {
        host: "/usr/bin/carla".to_string(),
        input: "/tmp/my song.wav".to_string(),
        output: "/tmp/out.wav".to_string(),
        plugin: Some("/vst/it's.so".to_string()),
        preset: None,
    };
    let command = build_command_for(
        "{host} --plugin {plugin} --preset {preset} {in} {out}",
        &values,
        Platform::Posix,
    )
    .unwrap();
    assert_eq!(
        command,
        "/usr/bin/carla --plugin '/vst/it'\"'\"'s.so' --preset  '/tmp/my song.wav' /tmp/out.wav"
    );
}

#[test]
fn test_windows_quoting() {
    let values = PlaceholderValues {
        host: r"C:\Program Files\Host\host.exe".to_string(),
        input: r"C:\in.wav".to_string(),
        output: r"C:\out.wav".to_string(),
        ..Default::default()
    };
    let command = build_command_for("{host} {input} {output}", &values, Platform::Windows).unwrap();
    assert_eq!(
        command,
        r#""C:\Program Files\Host\host.exe" "C:\in.wav" "C:\out.wav""#
    );
}

#[test]
fn test_missing_output_placeholder_fails_before_spawn() {
    let request = ExternalCommandRequest::new(
        "{host} {input}",
        "/definitely/not/a/host",
        "/tmp/in.wav",
        "/tmp/out.wav",
    );
    assert!(matches!(request.run(), Err(DispatchError::Template(_))));
}

#[cfg(unix)]
mod unix {
    use super::*;
    use std::time::{Duration, Instant};

    #[test]
    fn test_build_command_quotes_paths() {
        let values = PlaceholderValues {
            host: "/opt/my host/run".to_string(),
            input: "/tmp/a b.wav".to_string(),
            output: "/tmp/out.wav".to_string(),
            ..Default::default()
        };
        let command = build_command("{host} {input} {output}", &values).unwrap();
        assert_eq!(command, "'/opt/my host/run' '/tmp/a b.wav' /tmp/out.wav");
        assert_eq!(
            shlex::split(&command).unwrap(),
            vec!["/opt/my host/run", "/tmp/a b.wav", "/tmp/out.wav"]
        );
    }

    #[test]
    fn test_timeout_kills_direct_process() {
        let start = Instant::now();
        let err = execute("sleep 5", true, Duration::from_secs(1)).unwrap_err();
        assert!(matches!(err, DispatchError::Timeout { .. }), "{:?}", err);
        assert!(start.elapsed() < Duration::from_secs(3));
    }

    #[test]
    fn test_timeout_kills_shell_pipeline() {
        let start = Instant::now();
        let err = execute("sleep 5 | cat", true, Duration::from_secs(1)).unwrap_err();
        assert!(matches!(err, DispatchError::Timeout { .. }), "{:?}", err);
        assert!(start.elapsed() < Duration::from_secs(3));
    }

    #[test]
    fn test_non_zero_exit() {
        let err = execute("false", true, Duration::from_secs(10)).unwrap_err();
        assert!(matches!(err, DispatchError::NonZeroExit { code: Some(1) }), "{:?}", err);
    }

    #[test]
    fn test_missing_program_is_spawn_error() {
        let err = execute("/nonexistent/amax-host a b", true, Duration::from_secs(10)).unwrap_err();
        assert!(matches!(err, DispatchError::Spawn { .. }), "{:?}", err);
    }

    #[test]
    fn test_success_report() {
        let report = execute("true", true, Duration::from_secs(10)).unwrap();
        assert!(!report.used_shell);
        let report = execute("true && true", true, Duration::from_secs(10)).unwrap();
        assert!(report.used_shell);
    }
}
