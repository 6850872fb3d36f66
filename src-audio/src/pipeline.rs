// ============================================================================
// File Pipeline
// ============================================================================
//
// load -> process -> export, and the hand-off to an external host:
// the buffer is written to a scratch input directory, the host is run, and
// its declared output is checked and decoded.

use crate::buffer::AudioBuffer;
use crate::codec::{decode_file, encode_wav, output_path_for};
use crate::errors::{ProcessingError, ProcessingResult};
use crate::external::{
    CommandTemplate, DispatchError, ExecutionReport, ExternalCommandRequest,
};
use amax_env::env_utils::ensure_dir;
use amax_env::{EnvError, Preferences};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Errors raised by the file pipeline
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error(transparent)]
    Processing(#[from] ProcessingError),

    #[error(transparent)]
    Dispatch(#[from] DispatchError),

    #[error(transparent)]
    Env(#[from] EnvError),

    /// The host exited successfully without writing its output
    #[error("external host produced no output at {0}")]
    MissingOutput(PathBuf),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type PipelineResult<T> = Result<T, PipelineError>;

/// Decode `source`, apply `op`, and write exactly one new WAV into `out_dir`
///
/// # Returns
/// Path of the written file
pub fn process_file<F>(source: &Path, out_dir: &Path, op: F) -> PipelineResult<PathBuf>
where
    F: FnOnce(&AudioBuffer) -> ProcessingResult<AudioBuffer>,
{
    let input = decode_file(source)?;
    let output = op(&input)?;
    ensure_dir(out_dir)?;
    let path = output_path_for(source, out_dir);
    encode_wav(&output, &path)?;
    log::info!("{} -> {}", source.display(), path.display());
    Ok(path)
}

/// Host invocation settings for [`run_external`]
#[derive(Debug, Clone, PartialEq)]
pub struct ExternalJob {
    pub host: PathBuf,
    pub template: String,
    pub plugin: Option<PathBuf>,
    pub preset: Option<PathBuf>,
    pub timeout: Duration,
    pub use_shell_heuristic: bool,
}

impl ExternalJob {
    /// Settings from preferences: template, default plugin and timeout
    pub fn from_prefs(host: impl Into<PathBuf>, prefs: &Preferences) -> Self {
        Self {
            host: host.into(),
            template: prefs.command_template.clone(),
            plugin: prefs.plugin_path().map(PathBuf::from),
            preset: None,
            timeout: prefs.timeout(),
            use_shell_heuristic: true,
        }
    }

    pub fn with_template(mut self, template: impl Into<String>) -> Self {
        self.template = template.into();
        self
    }

    /// Replace the plugin; `None` keeps the current one
    pub fn with_plugin(mut self, plugin: Option<PathBuf>) -> Self {
        if plugin.is_some() {
            self.plugin = plugin;
        }
        self
    }

    pub fn with_preset(mut self, preset: Option<PathBuf>) -> Self {
        self.preset = preset;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Result of a successful external run
#[derive(Debug, Clone)]
pub struct ExternalOutput {
    /// Kept directory holding the host's output; owned by the caller
    pub output_dir: PathBuf,
    pub output_path: PathBuf,
    pub buffer: AudioBuffer,
    pub report: ExecutionReport,
}

/// Run `buffer` through an external host
///
/// Scratch directories are created under `work_root`. The input directory
/// is removed when this returns. The output directory is kept only when the
/// host's output decodes; on any failure both are removed.
///
/// # Errors
/// `Dispatch` for template, spawn, exit-code and timeout failures;
/// `MissingOutput` when the host exits cleanly without writing its output.
pub fn run_external(
    buffer: &AudioBuffer,
    job: &ExternalJob,
    work_root: &Path,
) -> PipelineResult<ExternalOutput> {
    // reject bad templates before touching the disk
    CommandTemplate::parse(&job.template)?;
    ensure_dir(work_root)?;

    let input_dir = tempfile::Builder::new()
        .prefix("amax_in_")
        .tempdir_in(work_root)?;
    let input_path = input_dir.path().join("input.wav");
    encode_wav(buffer, &input_path)?;

    let output_dir = tempfile::Builder::new()
        .prefix("amax_out_")
        .tempdir_in(work_root)?;
    let output_path = output_dir.path().join("output.wav");

    let request = ExternalCommandRequest::new(
        job.template.clone(),
        job.host.clone(),
        input_path,
        output_path.clone(),
    )
    .with_plugin(job.plugin.clone())
    .with_preset(job.preset.clone())
    .with_timeout(job.timeout)
    .with_shell_heuristic(job.use_shell_heuristic);

    let report = request.run()?;
    if !output_path.is_file() {
        return Err(PipelineError::MissingOutput(output_path));
    }
    let processed = decode_file(&output_path)?;
    let output_dir = output_dir.keep();
    log::info!(
        "external host finished in {:.2} s, output {}",
        report.elapsed.as_secs_f64(),
        output_path.display()
    );

    Ok(ExternalOutput {
        output_dir,
        output_path,
        buffer: processed,
        report,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::SampleFormat;

    #[test]
    fn test_job_from_prefs() {
        let prefs = Preferences {
            default_plugin_path: "/vst/eq.so".to_string(),
            timeout_seconds: 30,
            ..Default::default()
        };
        let job = ExternalJob::from_prefs("/usr/bin/carla", &prefs);
        assert_eq!(job.plugin, Some(PathBuf::from("/vst/eq.so")));
        assert_eq!(job.timeout, Duration::from_secs(30));
        assert_eq!(job.template, "{host} {input} {output}");

        let job = job.with_plugin(None);
        assert_eq!(job.plugin, Some(PathBuf::from("/vst/eq.so")));
        let job = job.with_plugin(Some(PathBuf::from("/vst/comp.so")));
        assert_eq!(job.plugin, Some(PathBuf::from("/vst/comp.so")));
    }

    #[test]
    fn test_bad_template_writes_nothing() {
        let scratch = tempfile::tempdir().unwrap();
        let buf = AudioBuffer::silent(8000, 1, SampleFormat::I16, 8).unwrap();
        let job = ExternalJob::from_prefs("/bin/true", &Preferences::default())
            .with_template("{host} {input}");
        assert!(matches!(
            run_external(&buf, &job, scratch.path()),
            Err(PipelineError::Dispatch(DispatchError::Template(_)))
        ));
        assert_eq!(std::fs::read_dir(scratch.path()).unwrap().count(), 0);
    }

    #[cfg(unix)]
    #[test]
    fn test_failed_run_leaves_no_scratch_dirs() {
        let Ok(host) = which::which("false") else {
            return;
        };
        let scratch = tempfile::tempdir().unwrap();
        let buf = AudioBuffer::silent(8000, 1, SampleFormat::I16, 8).unwrap();
        let job = ExternalJob::from_prefs(host, &Preferences::default());
        assert!(run_external(&buf, &job, scratch.path()).is_err());
        assert_eq!(std::fs::read_dir(scratch.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_process_file_writes_one_output() {
        let scratch = tempfile::tempdir().unwrap();
        let source = scratch.path().join("source.wav");
        let buf = AudioBuffer::new(8000, 1, SampleFormat::I16, vec![100.0, -100.0, 50.0]).unwrap();
        encode_wav(&buf, &source).unwrap();

        let out_dir = scratch.path().join("out");
        let written = process_file(&source, &out_dir, |b| Ok(b.map_samples(|x| x * 2.0))).unwrap();
        assert_eq!(written, out_dir.join("source.wav"));
        assert_eq!(decode_file(&written).unwrap().samples(), &[200.0, -200.0, 100.0]);

        let again = process_file(&source, &out_dir, |b| Ok(b.clone())).unwrap();
        assert_ne!(again, written);
        assert_eq!(std::fs::read_dir(&out_dir).unwrap().count(), 2);
    }

    #[test]
    fn test_process_file_propagates_decode_error() {
        let scratch = tempfile::tempdir().unwrap();
        let err = process_file(&scratch.path().join("missing.wav"), scratch.path(), |b| {
            Ok(b.clone())
        })
        .unwrap_err();
        assert!(matches!(
            err,
            PipelineError::Processing(ProcessingError::Decode { .. })
        ));
    }
}
