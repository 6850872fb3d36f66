// ============================================================================
// External Process Execution
// ============================================================================
//
// Runs a rendered command line, either directly (POSIX tokenization) or
// through the platform shell, and supervises it until it exits or the
// timeout expires. On timeout the child is killed (on Unix together with
// its whole process group, so shell pipelines die too) and reaped.

use super::errors::{DispatchError, DispatchResult};
use super::template::Platform;
use std::process::{Child, Command, ExitStatus};
use std::thread;
use std::time::{Duration, Instant};

/// Substrings that send a command through the shell
pub const SHELL_OPERATORS: [&str; 3] = [";", "|", "&&"];

/// Upper bound between two `try_wait` polls
const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Lifecycle of one dispatch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchState {
    Built,
    Validated,
    Spawned,
    Completed,
    TimedOut,
    NonZeroExit,
    SpawnFailed,
}

impl DispatchState {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            DispatchState::Completed
                | DispatchState::TimedOut
                | DispatchState::NonZeroExit
                | DispatchState::SpawnFailed
        )
    }
}

pub(crate) fn log_transition(from: DispatchState, to: DispatchState) {
    log::debug!("dispatch: {:?} -> {:?}", from, to);
}

/// Outcome of a successful run
#[derive(Debug, Clone)]
pub struct ExecutionReport {
    pub command: String,
    pub used_shell: bool,
    pub elapsed: Duration,
    pub state: DispatchState,
}

/// Whether `command` should run through the shell
pub fn wants_shell(command: &str, platform: Platform) -> bool {
    platform == Platform::Windows || SHELL_OPERATORS.iter().any(|op| command.contains(op))
}

#[cfg(windows)]
fn shell_command(command: &str) -> (String, Command) {
    use std::os::windows::process::CommandExt;
    // cmd strips one pair of outer quotes after /C, so wrap the line and
    // pass it verbatim instead of letting std escape embedded quotes
    let mut cmd = Command::new("cmd");
    cmd.arg("/C").raw_arg(format!("\"{}\"", command));
    ("cmd".to_string(), cmd)
}

#[cfg(not(windows))]
fn shell_command(command: &str) -> (String, Command) {
    let mut cmd = Command::new("sh");
    cmd.arg("-c").arg(command);
    ("sh".to_string(), cmd)
}

fn direct_command(command: &str) -> DispatchResult<(String, Command)> {
    let tokens = shlex::split(command).ok_or_else(|| {
        DispatchError::Template(format!("cannot tokenize command: {}", command))
    })?;
    let (program, args) = tokens
        .split_first()
        .ok_or_else(|| DispatchError::Template("command is empty".to_string()))?;
    let mut cmd = Command::new(program);
    cmd.args(args);
    Ok((program.clone(), cmd))
}

#[cfg(unix)]
fn isolate(cmd: &mut Command) {
    use std::os::unix::process::CommandExt;
    cmd.process_group(0);
}

#[cfg(not(unix))]
fn isolate(_cmd: &mut Command) {}

/// Kill the child (and its process group on Unix), then reap it
fn terminate(child: &mut Child) {
    #[cfg(unix)]
    {
        if let Ok(pid) = i32::try_from(child.id()) {
            // negative pid addresses the group created by `isolate`
            unsafe {
                libc::kill(-pid, libc::SIGKILL);
            }
        }
    }
    let _ = child.kill();
    if let Err(e) = child.wait() {
        log::warn!("failed to reap timed out process {}: {}", child.id(), e);
    }
}

/// Poll until the child exits or `timeout` elapses
fn wait_with_timeout(child: &mut Child, timeout: Duration) -> DispatchResult<Option<ExitStatus>> {
    let start = Instant::now();
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(Some(status));
        }
        let elapsed = start.elapsed();
        if elapsed >= timeout {
            return Ok(None);
        }
        thread::sleep(POLL_INTERVAL.min(timeout - elapsed));
    }
}

/// Run `command` and wait for it, at most `timeout`
///
/// With `use_shell_heuristic`, commands on Windows or containing `;`, `|`
/// or `&&` run through `cmd /C` / `sh -c`; everything else is tokenized
/// with POSIX rules and spawned directly. Standard streams are inherited.
///
/// Success only means the process exited with status 0; checking that it
/// produced its output is up to the caller.
pub fn execute(
    command: &str,
    use_shell_heuristic: bool,
    timeout: Duration,
) -> DispatchResult<ExecutionReport> {
    let used_shell = use_shell_heuristic && wants_shell(command, Platform::current());
    let (program, mut cmd) = if used_shell {
        shell_command(command)
    } else {
        direct_command(command)?
    };
    isolate(&mut cmd);

    log::info!(
        "running external host{}: {}",
        if used_shell { " (shell)" } else { "" },
        command
    );
    let start = Instant::now();
    let mut child = match cmd.spawn() {
        Ok(child) => child,
        Err(source) => {
            log_transition(DispatchState::Validated, DispatchState::SpawnFailed);
            return Err(DispatchError::Spawn { program, source });
        }
    };
    log_transition(DispatchState::Validated, DispatchState::Spawned);

    let status = match wait_with_timeout(&mut child, timeout) {
        Ok(status) => status,
        Err(e) => {
            terminate(&mut child);
            return Err(e);
        }
    };
    let Some(status) = status else {
        terminate(&mut child);
        log_transition(DispatchState::Spawned, DispatchState::TimedOut);
        log::warn!("external host killed after {:?}", timeout);
        return Err(DispatchError::Timeout {
            seconds: timeout.as_secs_f64(),
        });
    };

    if !status.success() {
        log_transition(DispatchState::Spawned, DispatchState::NonZeroExit);
        return Err(DispatchError::NonZeroExit {
            code: status.code(),
        });
    }

    log_transition(DispatchState::Spawned, DispatchState::Completed);
    Ok(ExecutionReport {
        command: command.to_string(),
        used_shell,
        elapsed: start.elapsed(),
        state: DispatchState::Completed,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shell_heuristic() {
        assert!(wants_shell("a | b", Platform::Posix));
        assert!(wants_shell("a; b", Platform::Posix));
        assert!(wants_shell("a && b", Platform::Posix));
        assert!(!wants_shell("a & b", Platform::Posix));
        assert!(!wants_shell("host 'in.wav' out.wav", Platform::Posix));
        assert!(wants_shell("host in.wav out.wav", Platform::Windows));
    }

    #[test]
    fn test_direct_command_tokenizes() {
        let (program, cmd) = direct_command("host 'a b.wav' c.wav").unwrap();
        assert_eq!(program, "host");
        let args: Vec<_> = cmd.get_args().map(|a| a.to_string_lossy().into_owned()).collect();
        assert_eq!(args, vec!["a b.wav", "c.wav"]);
    }

    #[test]
    fn test_untokenizable_or_empty_is_template_error() {
        assert!(matches!(direct_command("host 'unterminated"), Err(DispatchError::Template(_))));
        assert!(matches!(direct_command("   "), Err(DispatchError::Template(_))));
        assert!(matches!(
            execute("", false, Duration::from_secs(1)),
            Err(DispatchError::Template(_))
        ));
    }

    #[cfg(windows)]
    #[test]
    fn test_cmd_receives_quoted_paths_verbatim() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("in file.wav");
        let dst = dir.path().join("out file.wav");
        std::fs::write(&src, b"RIFF").unwrap();
        let command = format!("copy \"{}\" \"{}\"", src.display(), dst.display());
        let report = execute(&command, true, Duration::from_secs(10)).unwrap();
        assert!(report.used_shell);
        assert!(dst.exists());
    }

    #[cfg(not(windows))]
    #[test]
    fn test_shell_runs_operator_lines() {
        let dir = tempfile::tempdir().unwrap();
        let dst = dir.path().join("out file.wav");
        let command = format!("true && touch '{}'", dst.display());
        let report = execute(&command, true, Duration::from_secs(10)).unwrap();
        assert!(report.used_shell);
        assert!(dst.exists());
    }

    #[test]
    fn test_terminal_states() {
        assert!(DispatchState::Completed.is_terminal());
        assert!(DispatchState::SpawnFailed.is_terminal());
        assert!(!DispatchState::Spawned.is_terminal());
    }
}
