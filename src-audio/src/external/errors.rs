// ============================================================================
// Dispatcher Error Types
// ============================================================================

/// Errors raised while building or running an external host command
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    /// Template is empty, lacks an input/output placeholder, or the command
    /// line cannot be tokenized
    #[error("invalid command template: {0}")]
    Template(String),

    /// The child did not finish in time and was killed
    #[error("external host timed out after {seconds:.1} s")]
    Timeout { seconds: f64 },

    /// The child exited unsuccessfully; `None` when killed by a signal
    #[error("external host failed with exit code {code:?}")]
    NonZeroExit { code: Option<i32> },

    /// The program could not be started
    #[error("failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("I/O error while supervising external host: {0}")]
    Io(#[from] std::io::Error),
}

pub type DispatchResult<T> = Result<T, DispatchError>;
