// ============================================================================
// Error Types
// ============================================================================

use std::path::PathBuf;

/// Errors raised by buffer construction, processors, analyzers and the codec
#[derive(Debug, thiserror::Error)]
pub enum ProcessingError {
    /// Source file missing, corrupt or in an unsupported container/codec
    #[error("failed to decode {path}: {reason}")]
    Decode { path: PathBuf, reason: String },

    /// Output file could not be written
    #[error("failed to encode {path}: {reason}")]
    Encode { path: PathBuf, reason: String },

    /// Caller-supplied parameter outside its valid range
    #[error("invalid parameter `{name}`: {reason}")]
    Parameter { name: &'static str, reason: String },

    /// Optional numeric engine is not installed
    #[error("capability unavailable: {0}")]
    CapabilityUnavailable(&'static str),

    /// Optional numeric engine is installed but failed
    #[error("capability failed: {0}")]
    CapabilityFailed(String),

    /// No equalizer band could be designed for this sample rate
    #[error("all {attempted} active equalizer bands failed to design")]
    AllBandsFailed { attempted: usize },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ProcessingError {
    pub(crate) fn parameter(name: &'static str, reason: impl Into<String>) -> Self {
        ProcessingError::Parameter {
            name,
            reason: reason.into(),
        }
    }
}

pub type ProcessingResult<T> = Result<T, ProcessingError>;

/// Reject NaN and infinities for a named parameter
pub(crate) fn require_finite(name: &'static str, value: f64) -> ProcessingResult<f64> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(ProcessingError::parameter(name, format!("must be finite, got {}", value)))
    }
}

/// Reject negative or non-finite durations
pub(crate) fn require_duration_ms(name: &'static str, value: f64) -> ProcessingResult<f64> {
    let value = require_finite(name, value)?;
    if value < 0.0 {
        return Err(ProcessingError::parameter(
            name,
            format!("must not be negative, got {} ms", value),
        ));
    }
    Ok(value)
}

/// Reject zero chunk/window lengths
pub(crate) fn require_nonzero_ms(name: &'static str, value: u32) -> ProcessingResult<u32> {
    if value == 0 {
        return Err(ProcessingError::parameter(name, "must be at least 1 ms"));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parameter_message_names_the_parameter() {
        let err = ProcessingError::parameter("chunk_ms", "must be at least 1 ms");
        assert_eq!(
            err.to_string(),
            "invalid parameter `chunk_ms`: must be at least 1 ms"
        );
    }

    #[test]
    fn test_duration_validation() {
        assert_eq!(require_duration_ms("fade_in_ms", 0.0).unwrap(), 0.0);
        assert!(require_duration_ms("fade_in_ms", -1.0).is_err());
        assert!(require_duration_ms("fade_in_ms", f64::NAN).is_err());
        assert!(require_nonzero_ms("chunk_ms", 0).is_err());
        assert_eq!(require_nonzero_ms("chunk_ms", 5).unwrap(), 5);
    }
}
