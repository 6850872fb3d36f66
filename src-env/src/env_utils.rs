//! Environment variable utilities for Audio Max
//!
//! This module resolves the directory where processed audio and external
//! host outputs are written. `AMAX_TMP_DIR` overrides the default location
//! (`<system temp>/audio_max`).

use crate::constants::{ENV_TMP_DIR, TEMP_SUBDIR};
use std::env;
use std::path::{Path, PathBuf};

/// Error type for environment variable issues
#[derive(Debug, thiserror::Error)]
pub enum EnvError {
    #[error("AMAX_TMP_DIR is set but empty")]
    EmptyTempOverride,

    #[error("Temp root exists but is not a directory: {0}")]
    TempRootNotADirectory(PathBuf),

    #[error("Failed to create temp directory {path}: {source}")]
    TempRootCreationFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Resolve the temp root from an optional override value
///
/// `None` falls back to `<system temp>/audio_max`. An override that is
/// present but blank is rejected rather than silently ignored.
pub fn temp_root_from(override_value: Option<&str>) -> Result<PathBuf, EnvError> {
    match override_value {
        Some(value) if value.trim().is_empty() => Err(EnvError::EmptyTempOverride),
        Some(value) => Ok(PathBuf::from(value)),
        None => Ok(env::temp_dir().join(TEMP_SUBDIR)),
    }
}

/// Get the temp root, honoring `AMAX_TMP_DIR`
///
/// # Example
///
/// ```no_run
/// use amax_env::env_utils::temp_root;
///
/// let root = temp_root()?;
/// println!("Processed files go to {}", root.display());
/// # Ok::<(), amax_env::env_utils::EnvError>(())
/// ```
pub fn temp_root() -> Result<PathBuf, EnvError> {
    let value = env::var(ENV_TMP_DIR).ok();
    temp_root_from(value.as_deref())
}

/// Create `path` (and parents) if needed and check it is a directory
pub fn ensure_dir(path: &Path) -> Result<PathBuf, EnvError> {
    if path.exists() {
        if !path.is_dir() {
            return Err(EnvError::TempRootNotADirectory(path.to_path_buf()));
        }
        return Ok(path.to_path_buf());
    }

    std::fs::create_dir_all(path).map_err(|source| EnvError::TempRootCreationFailed {
        path: path.to_path_buf(),
        source,
    })?;
    log::debug!("created temp directory {}", path.display());
    Ok(path.to_path_buf())
}

/// Get the temp root, creating it if necessary
pub fn ensure_temp_root() -> Result<PathBuf, EnvError> {
    let root = temp_root()?;
    ensure_dir(&root)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_temp_root() {
        let root = temp_root_from(None).unwrap();
        assert!(root.starts_with(env::temp_dir()));
        assert!(root.ends_with(TEMP_SUBDIR));
    }

    #[test]
    fn test_override_temp_root() {
        let root = temp_root_from(Some("/srv/amax")).unwrap();
        assert_eq!(root, PathBuf::from("/srv/amax"));
    }

    #[test]
    fn test_blank_override_rejected() {
        assert!(matches!(
            temp_root_from(Some("  ")),
            Err(EnvError::EmptyTempOverride)
        ));
    }

    #[test]
    fn test_ensure_dir_creates_nested() {
        let scratch = tempfile::tempdir().unwrap();
        let nested = scratch.path().join("a").join("b");
        let created = ensure_dir(&nested).unwrap();
        assert!(created.is_dir());
        // second call is a no-op
        assert_eq!(ensure_dir(&nested).unwrap(), nested);
    }

    #[test]
    fn test_ensure_dir_rejects_file() {
        let scratch = tempfile::tempdir().unwrap();
        let file = scratch.path().join("not_a_dir");
        std::fs::write(&file, b"x").unwrap();
        assert!(matches!(
            ensure_dir(&file),
            Err(EnvError::TempRootNotADirectory(_))
        ));
    }
}
