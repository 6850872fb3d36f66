// ============================================================================
// Add-on Preferences
// ============================================================================
//
// Read-only configuration consumed by the processing core: the external
// command template, a default plugin path and the external process timeout.
// Stored as YAML; every field has a default so partial files are accepted.

use crate::constants::{
    DEFAULT_COMMAND_TEMPLATE, DEFAULT_TIMEOUT_SECONDS, ENV_CONFIG, MAX_TIMEOUT_SECONDS,
    MIN_TIMEOUT_SECONDS,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Errors raised while loading or validating preferences
#[derive(Debug, thiserror::Error)]
pub enum PrefsError {
    #[error("timeout must be between {min} and {max} seconds, got {value}")]
    InvalidTimeout { value: u64, min: u64, max: u64 },

    #[error("invalid preferences file: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("failed to read preferences {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type PrefsResult<T> = Result<T, PrefsError>;

fn default_command_template() -> String {
    DEFAULT_COMMAND_TEMPLATE.to_string()
}

fn default_timeout_seconds() -> u64 {
    DEFAULT_TIMEOUT_SECONDS
}

/// External processing preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Preferences {
    /// Command template, e.g. `{host} --input {input} --output {output}`
    #[serde(default = "default_command_template")]
    pub command_template: String,

    /// Plugin path used when the caller does not name one
    #[serde(default)]
    pub default_plugin_path: String,

    /// External process timeout (10..=3600 seconds)
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,

    /// Install optional dependencies on startup (not used by the core)
    #[serde(default)]
    pub auto_install_dependencies: bool,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            command_template: default_command_template(),
            default_plugin_path: String::new(),
            timeout_seconds: default_timeout_seconds(),
            auto_install_dependencies: false,
        }
    }
}

impl Preferences {
    /// Check value ranges
    pub fn validate(&self) -> PrefsResult<()> {
        if !(MIN_TIMEOUT_SECONDS..=MAX_TIMEOUT_SECONDS).contains(&self.timeout_seconds) {
            return Err(PrefsError::InvalidTimeout {
                value: self.timeout_seconds,
                min: MIN_TIMEOUT_SECONDS,
                max: MAX_TIMEOUT_SECONDS,
            });
        }
        Ok(())
    }

    /// Timeout as a `Duration`
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    /// Plugin path, if one is configured
    pub fn plugin_path(&self) -> Option<&str> {
        let trimmed = self.default_plugin_path.trim();
        (!trimmed.is_empty()).then_some(trimmed)
    }

    /// Parse and validate preferences from YAML text
    pub fn from_yaml_str(text: &str) -> PrefsResult<Self> {
        let prefs: Preferences = serde_yaml::from_str(text)?;
        prefs.validate()?;
        Ok(prefs)
    }

    /// Load and validate preferences from a YAML file
    pub fn load_from_path(path: &Path) -> PrefsResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| PrefsError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let prefs = Self::from_yaml_str(&text)?;
        log::debug!("loaded preferences from {}", path.display());
        Ok(prefs)
    }

    /// Load from `AMAX_CONFIG` when set, defaults otherwise
    pub fn load() -> PrefsResult<Self> {
        match std::env::var_os(ENV_CONFIG) {
            Some(path) if !path.is_empty() => Self::load_from_path(Path::new(&path)),
            _ => Ok(Self::default()),
        }
    }

    /// Serialize to YAML
    pub fn to_yaml(&self) -> PrefsResult<String> {
        Ok(serde_yaml::to_string(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let prefs = Preferences::default();
        assert!(prefs.validate().is_ok());
        assert_eq!(prefs.timeout(), Duration::from_secs(120));
        assert_eq!(prefs.command_template, "{host} {input} {output}");
        assert!(prefs.plugin_path().is_none());
    }

    #[test]
    fn test_partial_yaml_uses_defaults() {
        let prefs = Preferences::from_yaml_str("timeout_seconds: 300\n").unwrap();
        assert_eq!(prefs.timeout_seconds, 300);
        assert_eq!(prefs.command_template, DEFAULT_COMMAND_TEMPLATE);
        assert!(!prefs.auto_install_dependencies);
    }

    #[test]
    fn test_timeout_range_enforced() {
        for bad in [0_u64, 9, 3601] {
            let yaml = format!("timeout_seconds: {}\n", bad);
            assert!(matches!(
                Preferences::from_yaml_str(&yaml),
                Err(PrefsError::InvalidTimeout { .. })
            ));
        }
        for good in [10_u64, 3600] {
            let yaml = format!("timeout_seconds: {}\n", good);
            assert!(Preferences::from_yaml_str(&yaml).is_ok());
        }
    }

    #[test]
    fn test_plugin_path_trimmed() {
        let prefs = Preferences {
            default_plugin_path: "  /opt/vst/eq.so ".to_string(),
            ..Default::default()
        };
        assert_eq!(prefs.plugin_path(), Some("/opt/vst/eq.so"));
    }

    #[test]
    fn test_yaml_roundtrip_through_file() {
        let scratch = tempfile::tempdir().unwrap();
        let path = scratch.path().join("prefs.yaml");
        let prefs = Preferences {
            command_template: "{host} -batchconvert {input} {output}".to_string(),
            timeout_seconds: 600,
            ..Default::default()
        };
        std::fs::write(&path, prefs.to_yaml().unwrap()).unwrap();
        assert_eq!(Preferences::load_from_path(&path).unwrap(), prefs);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = Preferences::load_from_path(Path::new("/no/such/prefs.yaml")).unwrap_err();
        assert!(matches!(err, PrefsError::Io { .. }));
    }
}
