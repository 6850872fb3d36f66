//! Shared names and limits

/// Environment variable overriding the temp root used for processed files
pub const ENV_TMP_DIR: &str = "AMAX_TMP_DIR";

/// Environment variable pointing at a YAML preferences file
pub const ENV_CONFIG: &str = "AMAX_CONFIG";

/// Sub-directory created under the system temp dir when no override is set
pub const TEMP_SUBDIR: &str = "audio_max";

/// Default external command template
pub const DEFAULT_COMMAND_TEMPLATE: &str = "{host} {input} {output}";

/// Default external process timeout in seconds
pub const DEFAULT_TIMEOUT_SECONDS: u64 = 120;

/// Smallest timeout the preferences accept
pub const MIN_TIMEOUT_SECONDS: u64 = 10;

/// Largest timeout the preferences accept
pub const MAX_TIMEOUT_SECONDS: u64 = 3600;
