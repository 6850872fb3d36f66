// ============================================================================
// External Command Request
// ============================================================================

use super::errors::DispatchResult;
use super::process::{DispatchState, ExecutionReport, execute, log_transition};
use super::template::{CommandTemplate, PlaceholderValues, Platform};
use amax_env::constants::DEFAULT_TIMEOUT_SECONDS;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Everything needed to run a host on one file
#[derive(Debug, Clone, PartialEq)]
pub struct ExternalCommandRequest {
    pub template: String,
    pub executable_path: PathBuf,
    pub input_path: PathBuf,
    pub output_path: PathBuf,
    pub plugin_path: Option<PathBuf>,
    pub preset_path: Option<PathBuf>,
    pub timeout: Duration,
    pub use_shell_heuristic: bool,
}

impl ExternalCommandRequest {
    /// Create a request with the default timeout and the shell heuristic on
    pub fn new(
        template: impl Into<String>,
        executable_path: impl Into<PathBuf>,
        input_path: impl Into<PathBuf>,
        output_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            template: template.into(),
            executable_path: executable_path.into(),
            input_path: input_path.into(),
            output_path: output_path.into(),
            plugin_path: None,
            preset_path: None,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECONDS),
            use_shell_heuristic: true,
        }
    }

    pub fn with_plugin(mut self, plugin: Option<PathBuf>) -> Self {
        self.plugin_path = plugin;
        self
    }

    pub fn with_preset(mut self, preset: Option<PathBuf>) -> Self {
        self.preset_path = preset;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_shell_heuristic(mut self, enabled: bool) -> Self {
        self.use_shell_heuristic = enabled;
        self
    }

    /// Check the template before anything is spawned
    pub fn validate(&self) -> DispatchResult<CommandTemplate> {
        CommandTemplate::parse(&self.template)
    }

    pub fn placeholder_values(&self) -> DispatchResult<PlaceholderValues> {
        PlaceholderValues::from_paths(
            &self.executable_path,
            &self.input_path,
            &self.output_path,
            self.plugin_path.as_deref(),
            self.preset_path.as_deref(),
        )
    }

    /// Render the command line for `platform`
    pub fn build_for(&self, platform: Platform) -> DispatchResult<String> {
        let template = self.validate()?;
        log_transition(DispatchState::Built, DispatchState::Validated);
        Ok(template.render(&self.placeholder_values()?, platform))
    }

    /// Render the command line for the running platform
    pub fn build(&self) -> DispatchResult<String> {
        self.build_for(Platform::current())
    }

    /// Validate, build and execute
    pub fn run(&self) -> DispatchResult<ExecutionReport> {
        let command = self.build()?;
        execute(&command, self.use_shell_heuristic, self.timeout)
    }

    /// Declared output location
    pub fn output(&self) -> &Path {
        &self.output_path
    }
}
