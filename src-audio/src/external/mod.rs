// ============================================================================
// External Host Dispatch
// ============================================================================
//
// Hands audio to an external plugin host: build a quoted command line from a
// template, run it with a timeout, and report what happened. Discovering
// which hosts are installed lives in `hosts`.

mod errors;
pub mod hosts;
mod process;
mod request;
mod template;

pub use errors::{DispatchError, DispatchResult};
pub use hosts::{HostPriority, HostSnapshot, classify_host, default_template, discover_hosts, rank_hosts};
pub use process::{DispatchState, ExecutionReport, SHELL_OPERATORS, execute, wants_shell};
pub use request::ExternalCommandRequest;
pub use template::{
    CommandTemplate, PlaceholderValues, Platform, build_command, build_command_for, quote_path,
};
