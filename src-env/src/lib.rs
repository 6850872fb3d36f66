//! Environment utilities and preferences for Audio Max
//!
//! - [`env_utils`]: temp directory resolution (`AMAX_TMP_DIR`)
//! - [`prefs`]: the add-on preferences consumed by the processing core

pub mod constants;
pub mod env_utils;
pub mod prefs;

pub use env_utils::{EnvError, ensure_temp_root, temp_root};
pub use prefs::{Preferences, PrefsError};
