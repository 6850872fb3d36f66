//! Host executable registry
//!
//! Finds plugin host programs on `PATH` and in the platform's usual install
//! locations, ranks them by how well they suit batch processing, and
//! suggests a command template for each.

use std::cmp::Reverse;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Keywords recognized in host file names
pub const HOST_KEYWORDS: [&str; 14] = [
    "carla", "vsthost", "reajs", "yabridge", "host", "reaper", "fl", "ableton", "live", "studio",
    "bitwig", "ardour", "tracktion", "waveform",
];

const HIGH_PRIORITY: [&str; 5] = ["carla", "vsthost", "reajs", "yabridge", "host"];
const MEDIUM_PRIORITY: [&str; 1] = ["reaper"];
const LOW_PRIORITY: [&str; 8] = [
    "fl", "ableton", "live", "studio", "bitwig", "ardour", "tracktion", "waveform",
];

/// Directory depth searched below each base directory
const SCAN_DEPTH: usize = 3;

/// How well a host suits unattended processing
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum HostPriority {
    Unknown,
    Low,
    Medium,
    High,
}

fn file_name_lower(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_lowercase())
        .unwrap_or_default()
}

/// Priority from the file name
pub fn classify_host(path: &Path) -> HostPriority {
    let name = file_name_lower(path);
    if HIGH_PRIORITY.iter().any(|k| name.contains(k)) {
        HostPriority::High
    } else if MEDIUM_PRIORITY.iter().any(|k| name.contains(k)) {
        HostPriority::Medium
    } else if LOW_PRIORITY.iter().any(|k| name.contains(k)) {
        HostPriority::Low
    } else {
        HostPriority::Unknown
    }
}

/// Highest priority first; equal priorities keep their order
pub fn rank_hosts(mut paths: Vec<PathBuf>) -> Vec<PathBuf> {
    paths.sort_by_key(|p| Reverse(classify_host(p)));
    paths
}

/// Command template suited to a host
pub fn default_template(host: &Path) -> &'static str {
    let name = file_name_lower(host);
    if name.contains("carla") {
        "{host} --nogui --load {plugin} --input {input} --output {output}"
    } else if name.contains("reaper") {
        "{host} -batchconvert {input} {output}"
    } else {
        amax_env::constants::DEFAULT_COMMAND_TEMPLATE
    }
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    path.metadata()
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
        && path
            .extension()
            .map(|e| e.eq_ignore_ascii_case("exe"))
            .unwrap_or(false)
}

/// Base directories scanned for hosts on this platform
pub fn base_dirs() -> Vec<PathBuf> {
    if cfg!(target_os = "macos") {
        vec![PathBuf::from("/Applications"), PathBuf::from("/usr/local/bin")]
    } else if cfg!(windows) {
        ["ProgramFiles", "ProgramFiles(x86)"]
            .iter()
            .filter_map(std::env::var_os)
            .map(PathBuf::from)
            .collect()
    } else {
        vec![
            PathBuf::from("/usr/bin"),
            PathBuf::from("/usr/local/bin"),
            PathBuf::from("/opt"),
        ]
    }
}

/// Executables under `dirs` whose names contain a host keyword
pub fn scan_dirs(dirs: &[PathBuf]) -> Vec<PathBuf> {
    let mut found = Vec::new();
    for dir in dirs.iter().filter(|d| d.is_dir()) {
        for entry in WalkDir::new(dir)
            .max_depth(SCAN_DEPTH)
            .into_iter()
            .filter_map(|e| e.ok())
        {
            let path = entry.path();
            let name = file_name_lower(path);
            if HOST_KEYWORDS.iter().any(|k| name.contains(k)) && is_executable(path) {
                found.push(path.to_path_buf());
            }
        }
    }
    found
}

/// Search `PATH` and the base directories
///
/// The result is deduplicated and sorted by path.
pub fn discover_hosts() -> Vec<PathBuf> {
    let mut found: BTreeSet<PathBuf> = BTreeSet::new();
    for keyword in HOST_KEYWORDS {
        if let Ok(path) = which::which(keyword) {
            found.insert(path);
        }
    }
    found.extend(scan_dirs(&base_dirs()));
    log::debug!("host discovery found {} candidate(s)", found.len());
    found.into_iter().collect()
}

/// Immutable, ranked view of the available hosts
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HostSnapshot {
    hosts: Vec<PathBuf>,
}

impl HostSnapshot {
    /// Rank an explicit list of hosts
    pub fn from_paths(paths: Vec<PathBuf>) -> Self {
        Self {
            hosts: rank_hosts(paths),
        }
    }

    /// Discover and rank the hosts installed on this machine
    pub fn discover() -> Self {
        Self::from_paths(discover_hosts())
    }

    /// Preferred host, if any was found
    pub fn best(&self) -> Option<&Path> {
        self.hosts.first().map(PathBuf::as_path)
    }

    pub fn hosts(&self) -> &[PathBuf] {
        &self.hosts
    }

    pub fn is_empty(&self) -> bool {
        self.hosts.is_empty()
    }

    pub fn len(&self) -> usize {
        self.hosts.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification() {
        assert_eq!(classify_host(Path::new("/usr/bin/carla")), HostPriority::High);
        assert_eq!(classify_host(Path::new("/opt/yabridgectl")), HostPriority::High);
        assert_eq!(classify_host(Path::new("/opt/REAPER/reaper")), HostPriority::Medium);
        assert_eq!(classify_host(Path::new("/usr/bin/ardour8")), HostPriority::Low);
        assert_eq!(classify_host(Path::new("/usr/bin/sox")), HostPriority::Unknown);
    }

    #[test]
    fn test_rank_is_stable() {
        let ranked = rank_hosts(vec![
            PathBuf::from("/usr/bin/ardour"),
            PathBuf::from("/usr/bin/reaper"),
            PathBuf::from("/usr/bin/carla"),
            PathBuf::from("/usr/bin/bitwig-studio"),
            PathBuf::from("/usr/bin/vsthost"),
        ]);
        assert_eq!(
            ranked,
            vec![
                PathBuf::from("/usr/bin/carla"),
                PathBuf::from("/usr/bin/vsthost"),
                PathBuf::from("/usr/bin/reaper"),
                PathBuf::from("/usr/bin/ardour"),
                PathBuf::from("/usr/bin/bitwig-studio"),
            ]
        );
    }

    #[test]
    fn test_default_templates() {
        assert_eq!(
            default_template(Path::new("/usr/bin/carla")),
            "{host} --nogui --load {plugin} --input {input} --output {output}"
        );
        assert_eq!(
            default_template(Path::new("/opt/reaper")),
            "{host} -batchconvert {input} {output}"
        );
        assert_eq!(default_template(Path::new("/x/other")), "{host} {input} {output}");
    }

    #[test]
    fn test_empty_snapshot_has_no_best() {
        let snapshot = HostSnapshot::default();
        assert!(snapshot.best().is_none());
        assert!(snapshot.is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn test_scan_keeps_only_executables() {
        use std::os::unix::fs::PermissionsExt;

        let scratch = tempfile::tempdir().unwrap();
        let nested = scratch.path().join("carla").join("bin");
        std::fs::create_dir_all(&nested).unwrap();
        let exe = nested.join("carla-single");
        std::fs::write(&exe, b"#!/bin/sh\n").unwrap();
        std::fs::set_permissions(&exe, std::fs::Permissions::from_mode(0o755)).unwrap();
        let data = nested.join("carla-notes.txt");
        std::fs::write(&data, b"notes").unwrap();
        std::fs::set_permissions(&data, std::fs::Permissions::from_mode(0o644)).unwrap();

        let found = scan_dirs(&[scratch.path().to_path_buf()]);
        assert_eq!(found, vec![exe.clone()]);
        assert_eq!(HostSnapshot::from_paths(found).best(), Some(exe.as_path()));
    }
}
