//! Filter configuration.
//!
//! Built once at startup and passed to the filter loop; nothing here is
//! mutated afterwards.

use std::path::PathBuf;

/// Environment variable forcing smudge to skip downloads.
pub const ENV_SKIP_SMUDGE: &str = "GIT_LFS_SKIP_SMUDGE";

/// Environment variable turning smudge download failures into per-file errors.
pub const ENV_SKIP_DOWNLOAD_ERRORS: &str = "GIT_LFS_SKIP_DOWNLOAD_ERRORS";

/// Environment variable naming the progress file.
pub const ENV_PROGRESS: &str = "GIT_LFS_PROGRESS";

/// What to do with a request whose command is neither clean nor smudge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnknownCommandPolicy {
    /// Fail the process with the generic error exit code.
    #[default]
    Fail,
    /// Stop reading requests and exit successfully.
    StopScanning,
}

/// Options recognized by the filter loop.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterConfig {
    /// Never download content during smudge.
    pub skip_smudge: bool,
    /// Report failed smudge downloads per request instead of exiting.
    pub skip_download_errors: bool,
    /// Handling of unrecognized commands.
    pub unknown_command: UnknownCommandPolicy,
    /// Side-channel progress file.
    pub progress_path: Option<PathBuf>,
}

impl FilterConfig {
    /// Read options from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read options through `lookup` (environment-style key → value).
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let flag = |key: &str| lookup(key).as_deref().is_some_and(parse_bool);

        Self {
            skip_smudge: flag(ENV_SKIP_SMUDGE),
            skip_download_errors: flag(ENV_SKIP_DOWNLOAD_ERRORS),
            unknown_command: UnknownCommandPolicy::default(),
            progress_path: lookup(ENV_PROGRESS)
                .filter(|p| !p.is_empty())
                .map(PathBuf::from),
        }
    }
}

/// Parse a git-style boolean; anything unrecognized is false.
pub fn parse_bool(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
