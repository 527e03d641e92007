//! Progress reporting for clean/smudge.
//!
//! Progress is an injected capability. The filter opens one reporter per
//! request and drops it when the request is done, so any file behind it is
//! closed on every exit path.
//!
//! The file format matches what git-lfs tooling tails:
//!
//! ```text
//! <phase> 1/1 <current>/<total> <pathname>
//! ```

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::{debug, error};

/// Which operation is reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Clean,
    Smudge,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Phase::Clean => f.write_str("clean"),
            Phase::Smudge => f.write_str("smudge"),
        }
    }
}

/// Receives byte-level progress for one request.
pub trait Progress {
    fn report(&mut self, phase: Phase, current: u64, total: u64);
}

/// Opens a [`Progress`] for each request.
pub trait ProgressSink: Send + Sync {
    fn open(&self, identity: &str) -> Box<dyn Progress + Send>;
}

/// Discards all progress.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl Progress for NoProgress {
    fn report(&mut self, _phase: Phase, _current: u64, _total: u64) {}
}

impl ProgressSink for NoProgress {
    fn open(&self, _identity: &str) -> Box<dyn Progress + Send> {
        Box::new(NoProgress)
    }
}

/// Appends progress lines to a file, one open handle per request.
#[derive(Debug, Clone)]
pub struct FileProgressSink {
    path: PathBuf,
}

impl FileProgressSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ProgressSink for FileProgressSink {
    fn open(&self, identity: &str) -> Box<dyn Progress + Send> {
        if identity.is_empty() {
            return Box::new(NoProgress);
        }

        match ProgressFile::open(&self.path, identity) {
            Ok(file) => Box::new(file),
            Err(e) => {
                error!(path = %self.path.display(), error = %e, "Cannot open progress file");
                Box::new(NoProgress)
            }
        }
    }
}

/// Open progress file for a single request. Closed on drop.
#[derive(Debug)]
pub struct ProgressFile {
    file: File,
    identity: String,
}

impl ProgressFile {
    /// Open `path` for appending, creating it and its parent directory.
    pub fn open(path: &Path, identity: &str) -> std::io::Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            file,
            identity: identity.to_string(),
        })
    }
}

impl Progress for ProgressFile {
    fn report(&mut self, phase: Phase, current: u64, total: u64) {
        let line = format!("{} 1/1 {}/{} {}\n", phase, current, total, self.identity);
        if let Err(e) = self.file.write_all(line.as_bytes()) {
            debug!(error = %e, "Dropped progress line");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_display() {
        assert_eq!(Phase::Clean.to_string(), "clean");
        assert_eq!(Phase::Smudge.to_string(), "smudge");
    }

    #[test]
    fn test_file_sink_appends_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logs").join("progress");
        let sink = FileProgressSink::new(&path);

        {
            let mut progress = sink.open("a/b.bin");
            progress.report(Phase::Clean, 5, 10);
            progress.report(Phase::Clean, 10, 10);
        }
        {
            let mut progress = sink.open("c.bin");
            progress.report(Phase::Smudge, 3, 3);
        }

        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(
            contents,
            "clean 1/1 5/10 a/b.bin\nclean 1/1 10/10 a/b.bin\nsmudge 1/1 3/3 c.bin\n"
        );
    }

    #[test]
    fn test_file_sink_skips_empty_identity() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("progress");
        let sink = FileProgressSink::new(&path);

        sink.open("").report(Phase::Clean, 1, 1);
        assert!(!path.exists());
    }

    #[test]
    fn test_file_sink_unopenable_path_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        // A directory cannot be opened for appending.
        let sink = FileProgressSink::new(dir.path());

        let mut progress = sink.open("a.bin");
        progress.report(Phase::Smudge, 1, 1);
    }
}
