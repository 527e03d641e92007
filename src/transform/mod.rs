//! Transform module - the clean/smudge collaborator seam.
//!
//! The filter loop owns the protocol; content transformation, object
//! storage, and downloads belong to a [`Transformer`] supplied by the
//! caller.
//!
//! # Example
//!
//! ```ignore
//! use lfs_filter::transform::{Cleaned, Progress, TransformError, Transformer};
//!
//! struct Store;
//!
//! #[async_trait::async_trait]
//! impl Transformer for Store {
//!     async fn clean(&self, data: Bytes, identity: &str, known_size: u64,
//!                    progress: &mut (dyn Progress + Send)) -> Result<Cleaned, TransformError> {
//!         // hash, persist, and return the pointer
//!     }
//!
//!     async fn smudge(&self, pointer: Bytes, identity: &str, allow_download: bool,
//!                     progress: &mut (dyn Progress + Send)) -> Result<Bytes, TransformError> {
//!         // resolve the pointer to content
//!     }
//! }
//! ```

mod passthrough;
mod progress;

use std::path::PathBuf;

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;

pub use passthrough::Passthrough;
pub use progress::{FileProgressSink, NoProgress, Phase, Progress, ProgressFile, ProgressSink};

/// Errors reported by a [`Transformer`].
#[derive(Debug, Error)]
pub enum TransformError {
    /// Content is missing locally and downloading was not allowed.
    #[error("download declined")]
    DownloadDeclined,

    /// Smudge input is not a pointer.
    #[error("input is not a pointer")]
    NotAPointer,

    /// Clean input is already a pointer.
    #[error("input is already a pointer")]
    AlreadyPointer,

    /// Any other transformation failure.
    #[error("{0}")]
    Failed(String),

    /// I/O failure inside the collaborator.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl TransformError {
    /// Check if this is a declined download.
    #[inline]
    pub fn is_download_declined(&self) -> bool {
        matches!(self, TransformError::DownloadDeclined)
    }
}

/// Result of a clean operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cleaned {
    /// Encoded pointer returned to the host.
    pub pointer: Bytes,
    /// Where the collaborator stored the original content, if anywhere.
    pub local_path: Option<PathBuf>,
    /// Size of the original content.
    pub size: u64,
}

/// Clean/smudge collaborator.
#[async_trait]
pub trait Transformer: Send + Sync {
    /// Turn raw content into its pointer form, persisting the content.
    async fn clean(
        &self,
        data: Bytes,
        identity: &str,
        known_size: u64,
        progress: &mut (dyn Progress + Send),
    ) -> Result<Cleaned, TransformError>;

    /// Materialize content from its pointer form.
    ///
    /// When `allow_download` is false and the content is not available
    /// locally, return [`TransformError::DownloadDeclined`].
    async fn smudge(
        &self,
        pointer: Bytes,
        identity: &str,
        allow_download: bool,
        progress: &mut (dyn Progress + Send),
    ) -> Result<Bytes, TransformError>;

    /// Include/exclude filter: whether smudge may download for `identity`.
    fn should_download(&self, _identity: &str) -> bool {
        true
    }
}
