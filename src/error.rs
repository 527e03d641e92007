//! Error types for lfs-filter.

use thiserror::Error;

use crate::transform::TransformError;

/// Exit code for any fatal protocol, handshake, or I/O failure.
pub const EXIT_FAILURE: u8 = 1;

/// Exit code reserved for a smudge that could not fetch required content.
pub const EXIT_DOWNLOAD_FAILED: u8 = 2;

/// Main error type for all filter operations.
#[derive(Debug, Error)]
pub enum FilterError {
    /// I/O error on the filter pipe.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Framing error (malformed length header, truncated or oversized packet).
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// The host did not greet us as a filter client.
    #[error("invalid filter protocol welcome message: {0}")]
    Handshake(String),

    /// The host does not speak the protocol version we require.
    #[error("filter '{required}' not supported (your Git supports: {offered:?})")]
    UnsupportedVersion {
        required: String,
        offered: Vec<String>,
    },

    /// The host does not offer a capability we require.
    #[error("filter '{missing}' not supported (your Git supports: {offered:?})")]
    UnsupportedCapability {
        missing: String,
        offered: Vec<String>,
    },

    /// A request header line could not be parsed.
    #[error("Malformed request: {0}")]
    MalformedRequest(String),

    /// The request named a command other than clean or smudge.
    #[error("Unknown command {0:?}")]
    UnknownCommand(String),

    /// A requested smudge download failed and errors are not being skipped.
    #[error("Error downloading object {pathname}: {source}")]
    DownloadFailed {
        pathname: String,
        #[source]
        source: TransformError,
    },

    /// Standard input is an interactive terminal instead of a pipe.
    #[error("This command should be run by the Git filter process")]
    NotAPipe,
}

impl FilterError {
    /// Whether the error only affects the current request.
    ///
    /// Request-scoped errors have already been reported to the host with
    /// `status=error`; the driver loop moves on to the next request.
    pub fn is_request_scoped(&self) -> bool {
        matches!(self, FilterError::MalformedRequest(_))
    }

    /// Process exit code for a fatal error.
    pub fn exit_code(&self) -> u8 {
        match self {
            FilterError::DownloadFailed { .. } => EXIT_DOWNLOAD_FAILED,
            _ => EXIT_FAILURE,
        }
    }
}

/// Result type alias using FilterError.
pub type Result<T> = std::result::Result<T, FilterError>;
