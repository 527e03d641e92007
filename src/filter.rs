//! Filter builder and request loop.
//!
//! The [`FilterBuilder`] collects the transformer and options; the
//! [`Filter`] runs the lifecycle:
//! 1. Require a pipe on stdin
//! 2. Handshake and capability negotiation
//! 3. Scan requests and dispatch `clean` / `smudge` to the transformer
//! 4. Write each response and its status, until the host ends the exchange
//!
//! # Example
//!
//! ```ignore
//! use lfs_filter::transform::Passthrough;
//! use lfs_filter::Filter;
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> lfs_filter::Result<()> {
//!     let filter = Filter::builder(Passthrough).skip_smudge(true).build();
//!     filter.run_stdio().await?;
//!     Ok(())
//! }
//! ```

use std::path::PathBuf;

use bytes::Bytes;
use tokio::io::{AsyncRead, AsyncWrite};
use tracing::{debug, error, info, warn};

use crate::config::{FilterConfig, UnknownCommandPolicy};
use crate::control::Handshake;
use crate::error::{FilterError, Result};
use crate::scanner::{scan_request, Request};
use crate::transform::{
    FileProgressSink, NoProgress, ProgressSink, TransformError, Transformer,
};
use crate::transport::{require_stdin_pipe, stdio_transport, PacketTransport};
use crate::writer::{abort_request, write_outcome, Status};

/// Builder for configuring and creating a [`Filter`].
pub struct FilterBuilder<T> {
    transformer: T,
    config: FilterConfig,
    progress: Option<Box<dyn ProgressSink>>,
}

impl<T: Transformer> FilterBuilder<T> {
    /// Create a builder around a transformer, with default options.
    pub fn new(transformer: T) -> Self {
        Self {
            transformer,
            config: FilterConfig::default(),
            progress: None,
        }
    }

    /// Replace all options at once.
    pub fn config(mut self, config: FilterConfig) -> Self {
        self.config = config;
        self
    }

    /// Never download during smudge.
    pub fn skip_smudge(mut self, skip: bool) -> Self {
        self.config.skip_smudge = skip;
        self
    }

    /// Report failed smudge downloads per request instead of failing.
    pub fn skip_download_errors(mut self, skip: bool) -> Self {
        self.config.skip_download_errors = skip;
        self
    }

    /// Set the handling of unrecognized commands.
    pub fn unknown_command(mut self, policy: UnknownCommandPolicy) -> Self {
        self.config.unknown_command = policy;
        self
    }

    /// Append progress lines to `path`.
    pub fn progress_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.progress_path = Some(path.into());
        self
    }

    /// Use a custom progress sink; takes precedence over a progress path.
    pub fn progress_sink(mut self, sink: impl ProgressSink + 'static) -> Self {
        self.progress = Some(Box::new(sink));
        self
    }

    /// Build the filter.
    pub fn build(self) -> Filter<T> {
        let progress = match (self.progress, &self.config.progress_path) {
            (Some(sink), _) => sink,
            (None, Some(path)) => Box::new(FileProgressSink::new(path.clone())),
            (None, None) => Box::new(NoProgress),
        };

        Filter {
            transformer: self.transformer,
            config: self.config,
            progress,
        }
    }
}

/// A configured filter process.
pub struct Filter<T> {
    transformer: T,
    config: FilterConfig,
    progress: Box<dyn ProgressSink>,
}

/// Whether the loop keeps scanning after a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Stop,
}

/// Response payload and final status for one request.
#[derive(Debug)]
struct Outcome {
    payload: Bytes,
    status: Status,
}

impl Outcome {
    fn success(payload: Bytes) -> Self {
        Self {
            payload,
            status: Status::Success,
        }
    }

    fn error(payload: Bytes) -> Self {
        Self {
            payload,
            status: Status::Error,
        }
    }
}

impl<T: Transformer> Filter<T> {
    /// Create a new filter builder.
    pub fn builder(transformer: T) -> FilterBuilder<T> {
        FilterBuilder::new(transformer)
    }

    /// Active options.
    pub fn config(&self) -> &FilterConfig {
        &self.config
    }

    /// Serve the host on stdin/stdout.
    ///
    /// Fails before touching the protocol if stdin is a terminal.
    pub async fn run_stdio(&self) -> Result<usize> {
        require_stdin_pipe()?;
        let mut transport = stdio_transport();
        self.serve(&mut transport).await
    }

    /// Handshake, then service requests until the host ends the exchange.
    ///
    /// Returns the number of requests serviced.
    pub async fn serve<R, W>(&self, transport: &mut PacketTransport<R, W>) -> Result<usize>
    where
        R: AsyncRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let capabilities = Handshake::new().perform(transport).await?;
        info!(version = %capabilities.version, "Filter ready");

        let mut serviced = 0;
        loop {
            let request = match scan_request(transport).await {
                Ok(Some(request)) => request,
                Ok(None) => break,
                Err(e) if e.is_request_scoped() => {
                    warn!(error = %e, "Skipping request");
                    continue;
                }
                Err(e) => return Err(e),
            };

            match self.process(transport, request).await? {
                Flow::Continue => serviced += 1,
                Flow::Stop => break,
            }
        }

        debug!(serviced, "Filter input closed");
        Ok(serviced)
    }

    /// Dispatch one request and write its response and status.
    async fn process<R, W>(
        &self,
        transport: &mut PacketTransport<R, W>,
        request: Request,
    ) -> Result<Flow>
    where
        R: AsyncRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let pathname = request.pathname().to_string();
        debug!(
            command = ?request.command(),
            pathname = %pathname,
            size = request.payload.len(),
            "Request received"
        );

        let Request { header, payload } = request;
        let outcome = match header.get("command").map(String::as_str) {
            Some("clean") => self.clean(payload, &pathname).await,
            Some("smudge") => match self.smudge(payload, &pathname).await {
                Ok(outcome) => outcome,
                Err(e) => {
                    abort_request(transport).await;
                    return Err(e);
                }
            },
            other => {
                let command = other.unwrap_or_default().to_string();
                match self.config.unknown_command {
                    UnknownCommandPolicy::StopScanning => {
                        warn!(command = %command, "Unknown command, stopping");
                        return Ok(Flow::Stop);
                    }
                    UnknownCommandPolicy::Fail => {
                        abort_request(transport).await;
                        return Err(FilterError::UnknownCommand(command));
                    }
                }
            }
        };

        write_outcome(transport, &outcome.payload, outcome.status).await?;
        Ok(Flow::Continue)
    }

    async fn clean(&self, data: Bytes, pathname: &str) -> Outcome {
        let known_size = data.len() as u64;
        let result = {
            let mut progress = self.progress.open(pathname);
            self.transformer
                .clean(data.clone(), pathname, known_size, progress.as_mut())
                .await
        };

        match result {
            Ok(cleaned) => {
                debug!(
                    pathname,
                    size = cleaned.size,
                    local_path = ?cleaned.local_path,
                    "Cleaned"
                );
                Outcome::success(cleaned.pointer)
            }
            Err(TransformError::AlreadyPointer) => {
                debug!(pathname, "Already a pointer, passing through");
                Outcome::success(data)
            }
            Err(e) => {
                error!(pathname, error = %e, "Error cleaning asset");
                Outcome::error(Bytes::new())
            }
        }
    }

    async fn smudge(&self, pointer: Bytes, pathname: &str) -> Result<Outcome> {
        let download = !self.config.skip_smudge && self.transformer.should_download(pathname);
        let result = {
            let mut progress = self.progress.open(pathname);
            self.transformer
                .smudge(pointer.clone(), pathname, download, progress.as_mut())
                .await
        };

        match result {
            Ok(content) => Ok(Outcome::success(content)),
            Err(e) if e.is_download_declined() && !download => {
                debug!(pathname, "Download skipped, returning pointer");
                Ok(Outcome::success(pointer))
            }
            Err(TransformError::NotAPointer) => {
                debug!(pathname, "Not a pointer, passing through");
                Ok(Outcome::error(pointer))
            }
            Err(e) => {
                error!(pathname, error = %e, "Error downloading object");
                if self.config.skip_download_errors {
                    Ok(Outcome::error(pointer))
                } else {
                    Err(FilterError::DownloadFailed {
                        pathname: pathname.to_string(),
                        source: e,
                    })
                }
            }
        }
    }
}
