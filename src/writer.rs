//! Response writer - chunked response payloads and status lines.
//!
//! A response is written as:
//!
//! ```text
//! data packet (≤ 65516 bytes) ─┐
//! data packet                  ├─ payload, split in order
//! ...                         ─┘
//! 0000                            end of payload
//! "status=success" | "status=error"
//! 0000                            end of status list
//! ```

use tokio::io::{AsyncRead, AsyncWrite};
use tracing::debug;

use crate::error::Result;
use crate::protocol::MAX_PACKET_LENGTH;
use crate::transport::PacketTransport;

/// Outcome reported after each read and each processed request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Success,
    Error,
}

impl Status {
    /// Wire value (`success` / `error`).
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Success => "success",
            Status::Error => "error",
        }
    }

    /// Full status line (`status=success` / `status=error`).
    pub fn line(&self) -> String {
        format!("status={}", self.as_str())
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Write a response payload as maximal packets followed by a flush.
///
/// An empty payload is written as a lone flush.
pub async fn write_response<R, W>(transport: &mut PacketTransport<R, W>, data: &[u8]) -> Result<()>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    for chunk in data.chunks(MAX_PACKET_LENGTH) {
        transport.write_packet(chunk).await?;
    }
    transport.write_flush().await
}

/// Write a one-line status list.
pub async fn write_status<R, W>(transport: &mut PacketTransport<R, W>, status: Status) -> Result<()>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    transport.write_packet_list(&[status.line()]).await
}

/// Write a response payload and its final status.
pub async fn write_outcome<R, W>(
    transport: &mut PacketTransport<R, W>,
    data: &[u8],
    status: Status,
) -> Result<()>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    write_response(transport, data).await?;
    write_status(transport, status).await
}

/// Close an acknowledged request with an empty response and `status=error`.
///
/// Used on fatal paths; write failures are logged and swallowed so they
/// never mask the error being escalated.
pub async fn abort_request<R, W>(transport: &mut PacketTransport<R, W>)
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    if let Err(e) = write_outcome(transport, &[], Status::Error).await {
        debug!(error = %e, "Could not report failed request");
    }
}
