//! Request scanner - reads one request per call.
//!
//! A request on the wire is a flush-terminated list of `key=value` header
//! lines, then data packets up to the next flush. After the whole request
//! has been consumed the scanner acknowledges the read with
//! `status=success` or `status=error`.

use std::collections::HashMap;

use bytes::{Bytes, BytesMut};
use tokio::io::{AsyncRead, AsyncWrite};
use tracing::{debug, warn};

use crate::error::{FilterError, Result};
use crate::protocol::Packet;
use crate::transport::PacketTransport;
use crate::writer::{write_status, Status};

/// One unit of work read from the host.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Request {
    /// Header pairs. Duplicate keys collapse; the last one wins.
    pub header: HashMap<String, String>,
    /// Concatenated data packets.
    pub payload: Bytes,
}

impl Request {
    /// The `command` header, if present.
    pub fn command(&self) -> Option<&str> {
        self.header.get("command").map(String::as_str)
    }

    /// The `pathname` header, or `""` if absent.
    pub fn pathname(&self) -> &str {
        self.header.get("pathname").map_or("", String::as_str)
    }
}

/// Parse header lines into a map, splitting each on its first `=`.
pub fn parse_header<S: AsRef<str>>(lines: &[S]) -> Result<HashMap<String, String>> {
    let mut header = HashMap::with_capacity(lines.len());
    for line in lines {
        let line = line.as_ref();
        let (key, value) = line.split_once('=').ok_or_else(|| {
            FilterError::MalformedRequest(format!("header line {:?} has no '='", line))
        })?;
        header.insert(key.to_string(), value.to_string());
    }
    Ok(header)
}

/// Scan the next request.
///
/// Returns `Ok(None)` when the host ends the exchange: either the stream
/// ends at a packet boundary, or an empty header list arrives. No status is
/// written in that case.
///
/// A malformed header line is reported to the host with `status=error`
/// after the payload has been drained, so the stream stays in sync and the
/// caller may continue with the next request. Any other failure is fatal;
/// `status=error` is written best-effort before it is returned.
pub async fn scan_request<R, W>(transport: &mut PacketTransport<R, W>) -> Result<Option<Request>>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    debug!("Process filter command");

    let lines = match transport.try_read_packet_list().await {
        Ok(Some(lines)) if !lines.is_empty() => lines,
        Ok(_) => return Ok(None),
        Err(e) => return Err(fail_read(transport, e).await),
    };

    let header = parse_header(&lines);

    let payload = match read_payload(transport).await {
        Ok(payload) => payload,
        Err(e) => return Err(fail_read(transport, e).await),
    };

    match header {
        Ok(header) => {
            write_status(transport, Status::Success).await?;
            Ok(Some(Request { header, payload }))
        }
        Err(e) => {
            warn!(error = %e, "Rejecting malformed request");
            write_status(transport, Status::Error).await?;
            Err(e)
        }
    }
}

/// Append data packets until the next flush.
async fn read_payload<R, W>(transport: &mut PacketTransport<R, W>) -> Result<Bytes>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut payload = BytesMut::new();
    loop {
        match transport.read_packet().await? {
            Packet::Flush => return Ok(payload.freeze()),
            Packet::Data(chunk) => payload.extend_from_slice(&chunk),
        }
    }
}

/// Report a failed read to the host, best-effort, and hand back the cause.
async fn fail_read<R, W>(transport: &mut PacketTransport<R, W>, err: FilterError) -> FilterError
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    if let Err(status_err) = write_status(transport, Status::Error).await {
        debug!(error = %status_err, "Could not report read failure");
    }
    err
}
