//! Packet type and packet builders.
//!
//! Uses `bytes::Bytes` for payloads so reassembly and echoing never copy
//! more than once.
//!
//! # Example
//!
//! ```
//! use lfs_filter::protocol::{build_packet, Packet};
//! use bytes::Bytes;
//!
//! let packet = Packet::Data(Bytes::from_static(b"hello"));
//! assert_eq!(packet.payload(), b"hello");
//! assert_eq!(build_packet(b"hello").unwrap(), b"0009hello");
//! ```

use bytes::Bytes;

use super::wire_format::{LengthHeader, FLUSH_PACKET, LENGTH_HEADER_SIZE, MAX_PACKET_LENGTH};
use crate::error::Result;

/// A single transport-level packet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Packet {
    /// Data packet (payload may be empty for `0004`).
    Data(Bytes),
    /// Flush packet, `0000`.
    Flush,
}

impl Packet {
    /// Check if this is a flush packet.
    #[inline]
    pub fn is_flush(&self) -> bool {
        matches!(self, Packet::Flush)
    }

    /// Payload bytes (empty for a flush).
    #[inline]
    pub fn payload(&self) -> &[u8] {
        match self {
            Packet::Data(data) => data,
            Packet::Flush => &[],
        }
    }

    /// Payload as text, with a single trailing newline removed.
    pub fn text(&self) -> String {
        let payload = self.payload();
        let payload = payload.strip_suffix(b"\n").unwrap_or(payload);
        String::from_utf8_lossy(payload).into_owned()
    }

    /// Encode this packet, header included.
    pub fn encode(&self) -> Result<Vec<u8>> {
        match self {
            Packet::Data(data) => build_packet(data),
            Packet::Flush => Ok(FLUSH_PACKET.to_vec()),
        }
    }
}

/// Build a complete data packet as a single byte vector.
///
/// Fails if `payload` is longer than [`MAX_PACKET_LENGTH`]; use
/// [`build_packets`] to split larger payloads.
pub fn build_packet(payload: &[u8]) -> Result<Vec<u8>> {
    let header = LengthHeader::Data(payload.len()).encode()?;
    let mut buf = Vec::with_capacity(LENGTH_HEADER_SIZE + payload.len());
    buf.extend_from_slice(&header);
    buf.extend_from_slice(payload);
    Ok(buf)
}

/// Build a text packet (`text` followed by a newline).
pub fn build_text_packet(text: &str) -> Result<Vec<u8>> {
    let mut line = String::with_capacity(text.len() + 1);
    line.push_str(text);
    line.push('\n');
    build_packet(line.as_bytes())
}

/// Split a payload of any size into maximal packets followed by a flush.
///
/// An empty payload encodes as a lone flush.
pub fn build_packets(payload: &[u8]) -> Vec<u8> {
    let chunks = payload.len().div_ceil(MAX_PACKET_LENGTH);
    let mut buf = Vec::with_capacity(payload.len() + (chunks + 1) * LENGTH_HEADER_SIZE);
    for chunk in payload.chunks(MAX_PACKET_LENGTH) {
        // Chunks never exceed MAX_PACKET_LENGTH, so encoding cannot fail.
        if let Ok(header) = LengthHeader::Data(chunk.len()).encode() {
            buf.extend_from_slice(&header);
            buf.extend_from_slice(chunk);
        }
    }
    buf.extend_from_slice(FLUSH_PACKET);
    buf
}

/// Build a text packet list terminated by a flush.
pub fn build_packet_list<S: AsRef<str>>(lines: &[S]) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    for line in lines {
        buf.extend(build_text_packet(line.as_ref())?);
    }
    buf.extend_from_slice(FLUSH_PACKET);
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_packet_accessors() {
        let data = Packet::Data(Bytes::from_static(b"abc"));
        assert!(!data.is_flush());
        assert_eq!(data.payload(), b"abc");

        assert!(Packet::Flush.is_flush());
        assert!(Packet::Flush.payload().is_empty());
    }

    #[test]
    fn test_text_strips_single_newline() {
        let packet = Packet::Data(Bytes::from_static(b"git-filter-client\n"));
        assert_eq!(packet.text(), "git-filter-client");

        let packet = Packet::Data(Bytes::from_static(b"line\n\n"));
        assert_eq!(packet.text(), "line\n");

        let packet = Packet::Data(Bytes::from_static(b"no newline"));
        assert_eq!(packet.text(), "no newline");
    }

    #[test]
    fn test_build_packet() {
        assert_eq!(build_packet(b"").unwrap(), b"0004");
        assert_eq!(build_packet(b"hello").unwrap(), b"0009hello");
    }

    #[test]
    fn test_build_packet_too_large() {
        let payload = vec![0u8; MAX_PACKET_LENGTH + 1];
        assert!(build_packet(&payload).is_err());
    }

    #[test]
    fn test_build_text_packet() {
        assert_eq!(
            build_text_packet("version=2").unwrap(),
            b"000eversion=2\n"
        );
    }

    #[test]
    fn test_build_packets_empty_is_flush() {
        assert_eq!(build_packets(b""), b"0000");
    }

    #[test]
    fn test_build_packets_exact_multiple() {
        let payload = vec![7u8; MAX_PACKET_LENGTH * 2];
        let encoded = build_packets(&payload);

        assert_eq!(encoded.len(), payload.len() + 3 * LENGTH_HEADER_SIZE);
        assert_eq!(&encoded[..4], b"fff0");
        let second = LENGTH_HEADER_SIZE + MAX_PACKET_LENGTH;
        assert_eq!(&encoded[second..second + 4], b"fff0");
        assert_eq!(&encoded[encoded.len() - 4..], b"0000");
    }

    #[test]
    fn test_build_packet_list() {
        let encoded = build_packet_list(&["status=success"]).unwrap();
        assert_eq!(encoded, b"0013status=success\n0000");
    }

    #[test]
    fn test_encode_flush() {
        assert_eq!(Packet::Flush.encode().unwrap(), b"0000");
    }
}
