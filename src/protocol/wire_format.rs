//! Wire format encoding and decoding.
//!
//! Every packet starts with a 4-byte length header:
//! ```text
//! ┌──────────────────┬──────────────────────────┐
//! │ Length (hex)     │ Payload                  │
//! │ 4 ASCII bytes    │ length - 4 bytes         │
//! └──────────────────┴──────────────────────────┘
//! ```
//!
//! The length counts the header itself. `0000` is the flush packet and has
//! no payload.

use crate::error::{FilterError, Result};

/// Length header size in bytes (fixed, exactly 4).
pub const LENGTH_HEADER_SIZE: usize = 4;

/// Largest payload a single packet may carry.
pub const MAX_PACKET_LENGTH: usize = 65516;

/// Largest total packet length (header + payload).
pub const MAX_PACKET_TOTAL_LENGTH: usize = MAX_PACKET_LENGTH + LENGTH_HEADER_SIZE;

/// Encoded flush packet.
pub const FLUSH_PACKET: &[u8; LENGTH_HEADER_SIZE] = b"0000";

/// Decoded length header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LengthHeader {
    /// `0000`: end of a list or payload.
    Flush,
    /// Data packet carrying this many payload bytes.
    Data(usize),
}

impl LengthHeader {
    /// Encode a header for a payload of `payload_len` bytes.
    ///
    /// Fails if the payload does not fit in one packet.
    ///
    /// # Example
    ///
    /// ```
    /// use lfs_filter::protocol::LengthHeader;
    ///
    /// assert_eq!(&LengthHeader::Data(5).encode().unwrap(), b"0009");
    /// assert_eq!(&LengthHeader::Flush.encode().unwrap(), b"0000");
    /// ```
    pub fn encode(&self) -> Result<[u8; LENGTH_HEADER_SIZE]> {
        let payload_len = match *self {
            LengthHeader::Flush => return Ok(*FLUSH_PACKET),
            LengthHeader::Data(len) => len,
        };

        if payload_len > MAX_PACKET_LENGTH {
            return Err(FilterError::Protocol(format!(
                "Packet payload {} exceeds maximum {}",
                payload_len, MAX_PACKET_LENGTH
            )));
        }

        let text = format!("{:04x}", payload_len + LENGTH_HEADER_SIZE);
        let mut buf = [0u8; LENGTH_HEADER_SIZE];
        buf.copy_from_slice(text.as_bytes());
        Ok(buf)
    }

    /// Decode a header from its 4 ASCII hex digits.
    ///
    /// # Example
    ///
    /// ```
    /// use lfs_filter::protocol::LengthHeader;
    ///
    /// assert_eq!(LengthHeader::decode(b"0009").unwrap(), LengthHeader::Data(5));
    /// assert_eq!(LengthHeader::decode(b"0000").unwrap(), LengthHeader::Flush);
    /// assert!(LengthHeader::decode(b"zz01").is_err());
    /// ```
    pub fn decode(buf: &[u8; LENGTH_HEADER_SIZE]) -> Result<Self> {
        if !buf.iter().all(u8::is_ascii_hexdigit) {
            return Err(FilterError::Protocol(format!(
                "Invalid packet length header {:?}",
                String::from_utf8_lossy(buf)
            )));
        }

        // All four bytes are ASCII hex digits, so both conversions succeed.
        let text = std::str::from_utf8(buf).map_err(|e| FilterError::Protocol(e.to_string()))?;
        let total = usize::from_str_radix(text, 16)
            .map_err(|e| FilterError::Protocol(e.to_string()))?;

        match total {
            0 => Ok(LengthHeader::Flush),
            1..=3 => Err(FilterError::Protocol(format!(
                "Invalid packet length {}",
                total
            ))),
            n if n > MAX_PACKET_TOTAL_LENGTH => Err(FilterError::Protocol(format!(
                "Packet length {} exceeds maximum {}",
                n, MAX_PACKET_TOTAL_LENGTH
            ))),
            n => Ok(LengthHeader::Data(n - LENGTH_HEADER_SIZE)),
        }
    }

    /// Check if this is a flush header.
    #[inline]
    pub fn is_flush(&self) -> bool {
        matches!(self, LengthHeader::Flush)
    }
}
