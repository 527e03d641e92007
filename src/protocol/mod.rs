//! Protocol module - packet wire format and packet builders.
//!
//! This module implements the pkt-line framing used by the filter protocol:
//! - 4-hex-digit length header encoding/decoding
//! - Flush packet (`0000`) as list and payload terminator
//! - Packet builders that split large payloads

mod packet;
mod wire_format;

pub use packet::{build_packet, build_packet_list, build_packets, build_text_packet, Packet};
pub use wire_format::{
    LengthHeader, FLUSH_PACKET, LENGTH_HEADER_SIZE, MAX_PACKET_LENGTH, MAX_PACKET_TOTAL_LENGTH,
};
