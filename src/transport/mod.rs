//! Transport module - packet I/O on top of the filter pipe.
//!
//! Provides:
//! - [`PacketTransport`] - single packets and packet lists over any async duplex
//! - stdin/stdout wiring and the pipe requirement for the process

mod pipe;
mod pkt_line;

pub use pipe::{require_pipe, require_stdin_pipe, stdio_transport};
pub use pkt_line::PacketTransport;
