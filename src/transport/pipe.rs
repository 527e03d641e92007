//! Standard input/output as the filter pipe.
//!
//! The host runs the filter with stdin and stdout connected to pipes.
//! stdout carries protocol bytes only; logs go to stderr.

use std::io::IsTerminal;

use tokio::io::{Stdin, Stdout};

use super::PacketTransport;
use crate::error::{FilterError, Result};

/// Fail if `input` is an interactive terminal.
///
/// The protocol only makes sense when a host process drives the stream,
/// so this runs before any protocol bytes are exchanged.
pub fn require_pipe<T: IsTerminal>(input: &T) -> Result<()> {
    if input.is_terminal() {
        return Err(FilterError::NotAPipe);
    }
    Ok(())
}

/// Check that the process stdin is not a terminal.
pub fn require_stdin_pipe() -> Result<()> {
    require_pipe(&std::io::stdin())
}

/// Packet transport over the process stdin/stdout.
pub fn stdio_transport() -> PacketTransport<Stdin, Stdout> {
    PacketTransport::new(tokio::io::stdin(), tokio::io::stdout())
}
