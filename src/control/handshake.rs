//! Protocol handshake and capability negotiation.
//!
//! Runs exactly once, before the first request:
//!
//! ```text
//! host                               filter
//!  │ "git-filter-client"                │
//!  │ "version=2" ... 0000  ───────────► │  Init
//!  │ ◄─────────── "git-filter-server"   │
//!  │              "version=2" 0000      │
//!  │ "capability=clean"                 │
//!  │ "capability=smudge" ... 0000 ────► │  Negotiate
//!  │ ◄──────────── "capability=clean"   │
//!  │               "capability=smudge"  │
//!  │               0000                 │  Ready
//! ```
//!
//! Any mismatch is fatal; nothing is retried.

use tokio::io::{AsyncRead, AsyncWrite};
use tracing::debug;

use crate::error::{FilterError, Result};
use crate::transport::PacketTransport;

/// Welcome line the host must send first.
pub const CLIENT_WELCOME: &str = "git-filter-client";

/// Welcome line we answer with.
pub const SERVER_WELCOME: &str = "git-filter-server";

/// The only protocol version we speak.
pub const REQUIRED_VERSION: &str = "version=2";

/// Capabilities we require and acknowledge.
pub const REQUIRED_CAPABILITIES: [&str; 2] = ["capability=clean", "capability=smudge"];

/// Negotiation progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandshakeState {
    /// Waiting for the welcome and version list.
    Init,
    /// Version agreed, waiting for the capability list.
    Negotiate,
    /// Capabilities acknowledged; requests may follow.
    Ready,
}

/// Outcome of a completed negotiation.
///
/// Fixed for the lifetime of the process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Capabilities {
    /// Agreed protocol version.
    pub version: String,
    /// Capabilities acknowledged to the host.
    pub capabilities: Vec<String>,
}

impl Capabilities {
    /// Check whether a capability (e.g. `"capability=smudge"`) was agreed.
    pub fn supports(&self, capability: &str) -> bool {
        self.capabilities.iter().any(|c| c == capability)
    }
}

/// One-shot handshake driver.
#[derive(Debug)]
pub struct Handshake {
    state: HandshakeState,
}

impl Handshake {
    /// Create a handshake in the `Init` state.
    pub fn new() -> Self {
        Self {
            state: HandshakeState::Init,
        }
    }

    /// Current state.
    pub fn state(&self) -> HandshakeState {
        self.state
    }

    /// Run both phases to completion.
    pub async fn perform<R, W>(
        mut self,
        transport: &mut PacketTransport<R, W>,
    ) -> Result<Capabilities>
    where
        R: AsyncRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let version = self.init(transport).await?;
        let capabilities = self.negotiate(transport).await?;
        Ok(Capabilities {
            version,
            capabilities,
        })
    }

    /// Init phase: check the welcome line and agree on the version.
    pub async fn init<R, W>(&mut self, transport: &mut PacketTransport<R, W>) -> Result<String>
    where
        R: AsyncRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        self.expect_state(HandshakeState::Init)?;
        debug!("Initialize filter");

        let welcome = transport.read_packet_text().await?;
        if welcome != CLIENT_WELCOME {
            return Err(FilterError::Handshake(welcome));
        }

        let offered = transport.read_packet_list().await?;
        if !offered.iter().any(|v| v == REQUIRED_VERSION) {
            return Err(FilterError::UnsupportedVersion {
                required: REQUIRED_VERSION.to_string(),
                offered,
            });
        }

        transport
            .write_packet_list(&[SERVER_WELCOME, REQUIRED_VERSION])
            .await?;

        self.state = HandshakeState::Negotiate;
        Ok(REQUIRED_VERSION.to_string())
    }

    /// Negotiate phase: require our capabilities and echo exactly those.
    pub async fn negotiate<R, W>(
        &mut self,
        transport: &mut PacketTransport<R, W>,
    ) -> Result<Vec<String>>
    where
        R: AsyncRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        self.expect_state(HandshakeState::Negotiate)?;

        let offered = transport.read_packet_list().await?;
        if let Some(missing) = REQUIRED_CAPABILITIES
            .iter()
            .find(|required| !offered.iter().any(|c| c == *required))
        {
            return Err(FilterError::UnsupportedCapability {
                missing: missing.to_string(),
                offered,
            });
        }

        transport.write_packet_list(&REQUIRED_CAPABILITIES).await?;
        debug!(capabilities = ?REQUIRED_CAPABILITIES, "Filter capabilities negotiated");

        self.state = HandshakeState::Ready;
        Ok(REQUIRED_CAPABILITIES.iter().map(|c| c.to_string()).collect())
    }

    fn expect_state(&self, expected: HandshakeState) -> Result<()> {
        if self.state != expected {
            return Err(FilterError::Protocol(format!(
                "Handshake step out of order: in {:?}, expected {:?}",
                self.state, expected
            )));
        }
        Ok(())
    }
}

impl Default for Handshake {
    fn default() -> Self {
        Self::new()
    }
}
