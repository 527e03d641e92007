//! Control module - the one-time handshake before any request.
//!
//! # Workflow
//!
//! 1. Host sends its welcome line and supported versions
//! 2. We answer with our welcome line and `version=2`
//! 3. Host sends its capabilities
//! 4. We acknowledge `capability=clean` and `capability=smudge`
//! 5. Requests begin
//!
//! # Example
//!
//! ```ignore
//! use lfs_filter::control::Handshake;
//! use lfs_filter::transport::stdio_transport;
//!
//! let mut transport = stdio_transport();
//! let capabilities = Handshake::new().perform(&mut transport).await?;
//! ```

mod handshake;

pub use handshake::{
    Capabilities, Handshake, HandshakeState, CLIENT_WELCOME, REQUIRED_CAPABILITIES,
    REQUIRED_VERSION, SERVER_WELCOME,
};
