//! # lfs-filter
//!
//! Server side of the long-running git filter process protocol.
//!
//! Git starts the filter once and streams every file that needs a clean
//! (on add) or smudge (on checkout) through the same pipe, instead of
//! spawning one process per file.
//!
//! ## Architecture
//!
//! - **Protocol**: pkt-line framing (4-hex-digit length, `0000` flush)
//! - **Control**: one-time welcome, version, and capability exchange
//! - **Scanner / Writer**: one request in, one chunked response and status out
//! - **Filter**: the request loop, dispatching to a [`transform::Transformer`]
//!
//! ## Example
//!
//! ```ignore
//! use lfs_filter::transform::Passthrough;
//! use lfs_filter::{Filter, FilterConfig};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> lfs_filter::Result<()> {
//!     let filter = Filter::builder(Passthrough)
//!         .config(FilterConfig::from_env())
//!         .build();
//!
//!     filter.run_stdio().await?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod control;
pub mod error;
pub mod protocol;
pub mod scanner;
pub mod transform;
pub mod transport;
pub mod writer;

mod filter;

pub use config::{FilterConfig, UnknownCommandPolicy};
pub use error::{FilterError, Result};
pub use filter::{Filter, FilterBuilder};
pub use scanner::Request;
pub use writer::Status;
