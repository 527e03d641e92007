//! Identity transformer.
//!
//! Clean returns the content as its own pointer and smudge returns the
//! pointer as content. Useful for exercising the protocol end to end
//! without an object store.

use async_trait::async_trait;
use bytes::Bytes;

use super::{Cleaned, Phase, Progress, TransformError, Transformer};

/// Transformer that leaves content unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct Passthrough;

#[async_trait]
impl Transformer for Passthrough {
    async fn clean(
        &self,
        data: Bytes,
        _identity: &str,
        known_size: u64,
        progress: &mut (dyn Progress + Send),
    ) -> Result<Cleaned, TransformError> {
        let size = data.len() as u64;
        progress.report(Phase::Clean, size, known_size.max(size));
        Ok(Cleaned {
            pointer: data,
            local_path: None,
            size,
        })
    }

    async fn smudge(
        &self,
        pointer: Bytes,
        _identity: &str,
        _allow_download: bool,
        progress: &mut (dyn Progress + Send),
    ) -> Result<Bytes, TransformError> {
        let size = pointer.len() as u64;
        progress.report(Phase::Smudge, size, size);
        Ok(pointer)
    }
}
