//! Image backend trait and shared types.
//!
//! The [`ImageBackend`] trait is the seam between static-file processing and
//! the image decoder. The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend); tests use the recording
//! [`MockBackend`](tests::MockBackend).

use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("Processing failed: {0}")]
    ProcessingFailed(String),
}

/// Result of an identify operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

/// Reads image properties without transforming the file.
///
/// `Sync` so a single backend can be shared across the rayon worker pool.
pub trait ImageBackend: Sync {
    /// Get image dimensions.
    fn identify(&self, path: &Path) -> Result<Dimensions, BackendError>;
}
