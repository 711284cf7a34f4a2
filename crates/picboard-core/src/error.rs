//! Error types for sandbox operations.

use crate::images::ImageRef;
use crate::transform::HandleSlot;

/// Why an image resource could not be loaded.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LoadFailure {
    #[error("network or decode error: {0}")]
    Resource(String),
    #[error("image has no pixels ({width}x{height})")]
    Empty { width: u32, height: u32 },
    #[error("host error: {0}")]
    Host(String),
}

/// Error type for image collection and transform operations.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SandboxError {
    #[error("failed to load image '{uri}': {cause}")]
    Load { uri: String, cause: LoadFailure },
    #[error("image not found: {0}")]
    NotFound(ImageRef),
    #[error("drag move on {0:?} handle without a drag start")]
    InvalidDragState(HandleSlot),
}
