use thiserror::Error;

use crate::uuid::Uuid;

use super::RawHandle;

/// Failure reported by a graphics driver.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DriverError {
    #[error("no context is current")]
    NoCurrentContext,

    #[error("context {0} is not attached to the driver")]
    UnknownContext(Uuid),

    #[error("unknown driver handle {0}")]
    UnknownHandle(RawHandle),

    #[error("handle {0} does not name a {1}")]
    WrongObject(RawHandle, &'static str),

    #[error("handle {0} was created on another context")]
    ForeignHandle(RawHandle),

    #[error("shader compilation failed: {0}")]
    ShaderCompilation(String),

    #[error("invalid texture data: {0}")]
    InvalidTexture(String),

    #[error("no frame is open on context {0}")]
    NoFrame(Uuid),

    #[error("draw rejected: {0}")]
    InvalidDraw(String),

    #[error("surface failure: {0}")]
    Surface(String),
}
