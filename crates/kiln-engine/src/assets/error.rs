use std::path::PathBuf;

use thiserror::Error;

use crate::driver::DriverError;

use super::AssetKind;

#[derive(Debug, Error)]
pub enum AssetError {
    #[error("failed to construct {kind}")]
    Construction {
        kind: AssetKind,
        #[source]
        source: DriverError,
    },

    #[error("invalid {kind} description: {message}")]
    InvalidDescription { kind: AssetKind, message: String },

    #[error("failed to read {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to decode image {}", path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
}

impl AssetError {
    /// `map_err` adapter wrapping a driver failure for `kind`.
    pub(super) fn construction(kind: AssetKind) -> impl FnOnce(DriverError) -> Self {
        move |source| Self::Construction { kind, source }
    }

    pub(super) fn invalid(kind: AssetKind, message: impl Into<String>) -> Self {
        Self::InvalidDescription {
            kind,
            message: message.into(),
        }
    }
}
