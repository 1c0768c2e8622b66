//! Error types for file-level operations.

use std::path::PathBuf;

use sdmx_model::SdmxError;
use thiserror::Error;

/// Errors raised while loading, converting or writing files.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CoreError {
    /// A file could not be opened or created.
    #[error("Failed to access {path}: {source}")]
    File {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The input is not a recognised data encoding.
    #[error("Cannot detect the data format of {path}")]
    UnknownFormat { path: PathBuf },

    /// An SDMX operation failed on a file.
    #[error("{path}: {source}")]
    Sdmx {
        path: PathBuf,
        #[source]
        source: SdmxError,
    },

    /// An SDMX operation failed.
    #[error(transparent)]
    Model(#[from] SdmxError),
}

impl CoreError {
    pub(crate) fn file(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::File {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn sdmx(path: impl Into<PathBuf>, source: SdmxError) -> Self {
        Self::Sdmx {
            path: path.into(),
            source,
        }
    }

    /// The underlying SDMX error, if any.
    pub fn sdmx_error(&self) -> Option<&SdmxError> {
        match self {
            Self::Sdmx { source, .. } | Self::Model(source) => Some(source),
            _ => None,
        }
    }
}

/// Result type for file-level operations.
pub type Result<T> = std::result::Result<T, CoreError>;
