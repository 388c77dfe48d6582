//! Error types for field extraction and report artifacts.

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::pdf::PdfError;

/// Errors raised while reading sources or writing report artifacts.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    /// A source file could not be read or an artifact could not be written.
    #[error("I/O error on '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Writing to an output stream failed.
    #[error("I/O error: {0}")]
    Stream(#[from] std::io::Error),

    /// CSV reading or writing failure.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// A CSV artifact parsed but does not have the expected layout.
    #[error("invalid CSV layout: {0}")]
    InvalidCsv(String),

    /// PDF form extraction failure.
    #[error(transparent)]
    Pdf(#[from] PdfError),
}

impl DiscoveryError {
    pub(crate) fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Convenience alias for results with [`DiscoveryError`].
pub type Result<T> = std::result::Result<T, DiscoveryError>;

/// Reads a UTF-8 text source, attaching the path to any failure.
pub(crate) fn read_text(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|err| DiscoveryError::io(path, err))
}
