use std::{fmt, io, path::PathBuf};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("failed to read coverage report {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid line range: {0}")]
    InvalidRange(String),
}

pub type ReportResult<T> = Result<T, ReportError>;

impl ReportError {
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn invalid_range(details: impl fmt::Display) -> Self {
        Self::InvalidRange(details.to_string())
    }
}
