use std::path::PathBuf;

use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum Error {
    /// The backend for the requested output format was not compiled in.
    #[error("{backend} rendering backend is not available (enable the `{feature}` feature)")]
    DependencyMissing {
        backend: &'static str,
        feature: &'static str,
    },

    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid topology: {0}")]
    InvalidTopology(String),

    #[error("rasterization failed: {0}")]
    Rasterize(String),

    #[error("failed to load {}: {message}", path.display())]
    Config { path: PathBuf, message: String },
}

impl Error {
    pub(crate) fn write(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Write {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn config(path: impl Into<PathBuf>, message: impl ToString) -> Self {
        Self::Config {
            path: path.into(),
            message: message.to_string(),
        }
    }

    pub fn is_dependency_missing(&self) -> bool {
        matches!(self, Self::DependencyMissing { .. })
    }
}
