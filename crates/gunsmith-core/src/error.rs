use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("manifest not found at {}", .0.display())]
    ManifestMissing(PathBuf),

    #[error("roll index not built at {}", .0.display())]
    IndexMissing(PathBuf),

    #[error("not found: {entity} matching '{query}'")]
    NotFound { entity: &'static str, query: String },

    #[error("invalid data: {0}")]
    InvalidData(String),

    #[error("invalid query: {0}")]
    InvalidQuery(String),
}

impl Error {
    pub(crate) fn not_found(entity: &'static str, query: impl Into<String>) -> Self {
        Self::NotFound {
            entity,
            query: query.into(),
        }
    }

    /// Returns `true` when the manifest data itself could not be interpreted.
    pub fn is_parse_failure(&self) -> bool {
        matches!(self, Self::Serialization(_) | Self::InvalidData(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
