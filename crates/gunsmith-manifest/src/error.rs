//! Error types for manifest download and refresh.

use thiserror::Error;

/// Errors that can occur while obtaining or refreshing a manifest.
#[derive(Debug, Error)]
pub enum ManifestError {
    /// Bungie.net answered with a non-success HTTP status.
    #[error("HTTP error from bungie.net: {status} {message}")]
    Http { status: u16, message: String },

    /// Bungie.net returned a rate-limit response.
    #[error("rate limited by bungie.net")]
    RateLimited,

    /// The platform envelope carried an error code other than success.
    #[error("bungie.net API error {code} ({status}): {message}")]
    Api {
        code: i64,
        status: String,
        message: String,
    },

    /// The manifest has no content for the configured language.
    #[error("no manifest content for language '{0}'")]
    MissingLanguage(String),

    /// A required key is not configured.
    #[error("Please set the environment variable for {0}")]
    MissingKey(&'static str),

    /// The downloaded archive held no entries.
    #[error("manifest archive is empty")]
    EmptyArchive,

    /// An error propagated from `reqwest`.
    #[error("request error: {0}")]
    Request(#[from] reqwest::Error),

    /// The downloaded archive could not be read.
    #[error("archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// There is no manifest for the index stage to work on.
    #[error("no manifest to index")]
    NoManifest,

    /// A refresh stage failed without recording a more specific error.
    #[error("refresh stage '{stage}' failed: {message}")]
    StageFailed { stage: String, message: String },

    /// An error propagated from the manifest query layer.
    #[error("manifest database error: {0}")]
    Core(#[from] gunsmith_core::Error),

    /// The refresh pipeline failed.
    #[error("pipeline error: {0}")]
    Pipeline(#[from] treadle::TreadleError),

    /// A blocking task panicked or was cancelled.
    #[error("background task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

impl ManifestError {
    /// Returns `true` when the error is transient and the next scheduled
    /// refresh may succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::RateLimited | Self::Request(_) => true,
            Self::Http { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

/// Convenience alias for manifest results.
pub type ManifestResult<T> = std::result::Result<T, ManifestError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_errors() {
        assert!(ManifestError::RateLimited.is_transient());
        assert!(ManifestError::Http {
            status: 503,
            message: "Service Unavailable".to_string()
        }
        .is_transient());
        assert!(!ManifestError::Http {
            status: 401,
            message: "Unauthorized".to_string()
        }
        .is_transient());
        assert!(!ManifestError::MissingKey("BUNGIE_KEY").is_transient());
    }

    #[test]
    fn test_missing_key_message() {
        assert_eq!(
            ManifestError::MissingKey("DISCORD_KEY").to_string(),
            "Please set the environment variable for DISCORD_KEY"
        );
    }
}
