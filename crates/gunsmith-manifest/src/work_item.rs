use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use treadle::WorkItem;

/// One run of the manifest refresh pipeline.
///
/// This is the treadle `WorkItem` that flows through the download → index
/// stages. Each run gets its own id so the state store records every
/// refresh separately.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshJob {
    id: String,
    pub started_at: DateTime<Utc>,
}

impl RefreshJob {
    #[must_use]
    pub fn new() -> Self {
        Self::at(Utc::now())
    }

    #[must_use]
    pub fn at(started_at: DateTime<Utc>) -> Self {
        Self {
            id: format!("refresh-{}", started_at.format("%Y%m%dT%H%M%S%.3fZ")),
            started_at,
        }
    }
}

impl Default for RefreshJob {
    fn default() -> Self {
        Self::new()
    }
}

impl WorkItem for RefreshJob {
    fn id(&self) -> &str {
        &self.id
    }
}

impl fmt::Display for RefreshJob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "manifest refresh started {}", self.started_at.to_rfc3339())
    }
}
