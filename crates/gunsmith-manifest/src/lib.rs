//! Manifest lifecycle for gunsmith.
//!
//! Locates the current Destiny 2 manifest on Bungie.net, downloads and
//! unpacks it, tracks which manifest the bot is serving, and runs the
//! download and index stages as a treadle refresh pipeline. Also owns the
//! layered configuration shared by the binary.

#![deny(unsafe_code)]
#![warn(missing_debug_implementations)]

pub mod bungie;
pub mod config;
pub mod error;
pub mod refresh;
pub mod state;
pub mod store;
pub mod work_item;

pub use bungie::{BungieClient, ManifestInfo};
pub use config::{Config, LoggingConfig};
pub use error::{ManifestError, ManifestResult};
pub use refresh::{build_refresh_workflow, DownloadStage, IndexStage, Refresher, RunRecord};
pub use state::{ManifestState, SharedState};
pub use store::ManifestStore;
pub use work_item::RefreshJob;
