//! The manifest refresh pipeline.
//!
//! Two treadle stages: `download` makes sure the current manifest is on disk,
//! `index` builds its roll index and only then points the shared state at it,
//! so lookups never see a manifest without an index.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use gunsmith_core::RollIndex;
use tokio::sync::Mutex;
use treadle::{Stage, StageContext, StageOutcome, StageStatus, StateStore, WorkItem, Workflow};

use crate::bungie::BungieClient;
use crate::config::Config;
use crate::error::{ManifestError, ManifestResult};
use crate::state::SharedState;
use crate::store::ManifestStore;
use crate::work_item::RefreshJob;

/// Name of the treadle state store kept in the manifest directory.
const PIPELINE_STATE_FILE: &str = "pipeline.db";

#[derive(Debug, Default)]
struct Recorded {
    downloaded: Option<PathBuf>,
    error: Option<ManifestError>,
}

/// Passed between the stages of one workflow: the manifest the download
/// stage fetched, and the typed error of the first stage that failed.
///
/// treadle only keeps a stage error as text, so the refresher reads the
/// original back from here.
#[derive(Debug, Clone, Default)]
pub struct RunRecord {
    inner: Arc<Mutex<Recorded>>,
}

impl RunRecord {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    async fn set_downloaded(&self, path: PathBuf) {
        self.inner.lock().await.downloaded = Some(path);
    }

    async fn take_downloaded(&self) -> Option<PathBuf> {
        self.inner.lock().await.downloaded.take()
    }

    /// Keep `error` for the refresher and hand treadle its text.
    async fn fail(&self, context: &str, error: ManifestError) -> treadle::TreadleError {
        let message = format!("{context}: {error}");
        let mut recorded = self.inner.lock().await;
        if recorded.error.is_none() {
            recorded.error = Some(error);
        }
        treadle::TreadleError::StageExecution(message)
    }

    async fn take_error(&self) -> Option<ManifestError> {
        self.inner.lock().await.error.take()
    }

    async fn clear(&self) {
        *self.inner.lock().await = Recorded::default();
    }
}

/// The download stage: fetch the manifest if Bungie has a newer one.
#[derive(Debug)]
pub struct DownloadStage {
    client: BungieClient,
    store: ManifestStore,
    record: RunRecord,
}

impl DownloadStage {
    #[must_use]
    pub fn new(client: BungieClient, store: ManifestStore, record: RunRecord) -> Self {
        Self {
            client,
            store,
            record,
        }
    }
}

#[async_trait::async_trait]
impl Stage for DownloadStage {
    fn name(&self) -> &str {
        "download"
    }

    async fn execute(
        &self,
        _item: &dyn WorkItem,
        _context: &mut StageContext,
    ) -> treadle::Result<StageOutcome> {
        match self.store.ensure(&self.client).await {
            Ok(path) => {
                self.record.set_downloaded(path).await;
                Ok(StageOutcome::Complete)
            }
            Err(e) => Err(self.record.fail("Manifest download failed", e).await),
        }
    }
}

/// The index stage: build the roll index for the downloaded manifest (or,
/// without a download, the one currently served) and serve it.
#[derive(Debug)]
pub struct IndexStage {
    state: SharedState,
    record: RunRecord,
}

impl IndexStage {
    #[must_use]
    pub fn new(state: SharedState) -> Self {
        Self::with_record(state, RunRecord::new())
    }

    #[must_use]
    pub fn with_record(state: SharedState, record: RunRecord) -> Self {
        Self { state, record }
    }

    async fn index(&self) -> ManifestResult<(PathBuf, usize)> {
        let manifest = match self.record.take_downloaded().await {
            Some(path) => path,
            None => self
                .state
                .read()
                .await
                .current()
                .map(PathBuf::from)
                .ok_or(ManifestError::NoManifest)?,
        };

        let target = manifest.clone();
        let count = tokio::task::spawn_blocking(move || {
            RollIndex::ensure(&target).and_then(|index| index.weapon_count())
        })
        .await??;
        Ok((manifest, count))
    }
}

#[async_trait::async_trait]
impl Stage for IndexStage {
    fn name(&self) -> &str {
        "index"
    }

    async fn execute(
        &self,
        _item: &dyn WorkItem,
        _context: &mut StageContext,
    ) -> treadle::Result<StageOutcome> {
        let (manifest, count) = match self.index().await {
            Ok(indexed) => indexed,
            Err(e) => return Err(self.record.fail("Roll index build failed", e).await),
        };

        log::info!("Roll index ready with {count} weapons");
        if self.state.write().await.replace(manifest.clone()) {
            log::info!("Now serving manifest {}", manifest.display());
        }
        Ok(StageOutcome::Complete)
    }
}

/// Build the download → index workflow.
///
/// # Errors
/// Returns an error if the workflow cannot be built.
pub fn build_refresh_workflow(
    client: BungieClient,
    store: ManifestStore,
    state: SharedState,
    record: &RunRecord,
) -> treadle::Result<Workflow> {
    Workflow::builder()
        .stage("download", DownloadStage::new(client, store, record.clone()))
        .stage("index", IndexStage::with_record(state, record.clone()))
        .dependency("index", "download")
        .build()
}

/// Runs the refresh workflow against a persistent state store.
pub struct Refresher {
    workflow: Workflow,
    record: RunRecord,
    state_store: PathBuf,
}

impl fmt::Debug for Refresher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Refresher")
            .field("state_store", &self.state_store)
            .finish_non_exhaustive()
    }
}

impl Refresher {
    /// Build the refresher from configuration.
    ///
    /// Stage events are forwarded to the log for as long as the refresher
    /// lives, so this must be called inside a tokio runtime.
    pub fn new(config: &Config, state: SharedState) -> ManifestResult<Self> {
        let client = BungieClient::new(config.bungie_key()?)?;
        let store = ManifestStore::new(&config.manifest_dir, &config.language);
        Self::from_parts(client, store, state)
    }

    /// Build the refresher around an existing client and store.
    pub fn from_parts(
        client: BungieClient,
        store: ManifestStore,
        state: SharedState,
    ) -> ManifestResult<Self> {
        std::fs::create_dir_all(store.dir())?;
        let state_store = store.dir().join(PIPELINE_STATE_FILE);
        let record = RunRecord::new();
        let workflow = build_refresh_workflow(client, store, state, &record)?;

        let mut events = workflow.subscribe();
        tokio::spawn(async move {
            while let Ok(event) = events.recv().await {
                match event {
                    treadle::WorkflowEvent::StageStarted { stage, .. } => {
                        log::debug!("[{stage}] Starting");
                    }
                    treadle::WorkflowEvent::StageCompleted { stage, .. } => {
                        log::info!("[{stage}] Complete");
                    }
                    treadle::WorkflowEvent::StageFailed { stage, error, .. } => {
                        log::debug!("[{stage}] FAILED: {error}");
                    }
                    _ => {}
                }
            }
        });

        Ok(Self {
            workflow,
            record,
            state_store,
        })
    }

    /// Run one refresh.
    ///
    /// Returns the error of the first failed stage. The job's rows are removed
    /// from the state store afterwards, whatever the outcome.
    pub async fn run(&self) -> ManifestResult<()> {
        let mut store = treadle::SqliteStateStore::open(&self.state_store).await?;
        let job = RefreshJob::new();
        log::info!("Starting {job}");
        self.record.clear().await;

        let advanced = self.workflow.advance(&job, &mut store).await;
        let status = self.workflow.status(job.id(), &store).await;
        if let Err(e) = store.delete_work_item(job.id()).await {
            log::warn!("Could not remove {job} from the state store: {e}");
        }
        advanced?;
        let status = status?;

        if let Some(error) = self.record.take_error().await {
            return Err(error);
        }
        let unfinished = status
            .stages
            .iter()
            .find(|stage| !matches!(stage.status, StageStatus::Complete));
        if let Some(stage) = unfinished {
            return Err(ManifestError::StageFailed {
                stage: stage.name.clone(),
                message: stage
                    .error
                    .clone()
                    .unwrap_or_else(|| format!("{:?}", stage.status)),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::ManifestState;
    use gunsmith_core::testkit;

    #[tokio::test]
    async fn test_workflow_construction() {
        let dir = tempfile::tempdir().unwrap();
        let client = BungieClient::new("key").unwrap();
        let store = ManifestStore::new(dir.path(), "en");
        let state = ManifestState::new().shared();
        assert!(build_refresh_workflow(client, store, state, &RunRecord::new()).is_ok());
    }

    #[tokio::test]
    async fn test_index_stage_builds_roll_index() {
        let dir = tempfile::tempdir().unwrap();
        let manifest = dir.path().join("world.content");
        testkit::write_fixture_manifest(&manifest).unwrap();
        let state = ManifestState::with_current(&manifest).shared();

        let stage = IndexStage::new(state);
        let job = RefreshJob::new();
        let mut ctx = StageContext::new("index".to_string());
        let outcome = stage.execute(&job, &mut ctx).await.unwrap();

        assert_eq!(outcome, StageOutcome::Complete);
        assert!(RollIndex::path_for(&manifest).is_file());
    }

    #[tokio::test]
    async fn test_index_stage_serves_download_after_indexing() {
        let dir = tempfile::tempdir().unwrap();
        let old = dir.path().join("world_sql_content_old.content");
        let new = dir.path().join("world_sql_content_new.content");
        testkit::write_fixture_manifest(&old).unwrap();
        testkit::write_fixture_manifest(&new).unwrap();
        let state = ManifestState::with_current(&old).shared();

        let record = RunRecord::new();
        record.set_downloaded(new.clone()).await;
        let stage = IndexStage::with_record(Arc::clone(&state), record);
        let mut ctx = StageContext::new("index".to_string());
        stage.execute(&RefreshJob::new(), &mut ctx).await.unwrap();

        assert!(RollIndex::path_for(&new).is_file());
        let state = state.read().await;
        assert_eq!(state.current(), Some(new.as_path()));
        assert_eq!(state.old(), &[old]);
    }

    #[tokio::test]
    async fn test_index_stage_without_manifest_fails() {
        let record = RunRecord::new();
        let stage = IndexStage::with_record(ManifestState::new().shared(), record.clone());
        let job = RefreshJob::new();
        let mut ctx = StageContext::new("index".to_string());
        assert!(stage.execute(&job, &mut ctx).await.is_err());
        assert!(matches!(record.take_error().await, Some(ManifestError::NoManifest)));
    }

    #[tokio::test]
    async fn test_refresher_requires_bungie_key() {
        let config = Config {
            bungie_key: None,
            ..Config::default()
        };
        let err = Refresher::new(&config, ManifestState::new().shared()).unwrap_err();
        assert!(matches!(err, ManifestError::MissingKey("BUNGIE_KEY")));
    }
}
