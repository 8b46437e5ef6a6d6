use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use gunsmith_core::RollIndex;
use gunsmith_manifest::{Config, ManifestState, ManifestStore, Refresher};

use crate::commands::lookup::resolve_manifest;

/// Download the current manifest if it changed, build its roll index and
/// delete the manifest it replaced.
pub async fn update(config: &Config) -> Result<()> {
    let store = ManifestStore::new(&config.manifest_dir, &config.language);
    let state = match store.latest_local()? {
        Some(path) => ManifestState::with_current(path),
        None => ManifestState::new(),
    }
    .shared();

    let refresher = Refresher::new(config, Arc::clone(&state))?;
    refresher.run().await.context("Manifest update failed")?;

    let mut state = state.write().await;
    let removed = state.purge_old();
    let current = state
        .current()
        .context("Manifest update failed; see the log for details")?;

    println!("✓ Manifest: {}", current.display());
    if removed > 0 {
        println!("  Removed {removed} old manifest(s)");
    }
    Ok(())
}

/// Show the manifest lookups will use and the state of its roll index.
pub fn show_status(config: &Config, manifest: Option<PathBuf>) -> Result<()> {
    println!("\nGunsmith Manifest Status\n");
    println!("  Directory: {}", config.manifest_dir.display());
    println!("  Language: {}", config.language);

    let Ok(manifest) = resolve_manifest(config, manifest) else {
        println!("  Manifest: <none>");
        println!("\n  Run `gunsmith manifest update` to download it");
        return Ok(());
    };
    println!("  Manifest: {}", manifest.display());
    if !manifest.is_file() {
        println!("  (file does not exist)");
        return Ok(());
    }

    let index_path = RollIndex::path_for(&manifest);
    if index_path.is_file() {
        let index = RollIndex::open(&index_path)?;
        println!("  Roll index: {} weapons", index.weapon_count()?);
    } else {
        println!("  Roll index: not built (run `gunsmith manifest update`)");
    }

    Ok(())
}
