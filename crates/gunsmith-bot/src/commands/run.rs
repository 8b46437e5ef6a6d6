use std::sync::Arc;

use anyhow::{Context, Result};
use gunsmith::bot::{scheduler, Handler};
use gunsmith_core::RollIndex;
use gunsmith_manifest::{Config, ManifestState, ManifestStore, Refresher, SharedState};
use serenity::prelude::{Client, GatewayIntents};

/// Start the bot and block until it disconnects or ctrl-c is pressed.
///
/// A manifest is loaded before connecting to Discord: the refresh pipeline
/// runs once, and if that fails the newest manifest on disk is used.
pub async fn run_bot(config: Config) -> Result<()> {
    let token = config
        .discord_key()
        .inspect_err(|e| log::error!("{e}"))?
        .to_string();

    let state = ManifestState::new().shared();
    let refresher = Refresher::new(&config, Arc::clone(&state)).inspect_err(|e| log::error!("{e}"))?;
    let refresher = Arc::new(refresher);

    load_initial_manifest(&config, &refresher, &state).await?;

    let intents = GatewayIntents::GUILD_MESSAGES
        | GatewayIntents::DIRECT_MESSAGES
        | GatewayIntents::MESSAGE_CONTENT;
    let handler = Handler::new(Arc::clone(&state), config.command_prefix.clone());
    let mut client = Client::builder(&token, intents)
        .event_handler(handler)
        .await
        .context("Failed to create Discord client")?;

    let refresh_task = scheduler::spawn(
        Arc::clone(&refresher),
        Arc::clone(&state),
        scheduler::interval_from_hours(config.update_interval_hours),
    );

    let shard_manager = Arc::clone(&client.shard_manager);
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            log::error!("Failed to listen for ctrl-c: {e}");
            return;
        }
        log::info!("Received ctrl-c, disconnecting");
        shard_manager.shutdown_all().await;
    });

    log::info!("Starting up bot");
    let result = client.start().await;
    refresh_task.abort();
    log::info!("Shutting down bot");
    result.context("Discord client stopped with an error")
}

async fn load_initial_manifest(
    config: &Config,
    refresher: &Refresher,
    state: &SharedState,
) -> Result<()> {
    if let Err(e) = refresher.run().await {
        log::error!("Failed to refresh manifest: {e}");
    }
    if let Some(path) = state.read().await.current() {
        log::info!("Serving manifest {}", path.display());
        return Ok(());
    }

    let store = ManifestStore::new(&config.manifest_dir, &config.language);
    match store.latest_local()? {
        Some(path) => {
            log::warn!("Using manifest already on disk: {}", path.display());
            let manifest = path.clone();
            if let Err(e) = tokio::task::spawn_blocking(move || RollIndex::ensure(&manifest)).await? {
                log::error!("Roll searches are unavailable: {e}");
            }
            *state.write().await = ManifestState::with_current(path);
            Ok(())
        }
        None => {
            log::error!("Failed to retrieve manifest. Quitting.");
            anyhow::bail!("No manifest available in {}", config.manifest_dir.display())
        }
    }
}
