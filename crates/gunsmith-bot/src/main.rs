use anyhow::Result;
use clap::{CommandFactory, Parser};
use gunsmith_manifest::Config;
use std::path::PathBuf;

mod commands;

use commands::LookupOptions;

#[derive(Debug, Parser)]
#[command(name = "gunsmith", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Manifest to query (default: newest manifest in the manifest directory)
    #[arg(long, global = true)]
    manifest: Option<PathBuf>,

    /// Directory for downloaded manifests (default: ~/.local/share/gunsmith/manifests)
    #[arg(long, global = true)]
    manifest_dir: Option<PathBuf>,
}

#[derive(Debug, clap::Subcommand)]
enum Commands {
    /// Start the Discord bot
    ///
    /// Downloads the current Destiny 2 manifest (or falls back to the newest
    /// one on disk), connects to Discord and answers `!gunsmith` commands.
    /// The manifest is refreshed every `update_interval_hours`.
    ///
    /// Requires DISCORD_KEY and BUNGIE_KEY (environment or config file).
    Run,
    /// Look up a weapon's perks
    Weapon {
        /// Weapon name, or part of it
        #[arg(required = true)]
        query: Vec<String>,

        /// Show only the curated default perks
        #[arg(long)]
        default: bool,

        /// Show every matching weapon, not just the best match
        #[arg(long)]
        all: bool,

        /// Print the resolved data as JSON
        #[arg(long)]
        json: bool,
    },
    /// Look up a weapon perk
    Perk {
        #[arg(required = true)]
        query: Vec<String>,

        #[arg(long)]
        json: bool,
    },
    /// Look up an armor or weapon mod by the start of its name
    Mod {
        #[arg(required = true)]
        query: Vec<String>,

        #[arg(long)]
        json: bool,
    },
    /// Compare the stats of two weapons: `gunsmith compare Fatebringer, Palindrome`
    Compare {
        #[arg(required = true)]
        query: Vec<String>,

        #[arg(long)]
        json: bool,
    },
    /// Find weapons that can roll the given perks
    ///
    /// Example: `gunsmith rolls -- -perks1 Outlaw -perks2 Rampage, Kill Clip`
    ///
    /// A single trait group matches either trait column; two trait groups
    /// must sit in opposite columns.
    Rolls {
        #[arg(required = true, allow_hyphen_values = true, trailing_var_arg = true)]
        query: Vec<String>,

        #[arg(long)]
        json: bool,
    },
    /// Manage the local manifest
    Manifest {
        #[command(subcommand)]
        action: ManifestAction,
    },
    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Debug, clap::Subcommand)]
enum ManifestAction {
    /// Download the current manifest if it changed and build its roll index
    Update,
    /// Show which manifest lookups will use
    Status,
}

#[derive(Debug, clap::Subcommand)]
enum ConfigAction {
    /// Show current effective configuration
    Show,
    /// Show config file path
    Path,
    /// Show example configuration
    Example,
    /// Initialize config file with defaults
    Init,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match cli.manifest_dir {
        Some(dir) => Config::load_with_manifest_dir(dir)?,
        None => Config::load()?,
    };
    gunsmith::logging::init(&config.logging)?;

    let Some(command) = cli.command else {
        Cli::command().print_help()?;
        return Ok(());
    };

    let manifest = cli.manifest;
    match command {
        Commands::Run => {
            commands::run_bot(config).await?;
        }
        Commands::Weapon {
            query,
            default,
            all,
            json,
        } => {
            let kind = commands::Lookup::Weapon { default };
            commands::lookup(&config, manifest, kind, &query.join(" "), LookupOptions { json, all })?;
        }
        Commands::Perk { query, json } => {
            let opts = LookupOptions { json, all: false };
            commands::lookup(&config, manifest, commands::Lookup::Perk, &query.join(" "), opts)?;
        }
        Commands::Mod { query, json } => {
            let opts = LookupOptions { json, all: false };
            commands::lookup(&config, manifest, commands::Lookup::Mod, &query.join(" "), opts)?;
        }
        Commands::Compare { query, json } => {
            let opts = LookupOptions { json, all: false };
            commands::lookup(&config, manifest, commands::Lookup::Compare, &query.join(" "), opts)?;
        }
        Commands::Rolls { query, json } => {
            let opts = LookupOptions { json, all: false };
            commands::lookup(&config, manifest, commands::Lookup::Rolls, &query.join(" "), opts)?;
        }
        Commands::Manifest { action } => match action {
            ManifestAction::Update => commands::manifest::update(&config).await?,
            ManifestAction::Status => commands::manifest::show_status(&config, manifest)?,
        },
        Commands::Config { action } => match action {
            ConfigAction::Show => commands::config::show_config(&config)?,
            ConfigAction::Path => commands::config::show_path()?,
            ConfigAction::Example => commands::config::show_example()?,
            ConfigAction::Init => commands::config::init_config()?,
        },
    }

    Ok(())
}
