use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use gunsmith::bot::command::{self, Command, Subject};
use gunsmith::bot::lookup::{self, Outcome};
use gunsmith::bot::render;
use gunsmith_core::{RollIndex, RollMode};
use gunsmith_manifest::{Config, ManifestStore};

/// Prefix used when replies refer back to a command.
const CLI_PREFIX: &str = "gunsmith";

#[derive(Debug, Clone, Copy)]
pub enum Lookup {
    Weapon { default: bool },
    Perk,
    Mod,
    Compare,
    Rolls,
}

impl Lookup {
    const fn subject(self) -> Subject {
        match self {
            Self::Weapon { .. } | Self::Compare => Subject::Weapon,
            Self::Perk => Subject::Perk,
            Self::Mod => Subject::Mod,
            Self::Rolls => Subject::RollQuery,
        }
    }

    fn command(self, query: String) -> Command {
        match self {
            Self::Weapon { default } => Command::Weapon {
                query,
                mode: if default {
                    RollMode::Default
                } else {
                    RollMode::AllRolls
                },
            },
            Self::Perk => Command::Perk(query),
            Self::Mod => Command::Mod(query),
            Self::Compare => Command::Compare(query),
            Self::Rolls => Command::Rolls(query),
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct LookupOptions {
    pub json: bool,
    /// Print every matching weapon instead of the best one.
    pub all: bool,
}

/// The manifest to query: `--manifest`, else the newest one on disk.
pub fn resolve_manifest(config: &Config, manifest: Option<PathBuf>) -> Result<PathBuf> {
    if let Some(path) = manifest {
        return Ok(path);
    }
    let store = ManifestStore::new(&config.manifest_dir, &config.language);
    store
        .latest_local()
        .context("Failed to read manifest directory")?
        .with_context(|| {
            format!(
                "No manifest found in {}\n\nRun 'gunsmith manifest update' to download it.",
                config.manifest_dir.display()
            )
        })
}

/// Run a lookup against the local manifest and print the reply.
pub fn lookup(
    config: &Config,
    manifest: Option<PathBuf>,
    kind: Lookup,
    query: &str,
    opts: LookupOptions,
) -> Result<()> {
    let subject = kind.subject();
    let query = command::validate_query(query, subject, CLI_PREFIX)?;
    let manifest = resolve_manifest(config, manifest)?;
    if matches!(kind, Lookup::Rolls) && manifest.is_file() {
        RollIndex::ensure(&manifest).context("Failed to build the roll index")?;
    }
    let outcome = run(&manifest, &kind.command(query.to_string()), subject)?;

    if opts.json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
        return Ok(());
    }

    match &outcome {
        Outcome::Weapons(weapons) if opts.all => {
            for (i, weapon) in weapons.iter().enumerate() {
                if i > 0 {
                    println!();
                }
                println!("{}", render::weapon_embed(weapon));
            }
        }
        _ => println!("{}", render::reply(&outcome, CLI_PREFIX)),
    }
    Ok(())
}

fn run(manifest: &Path, command: &Command, subject: Subject) -> Result<Outcome> {
    lookup::run(manifest, command).map_err(|e| {
        let reply = render::error_reply(subject, &e, CLI_PREFIX);
        anyhow::Error::new(e).context(reply.to_string())
    })
}
