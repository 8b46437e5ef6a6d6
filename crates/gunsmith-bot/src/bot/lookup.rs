//! Runs a parsed command against a manifest.
//!
//! Everything here is synchronous SQLite work; the bot calls [`run`] from
//! `tokio::task::spawn_blocking`. Roll searches only read the roll index;
//! building it is the refresh pipeline's job.

use std::path::Path;

use gunsmith_core::model::{Comparison, Mod, Plug, Weapon};
use gunsmith_core::{Armory, Error, Result, RollFinder, RollQuery, RollSearch};
use serde::Serialize;

use crate::bot::command::Command;

/// The data a command produced, before rendering.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", content = "result", rename_all = "snake_case")]
pub enum Outcome {
    /// Every matching weapon, best match first.
    Weapons(Vec<Weapon>),
    Perk(Plug),
    Mod(Mod),
    Comparison(Comparison),
    Rolls(RollSearch),
    Help,
}

/// Execute `command` against the manifest at `manifest`.
///
/// An empty roll search is reported as `NotFound`.
pub fn run(manifest: &Path, command: &Command) -> Result<Outcome> {
    let armory = Armory::new(manifest);
    match command {
        Command::Weapon { query, mode } => {
            log::info!("Searching for '{query}'");
            let weapons = armory.weapon_details(query, *mode)?;
            log::info!("# of weapons found: {}", weapons.len());
            Ok(Outcome::Weapons(weapons))
        }
        Command::Perk(query) => {
            log::info!("Searching for perk '{query}'");
            armory.perk_details(query).map(Outcome::Perk)
        }
        Command::Mod(query) => {
            log::info!("Searching for mod '{query}'");
            armory.mod_details(query).map(Outcome::Mod)
        }
        Command::Compare(query) => {
            log::info!("Comparing '{query}'");
            armory.compare_weapons(query).map(Outcome::Comparison)
        }
        Command::Rolls(raw) => {
            let query = RollQuery::parse(raw)?;
            if !manifest.is_file() {
                return Err(Error::ManifestMissing(manifest.to_path_buf()));
            }
            let search = RollFinder::open(manifest)?.find(&query)?;
            log::info!("# of weapons found: {}", search.total);
            if search.is_empty() {
                return Err(Error::NotFound {
                    entity: "roll query",
                    query: raw.clone(),
                });
            }
            Ok(Outcome::Rolls(search))
        }
        Command::Help => Ok(Outcome::Help),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gunsmith_core::testkit;
    use gunsmith_core::{RollIndex, RollMode};

    fn fixture() -> (tempfile::TempDir, std::path::PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("world.content");
        testkit::write_fixture_manifest(&path).unwrap();
        RollIndex::build(&path).unwrap();
        (dir, path)
    }

    #[test]
    fn test_weapon_lookup() {
        let (_dir, manifest) = fixture();
        let command = Command::Weapon {
            query: "Fatebringer".to_string(),
            mode: RollMode::AllRolls,
        };
        let Outcome::Weapons(weapons) = run(&manifest, &command).unwrap() else {
            panic!("expected weapons");
        };
        assert_eq!(weapons[0].name, "Fatebringer");
    }

    #[test]
    fn test_help_needs_no_manifest() {
        let outcome = run(Path::new("/nonexistent/world.content"), &Command::Help).unwrap();
        assert!(matches!(outcome, Outcome::Help));
    }

    #[test]
    fn test_missing_manifest() {
        let err = run(
            Path::new("/nonexistent/world.content"),
            &Command::Perk("Outlaw".to_string()),
        )
        .unwrap_err();
        assert!(matches!(err, Error::ManifestMissing(_)));

        let err = run(
            Path::new("/nonexistent/world.content"),
            &Command::Rolls("-perks1 Outlaw".to_string()),
        )
        .unwrap_err();
        assert!(matches!(err, Error::ManifestMissing(_)));
    }

    #[test]
    fn test_roll_search_never_builds_index() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("world.content");
        testkit::write_fixture_manifest(&path).unwrap();

        let err = run(&path, &Command::Rolls("-perks1 Outlaw".to_string())).unwrap_err();
        assert!(matches!(err, Error::IndexMissing(_)));
        assert!(!RollIndex::path_for(&path).exists());
    }

    #[test]
    fn test_empty_roll_search_is_not_found() {
        let (_dir, manifest) = fixture();
        let err = run(&manifest, &Command::Rolls("-perks1 Moving Target".to_string())).unwrap_err();
        assert!(matches!(err, Error::NotFound { entity: "roll query", .. }));
    }

    #[test]
    fn test_bad_roll_query() {
        let (_dir, manifest) = fixture();
        let err = run(&manifest, &Command::Rolls("-sights Outlaw".to_string())).unwrap_err();
        assert!(matches!(err, Error::InvalidQuery(_)));
    }

    #[test]
    fn test_outcome_json_is_tagged() {
        let json = serde_json::to_value(Outcome::Help).unwrap();
        assert_eq!(json["kind"], "help");
    }
}
