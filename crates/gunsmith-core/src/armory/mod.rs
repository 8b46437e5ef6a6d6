//! Weapon, perk and mod lookups against a manifest.
//!
//! Every lookup opens its own read-only connection, so an [`Armory`] is cheap
//! to clone and safe to use from blocking worker threads.

mod mods;
mod weapon;

use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::hashes::PlugCategory;
use crate::manifest::ManifestDb;
use crate::model::{Comparison, Mod, Plug, Weapon};
use crate::similarity;

/// Which plugs to list for each socket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RollMode {
    /// Every plug that can currently roll, one column per socket.
    #[default]
    AllRolls,
    /// Only the plugs the weapon ships with, in a single column.
    Default,
}

#[derive(Debug, Clone)]
pub struct Armory {
    manifest_path: PathBuf,
}

impl Armory {
    #[must_use]
    pub fn new(manifest_path: impl Into<PathBuf>) -> Self {
        Self {
            manifest_path: manifest_path.into(),
        }
    }

    #[must_use]
    pub fn manifest_path(&self) -> &Path {
        &self.manifest_path
    }

    fn open(&self) -> Result<ManifestDb> {
        ManifestDb::open(&self.manifest_path)
    }

    /// All weapons whose name contains `query`.
    ///
    /// Random-rolled and exotic weapons come first, then results are ordered
    /// by name similarity. The sort is stable, so equally similar weapons keep
    /// that grouping.
    pub fn weapon_details(&self, query: &str, mode: RollMode) -> Result<Vec<Weapon>> {
        let db = self.open()?;
        let mut featured = Vec::new();
        let mut others = Vec::new();

        for (id, def) in db.search_items(query)? {
            if !weapon::is_weapon(&def) {
                continue;
            }
            let resolved = weapon::resolve(&db, id, &def, query, mode)?;
            if resolved.has_random_rolls || resolved.is_exotic() {
                featured.push(resolved);
            } else {
                others.push(resolved);
            }
        }

        let ranked = rank(featured, others);
        if ranked.is_empty() {
            return Err(Error::not_found("weapon", query));
        }
        log::info!("Found {} weapons matching '{query}'", ranked.len());
        Ok(ranked)
    }

    /// The weapon plug whose name best matches `query`.
    pub fn perk_details(&self, query: &str) -> Result<Plug> {
        let db = self.open()?;
        let mut best: Option<(f64, Plug)> = None;

        for (_, def) in db.search_items(query)? {
            let Some(category) = def
                .plug
                .as_ref()
                .and_then(|plug| PlugCategory::from_hash(plug.plug_category_hash))
            else {
                continue;
            };
            let score = similarity::ratio(&def.display_properties.name, query);
            if best.as_ref().is_some_and(|(top, _)| *top >= score) {
                continue;
            }
            if let Some(plug) = weapon::plug(&db, def.hash, category.label())? {
                best = Some((score, plug));
            }
        }

        best.map(|(_, plug)| plug)
            .ok_or_else(|| Error::not_found("perk", query))
    }

    /// The first mod whose name starts with `query`.
    pub fn mod_details(&self, query: &str) -> Result<Mod> {
        let db = self.open()?;
        mods::find(&db, query)
    }

    /// Compare the stats of two weapons given as `"first, second"`.
    pub fn compare_weapons(&self, query: &str) -> Result<Comparison> {
        let names: Vec<&str> = query.split(',').map(str::trim).collect();
        let [first, second] = names.as_slice() else {
            return Err(Error::InvalidQuery(
                "expected exactly two weapons separated by a comma".to_string(),
            ));
        };

        let first = self.top_weapon(first)?;
        let second = self.top_weapon(second)?;
        Ok(Comparison::new(&first, &second))
    }

    fn top_weapon(&self, query: &str) -> Result<Weapon> {
        self.weapon_details(query, RollMode::AllRolls)?
            .into_iter()
            .next()
            .ok_or_else(|| Error::not_found("weapon", query))
    }
}

/// Featured weapons ahead of the rest, then by descending similarity.
fn rank(mut featured: Vec<Weapon>, mut others: Vec<Weapon>) -> Vec<Weapon> {
    featured.append(&mut others);
    featured.sort_by(|a, b| b.similarity.total_cmp(&a.similarity));
    featured
}
