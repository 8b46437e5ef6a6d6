use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::Path;

use rusqlite::{params, OptionalExtension};
use serde::Serialize;

use crate::error::Result;
use crate::rolls::{RollColumn, RollIndex, RollQuery};

type WeaponIds = BTreeSet<i64>;

/// Weapons matching a roll query, grouped by weapon type.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RollSearch {
    pub total: usize,
    /// Weapon type label to sorted, de-duplicated weapon names.
    pub by_type: BTreeMap<String, Vec<String>>,
}

impl RollSearch {
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.total == 0
    }
}

/// `Total: n`, then one `**Type**: a, b` line per weapon type.
impl fmt::Display for RollSearch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Total: {}", self.total)?;
        for (weapon_type, names) in &self.by_type {
            write!(f, "\n**{weapon_type}**: {}", names.join(", "))?;
        }
        Ok(())
    }
}

#[derive(Debug)]
pub struct RollFinder {
    index: RollIndex,
}

impl RollFinder {
    #[must_use]
    pub const fn new(index: RollIndex) -> Self {
        Self { index }
    }

    /// Finder over the already built index for `manifest`.
    pub fn open(manifest: &Path) -> Result<Self> {
        Ok(Self::new(RollIndex::open(RollIndex::path_for(manifest))?))
    }

    /// Finder over the index for `manifest`, building the index if needed.
    pub fn ensure(manifest: &Path) -> Result<Self> {
        Ok(Self::new(RollIndex::ensure(manifest)?))
    }

    /// Weapons that can roll every requested perk.
    ///
    /// Columns are intersected. Trait perks are matched across both trait
    /// columns: a single trait group may sit in either column, and two groups
    /// must sit in opposite columns, in either order.
    pub fn find(&self, query: &RollQuery) -> Result<RollSearch> {
        let mut sets: Vec<WeaponIds> = Vec::new();

        match (query.perks(RollColumn::Perks1), query.perks(RollColumn::Perks2)) {
            (Some(first), Some(second)) => {
                let first_in_1 = self.weapons_with_all(RollColumn::Perks1, first)?;
                let first_in_2 = self.weapons_with_all(RollColumn::Perks2, first)?;
                let second_in_1 = self.weapons_with_all(RollColumn::Perks1, second)?;
                let second_in_2 = self.weapons_with_all(RollColumn::Perks2, second)?;
                let straight = &first_in_1 & &second_in_2;
                let swapped = &first_in_2 & &second_in_1;
                sets.push(&straight | &swapped);
            }
            (Some(group), None) | (None, Some(group)) => {
                let in_1 = self.weapons_with_all(RollColumn::Perks1, group)?;
                let in_2 = self.weapons_with_all(RollColumn::Perks2, group)?;
                sets.push(&in_1 | &in_2);
            }
            (None, None) => {}
        }

        for (column, perks) in query.columns().filter(|(column, _)| !column.is_trait()) {
            sets.push(self.weapons_with_all(column, perks)?);
        }

        let ids = intersect_all(sets);
        self.summarize(&ids)
    }

    fn weapons_with(&self, column: RollColumn, perk: &str) -> Result<WeaponIds> {
        let mut stmt = self.index.conn().prepare_cached(
            "SELECT weapon_id FROM weapon_perks WHERE column_name = ?1 AND perk_name = ?2",
        )?;
        let ids = stmt
            .query_map(params![column.as_str(), perk], |row| row.get(0))?
            .collect::<rusqlite::Result<WeaponIds>>()?;
        if ids.is_empty() {
            log::warn!("'{perk}' not found in {column}");
        }
        Ok(ids)
    }

    fn weapons_with_all(&self, column: RollColumn, perks: &[String]) -> Result<WeaponIds> {
        let mut sets = Vec::with_capacity(perks.len());
        for perk in perks {
            sets.push(self.weapons_with(column, perk)?);
        }
        Ok(intersect_all(sets))
    }

    fn summarize(&self, ids: &WeaponIds) -> Result<RollSearch> {
        let mut stmt = self
            .index
            .conn()
            .prepare_cached("SELECT name, weapon_type FROM weapons WHERE id = ?1")?;
        let mut by_type: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
        for id in ids {
            let row: Option<(String, Option<String>)> = stmt
                .query_row([id], |row| Ok((row.get(0)?, row.get(1)?)))
                .optional()?;
            if let Some((name, Some(weapon_type))) = row {
                by_type.entry(weapon_type).or_default().insert(name);
            }
        }

        let by_type: BTreeMap<String, Vec<String>> = by_type
            .into_iter()
            .map(|(weapon_type, names)| (weapon_type, names.into_iter().collect()))
            .collect();
        let total = by_type.values().map(Vec::len).sum();
        Ok(RollSearch { total, by_type })
    }
}

fn intersect_all(sets: Vec<WeaponIds>) -> WeaponIds {
    let mut sets = sets.into_iter();
    let Some(first) = sets.next() else {
        return WeaponIds::new();
    };
    sets.fold(first, |acc, set| &acc & &set)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testkit;

    fn finder() -> (tempfile::TempDir, RollFinder) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("world.content");
        testkit::write_fixture_manifest(&path).unwrap();
        let finder = RollFinder::ensure(&path).unwrap();
        (dir, finder)
    }

    fn find(finder: &RollFinder, raw: &str) -> RollSearch {
        finder.find(&RollQuery::parse(raw).unwrap()).unwrap()
    }

    #[test]
    fn test_two_trait_groups_either_order() {
        let (_dir, finder) = finder();
        let result = find(&finder, "-perks1 Outlaw -perks2 Rampage");
        assert_eq!(result.total, 3);
        assert_eq!(
            result.by_type["Hand Cannon"],
            vec!["Fatebringer", "Fatebringer (Timelost)"]
        );
        assert_eq!(result.by_type["Scout Rifle"], vec!["Vision of Confluence"]);
    }

    #[test]
    fn test_single_trait_group_matches_either_column() {
        let (_dir, finder) = finder();
        let result = find(&finder, "-perks2 outlaw");
        assert_eq!(result.total, 4);
        assert!(result.by_type["Hand Cannon"].contains(&"Ace of Spades".to_string()));
    }

    #[test]
    fn test_trait_group_needs_all_perks_in_one_column() {
        let (_dir, finder) = finder();
        let result = find(&finder, "-perks1 Outlaw, Rampage");
        assert!(result.is_empty());
        assert!(result.by_type.is_empty());
    }

    #[test]
    fn test_columns_intersect() {
        let (_dir, finder) = finder();
        let result = find(&finder, "-barrels Arrowhead Brake -perks1 Kill Clip");
        assert_eq!(result.total, 3);

        let result = find(&finder, "-intrinsics Precision Frame -perks1 Explosive Payload");
        assert!(result.is_empty());
    }

    #[test]
    fn test_unknown_perk_is_empty() {
        let (_dir, finder) = finder();
        assert!(find(&finder, "-scopes Iron Sights").is_empty());
    }

    #[test]
    fn test_retired_perk_not_indexed() {
        let (_dir, finder) = finder();
        assert!(find(&finder, "-perks1 Retired Perk").is_empty());
    }

    #[test]
    fn test_display() {
        let (_dir, finder) = finder();
        let result = find(&finder, "-intrinsics Precision Frame");
        assert_eq!(
            result.to_string(),
            "Total: 2\n**Hand Cannon**: Ace of Spades\n**Scout Rifle**: Vision of Confluence"
        );
    }

    #[test]
    fn test_open_needs_built_index() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("world.content");
        testkit::write_fixture_manifest(&path).unwrap();

        let err = RollFinder::open(&path).unwrap_err();
        assert!(matches!(err, crate::Error::IndexMissing(_)));
        assert!(!RollIndex::path_for(&path).exists());

        RollIndex::build(&path).unwrap();
        let finder = RollFinder::open(&path).unwrap();
        assert_eq!(find(&finder, "-perks1 Outlaw -perks2 Rampage").total, 3);
    }

    #[test]
    fn test_intersect_all() {
        let a: WeaponIds = [1, 2, 3].into_iter().collect();
        let b: WeaponIds = [2, 3, 4].into_iter().collect();
        assert_eq!(intersect_all(vec![a, b]), [2, 3].into_iter().collect());
        assert!(intersect_all(Vec::new()).is_empty());
    }
}
