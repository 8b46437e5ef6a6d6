use std::fmt;

use serde::Serialize;

use crate::hashes::{DamageType, StatKind, TierType, WeaponClass, WeaponType};

/// A single plug (perk, frame, barrel, ...) that can sit in a socket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Plug {
    pub name: String,
    pub description: String,
    pub icon: Option<String>,
    /// Column label the plug was found under.
    pub category: String,
}

impl fmt::Display for Plug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// One perk column of a weapon.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PerkColumn {
    pub name: String,
    pub plugs: Vec<Plug>,
}

impl PerkColumn {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            plugs: Vec::new(),
        }
    }
}

/// Plug names, one per line.
impl fmt::Display for PerkColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, plug) in self.plugs.iter().enumerate() {
            if i > 0 {
                f.write_str("\n")?;
            }
            write!(f, "{plug}")?;
        }
        Ok(())
    }
}

/// Class, type, rarity and damage of a weapon.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct WeaponArchetype {
    pub class: Option<WeaponClass>,
    pub weapon_type: Option<WeaponType>,
    pub tier: Option<TierType>,
    pub damage: Option<DamageType>,
    /// Elemental damage; kinetic weapons don't show their damage type.
    pub is_energy: bool,
    pub power_cap: Option<u32>,
}

impl WeaponArchetype {
    /// Build from a weapon's item categories, tier hash and damage type.
    ///
    /// Bungie lists categories in no fixed order. Once sorted, the smallest is
    /// the generic weapon category and is skipped. Values below 5 are weapon
    /// classes, the rest weapon types.
    #[must_use]
    pub fn from_categories(categories: &[u32], tier_hash: u32, damage_type: u32) -> Self {
        let mut sorted = categories.to_vec();
        sorted.sort_unstable();
        let mut archetype = Self {
            tier: TierType::from_hash(tier_hash),
            damage: DamageType::from_hash(damage_type),
            is_energy: damage_type > 1,
            ..Self::default()
        };
        for &category in sorted.iter().skip(1) {
            if category < 5 {
                if let Some(class) = WeaponClass::from_hash(category) {
                    archetype.class = Some(class);
                }
            } else if let Some(weapon_type) = WeaponType::from_hash(category) {
                archetype.weapon_type = Some(weapon_type);
            }
        }
        archetype
    }

    /// Record the power cap. Caps whose decimal form starts with `9` are
    /// sentinels for "no cap".
    pub fn set_power_cap(&mut self, cap: u32) {
        self.power_cap = if cap.to_string().starts_with('9') {
            None
        } else {
            Some(cap)
        };
    }
}

/// `**[Damage ]Class[ Type][ (cap)]**`, or nothing when nothing is known.
impl fmt::Display for WeaponArchetype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut words: Vec<&str> = Vec::new();
        if self.is_energy {
            if let Some(damage) = self.damage {
                words.push(damage.label());
            }
        }
        if let Some(class) = self.class {
            words.push(class.label());
        }
        if let Some(weapon_type) = self.weapon_type {
            words.push(weapon_type.label());
        }

        let line = match (words.is_empty(), self.power_cap) {
            (true, None) => return Ok(()),
            (true, Some(cap)) => cap.to_string(),
            (false, None) => words.join(" "),
            (false, Some(cap)) => format!("{} ({cap})", words.join(" ")),
        };
        write!(f, "**{line}**")
    }
}

/// A stat value on a weapon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct WeaponStat {
    pub kind: StatKind,
    pub value: i64,
}

impl fmt::Display for WeaponStat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "**{}**: {}", self.kind, self.value)
    }
}

/// A fully resolved weapon.
#[derive(Debug, Clone, Serialize)]
pub struct Weapon {
    /// Row id in the manifest.
    pub id: i64,
    pub hash: u32,
    pub name: String,
    pub flavor_text: String,
    pub icon: Option<String>,
    pub screenshot: Option<String>,
    pub archetype: WeaponArchetype,
    pub has_random_rolls: bool,
    /// Name similarity against the search query.
    pub similarity: f64,
    pub intrinsic: Option<Plug>,
    pub perks: Vec<PerkColumn>,
    pub stats: Vec<WeaponStat>,
}

impl Weapon {
    #[must_use]
    pub fn is_exotic(&self) -> bool {
        self.archetype.tier == Some(TierType::Exotic)
    }

    #[must_use]
    pub fn stat(&self, kind: StatKind) -> Option<i64> {
        self.stats
            .iter()
            .find(|stat| stat.kind == kind)
            .map(|stat| stat.value)
    }

    /// Stats rendered one per line.
    #[must_use]
    pub fn stats_block(&self) -> String {
        self.stats
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_archetype_from_categories() {
        let archetype = WeaponArchetype::from_categories(&[1, 3, 8], TierType::Legendary.hash(), 2);
        assert_eq!(archetype.class, Some(WeaponClass::Energy));
        assert_eq!(archetype.weapon_type, Some(WeaponType::ScoutRifle));
        assert_eq!(archetype.damage, Some(DamageType::Arc));
        assert!(archetype.is_energy);
        assert_eq!(archetype.to_string(), "**Arc Energy Scout Rifle**");
    }

    #[test]
    fn test_archetype_unsorted_categories() {
        for categories in [[2, 1, 6], [6, 2, 1], [1, 6, 2]] {
            let archetype = WeaponArchetype::from_categories(&categories, 0, 1);
            assert_eq!(archetype.class, Some(WeaponClass::Kinetic), "{categories:?}");
            assert_eq!(archetype.weapon_type, Some(WeaponType::HandCannon), "{categories:?}");
            assert_eq!(archetype.to_string(), "**Kinetic Hand Cannon**");
        }
    }

    #[test]
    fn test_archetype_smallest_category_ignored() {
        // Without the weapon category the smallest entry still goes.
        let archetype = WeaponArchetype::from_categories(&[6, 2], 0, 1);
        assert_eq!(archetype.class, None);
        assert_eq!(archetype.weapon_type, Some(WeaponType::HandCannon));
    }

    #[test]
    fn test_kinetic_damage_hidden() {
        let mut archetype = WeaponArchetype::from_categories(&[1, 2, 6], 0, 1);
        archetype.set_power_cap(1060);
        assert_eq!(archetype.to_string(), "**Kinetic Hand Cannon (1060)**");
    }

    #[test]
    fn test_sentinel_power_cap_hidden() {
        let mut archetype = WeaponArchetype::from_categories(&[1, 2, 6], 0, 1);
        archetype.set_power_cap(999_990);
        assert_eq!(archetype.power_cap, None);
        assert_eq!(archetype.to_string(), "**Kinetic Hand Cannon**");
    }

    #[test]
    fn test_archetype_cap_only_and_empty() {
        let mut archetype = WeaponArchetype::default();
        assert_eq!(archetype.to_string(), "");
        archetype.set_power_cap(1310);
        assert_eq!(archetype.to_string(), "**1310**");
    }

    #[test]
    fn test_stat_display() {
        let stat = WeaponStat {
            kind: StatKind::RoundsPerMinute,
            value: 140,
        };
        assert_eq!(stat.to_string(), "**RPM**: 140");
    }

    #[test]
    fn test_perk_column_display() {
        let mut column = PerkColumn::new("Barrels");
        for name in ["Arrowhead Brake", "Corkscrew Rifling"] {
            column.plugs.push(Plug {
                name: name.to_string(),
                description: String::new(),
                icon: None,
                category: "Barrels".to_string(),
            });
        }
        assert_eq!(column.to_string(), "Arrowhead Brake\nCorkscrew Rifling");
    }
}
