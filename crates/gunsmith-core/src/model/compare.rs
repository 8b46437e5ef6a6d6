use serde::Serialize;

use crate::hashes::StatKind;
use crate::model::Weapon;

/// Which weapon of a comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    First,
    Second,
}

/// Stat comparison between two weapons.
#[derive(Debug, Clone, Serialize)]
pub struct Comparison {
    pub names: [String; 2],
    pub icons: [Option<String>; 2],
    /// Stats both weapons have, in display order.
    pub stats: Vec<StatKind>,
    /// First weapon's values.
    pub base: Vec<i64>,
    /// First minus second, per stat.
    pub deltas: Vec<i64>,
}

impl Comparison {
    #[must_use]
    pub fn new(first: &Weapon, second: &Weapon) -> Self {
        let mut stats: Vec<StatKind> = first
            .stats
            .iter()
            .map(|stat| stat.kind)
            .filter(|kind| second.stat(*kind).is_some())
            .collect();
        stats.sort_by_key(|kind| kind.order());

        let mut base = Vec::with_capacity(stats.len());
        let mut deltas = Vec::with_capacity(stats.len());
        for kind in &stats {
            let a = first.stat(*kind).unwrap_or_default();
            let b = second.stat(*kind).unwrap_or_default();
            base.push(a);
            deltas.push(a - b);
        }

        Self {
            names: [first.name.clone(), second.name.clone()],
            icons: [first.icon.clone(), second.icon.clone()],
            stats,
            base,
            deltas,
        }
    }

    #[must_use]
    pub fn name(&self, side: Side) -> &str {
        match side {
            Side::First => &self.names[0],
            Side::Second => &self.names[1],
        }
    }

    /// Stat labels, one per line.
    #[must_use]
    pub fn stat_names(&self) -> String {
        self.stats
            .iter()
            .map(|kind| kind.label())
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// One weapon's values, one per line, with the winning side in bold.
    #[must_use]
    pub fn column(&self, side: Side) -> String {
        self.base
            .iter()
            .zip(&self.deltas)
            .map(|(&value, &delta)| match side {
                Side::First if delta > 0 => format!("**{value} (+{delta})**"),
                Side::First => value.to_string(),
                Side::Second => {
                    let other = value - delta;
                    if delta < 0 {
                        format!("**{other} (+{})**", delta.abs())
                    } else {
                        other.to_string()
                    }
                }
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}
