//! The roll index: which weapons can roll which perks.
//!
//! The index is a small SQLite database derived from a manifest and stored
//! next to it. It is rebuilt whenever a new manifest is downloaded.

mod finder;
mod index;
mod migrations;
mod query;

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::error::Error;
use crate::hashes::PlugCategory;

pub use finder::{RollFinder, RollSearch};
pub use index::RollIndex;
pub use query::RollQuery;

/// A searchable perk column.
///
/// Trait perks are split in two: the first trait socket on a weapon is
/// `perks1`, any later one `perks2`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum RollColumn {
    Intrinsics,
    Stocks,
    Perks1,
    Perks2,
    Barrels,
    Bowstrings,
    Magazines,
    Projectiles,
    Blades,
    Grips,
    Batteries,
    Guards,
    Scopes,
    Arrows,
    Launchers,
}

impl RollColumn {
    pub const ALL: &'static [Self] = &[
        Self::Intrinsics,
        Self::Stocks,
        Self::Perks1,
        Self::Perks2,
        Self::Barrels,
        Self::Bowstrings,
        Self::Magazines,
        Self::Projectiles,
        Self::Blades,
        Self::Grips,
        Self::Batteries,
        Self::Guards,
        Self::Scopes,
        Self::Arrows,
        Self::Launchers,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Intrinsics => "intrinsics",
            Self::Stocks => "stocks",
            Self::Perks1 => "perks1",
            Self::Perks2 => "perks2",
            Self::Barrels => "barrels",
            Self::Bowstrings => "bowstrings",
            Self::Magazines => "magazines",
            Self::Projectiles => "projectiles",
            Self::Blades => "blades",
            Self::Grips => "grips",
            Self::Batteries => "batteries",
            Self::Guards => "guards",
            Self::Scopes => "scopes",
            Self::Arrows => "arrows",
            Self::Launchers => "launchers",
        }
    }

    #[must_use]
    pub const fn is_trait(self) -> bool {
        matches!(self, Self::Perks1 | Self::Perks2)
    }

    /// Column a plug category is indexed under. `later_trait` selects
    /// `perks2` for trait sockets after the first.
    #[must_use]
    pub const fn from_plug_category(category: PlugCategory, later_trait: bool) -> Self {
        match category {
            PlugCategory::Intrinsics => Self::Intrinsics,
            PlugCategory::Stocks => Self::Stocks,
            PlugCategory::Perks if later_trait => Self::Perks2,
            PlugCategory::Perks => Self::Perks1,
            PlugCategory::Barrels => Self::Barrels,
            PlugCategory::Bowstrings => Self::Bowstrings,
            PlugCategory::Magazines => Self::Magazines,
            PlugCategory::Projectiles => Self::Projectiles,
            PlugCategory::Blades => Self::Blades,
            PlugCategory::Grips => Self::Grips,
            PlugCategory::Batteries => Self::Batteries,
            PlugCategory::Guards => Self::Guards,
            PlugCategory::Scopes => Self::Scopes,
            PlugCategory::Arrows => Self::Arrows,
            PlugCategory::Launchers => Self::Launchers,
        }
    }
}

impl fmt::Display for RollColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RollColumn {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|column| column.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| {
                let valid: Vec<&str> = Self::ALL.iter().map(|c| c.as_str()).collect();
                Error::InvalidQuery(format!(
                    "'{s}' is not a valid column; expected one of {}",
                    valid.join(", ")
                ))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_column_names() {
        assert_eq!("perks1".parse::<RollColumn>().unwrap(), RollColumn::Perks1);
        assert_eq!("Barrels".parse::<RollColumn>().unwrap(), RollColumn::Barrels);
        assert!(matches!(
            "frames".parse::<RollColumn>(),
            Err(Error::InvalidQuery(_))
        ));
    }

    #[test]
    fn test_every_plug_category_maps() {
        for category in PlugCategory::ALL {
            let column = RollColumn::from_plug_category(*category, false);
            assert!(RollColumn::ALL.contains(&column));
        }
        assert_eq!(
            RollColumn::from_plug_category(PlugCategory::Perks, true),
            RollColumn::Perks2
        );
        assert_eq!(
            RollColumn::from_plug_category(PlugCategory::Barrels, true),
            RollColumn::Barrels
        );
    }
}
