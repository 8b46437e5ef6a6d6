use std::collections::BTreeMap;
use std::str::FromStr;

use crate::error::{Error, Result};
use crate::rolls::RollColumn;

/// A parsed roll search: `-<column> perk, perk -<column> perk ...`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RollQuery {
    columns: BTreeMap<RollColumn, Vec<String>>,
}

impl RollQuery {
    pub fn parse(raw: &str) -> Result<Self> {
        let mut columns: BTreeMap<RollColumn, Vec<String>> = BTreeMap::new();
        let mut current: Option<(RollColumn, Vec<&str>)> = None;

        for token in raw.split_whitespace() {
            if let Some(name) = token.strip_prefix('-') {
                if let Some((column, words)) = current.take() {
                    add_perks(&mut columns, column, &words)?;
                }
                current = Some((name.parse()?, Vec::new()));
            } else if let Some((_, words)) = current.as_mut() {
                words.push(token);
            } else {
                return Err(Error::InvalidQuery(format!(
                    "'{token}' must follow a -<column> flag"
                )));
            }
        }
        if let Some((column, words)) = current {
            add_perks(&mut columns, column, &words)?;
        }

        if columns.is_empty() {
            return Err(Error::InvalidQuery("no perks given".to_string()));
        }
        Ok(Self { columns })
    }

    /// Perks requested for `column`.
    #[must_use]
    pub fn perks(&self, column: RollColumn) -> Option<&[String]> {
        self.columns.get(&column).map(Vec::as_slice)
    }

    pub fn columns(&self) -> impl Iterator<Item = (RollColumn, &[String])> {
        self.columns
            .iter()
            .map(|(column, perks)| (*column, perks.as_slice()))
    }
}

impl FromStr for RollQuery {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

fn add_perks(
    columns: &mut BTreeMap<RollColumn, Vec<String>>,
    column: RollColumn,
    words: &[&str],
) -> Result<()> {
    let joined = words.join(" ");
    let perks: Vec<String> = joined
        .split(',')
        .map(str::trim)
        .filter(|perk| !perk.is_empty())
        .map(str::to_string)
        .collect();
    if perks.is_empty() {
        return Err(Error::InvalidQuery(format!("no perks given for -{column}")));
    }
    columns.entry(column).or_default().extend(perks);
    Ok(())
}
