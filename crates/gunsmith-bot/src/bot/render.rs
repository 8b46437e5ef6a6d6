//! Turning lookup results and failures into chat replies.
//!
//! Replies are modelled independently of the Discord library so they can be
//! tested directly and printed by the CLI; the handler converts an [`Embed`]
//! into a serenity builder at the last moment.

use std::fmt;

use gunsmith_core::model::{Comparison, Mod, Plug, Side, Weapon};
use gunsmith_core::{Error, RollSearch};
use serde::Serialize;

use crate::bot::command::Subject;
use crate::bot::lookup::Outcome;

/// Discord's dark background, so embeds blend into the client.
pub const EMBED_COLOUR: u32 = 0x0036_393F;

/// Discord rejects embeds with more fields than this.
pub const MAX_FIELDS: usize = 25;

/// Discord's limit on a field value, in characters.
pub const MAX_FIELD_VALUE: usize = 1024;

/// Discord's limit on an embed description, in characters.
pub const MAX_DESCRIPTION: usize = 4096;

/// Discord's limit on an embed title, in characters.
pub const MAX_TITLE: usize = 256;

/// Discord's limit on title, description and all fields together.
pub const MAX_EMBED_TOTAL: usize = 6000;

/// Zero-width space; Discord needs a non-empty field name and value.
pub const SPACER: &str = "\u{200b}";

/// Reply for a missing manifest file.
pub const MANIFEST_MISSING_REPLY: &str = "An error occurred. Please try again!";

/// Reply for any other database or runtime failure.
pub const INTERNAL_ERROR_REPLY: &str = "An error occurred. Please try again.";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EmbedField {
    pub name: String,
    pub value: String,
    pub inline: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Embed {
    pub title: String,
    pub description: String,
    pub thumbnail: Option<String>,
    pub colour: u32,
    pub fields: Vec<EmbedField>,
}

impl Embed {
    #[must_use]
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: truncate(&title.into(), MAX_TITLE),
            description: String::new(),
            thumbnail: None,
            colour: EMBED_COLOUR,
            fields: Vec::new(),
        }
    }

    /// Set the description, cut to [`MAX_DESCRIPTION`] and to what is left
    /// of [`MAX_EMBED_TOTAL`].
    #[must_use]
    pub fn description(mut self, description: impl AsRef<str>) -> Self {
        self.description.clear();
        let room = MAX_DESCRIPTION.min(self.remaining());
        self.description = truncate(description.as_ref(), room);
        self
    }

    /// Characters Discord counts against [`MAX_EMBED_TOTAL`].
    #[must_use]
    pub fn total_len(&self) -> usize {
        let fields: usize = self
            .fields
            .iter()
            .map(|field| field.name.chars().count() + field.value.chars().count())
            .sum();
        self.title.chars().count() + self.description.chars().count() + fields
    }

    fn remaining(&self) -> usize {
        MAX_EMBED_TOTAL.saturating_sub(self.total_len())
    }

    #[must_use]
    pub fn thumbnail(mut self, url: Option<&str>) -> Self {
        self.thumbnail = url.map(ToString::to_string);
        self
    }

    /// Append a field. Empty names and values become [`SPACER`]; values are
    /// cut to [`MAX_FIELD_VALUE`] and to what is left of [`MAX_EMBED_TOTAL`].
    /// Fields past [`MAX_FIELDS`], or that no longer fit, are dropped.
    #[must_use]
    pub fn field(mut self, name: impl AsRef<str>, value: impl AsRef<str>, inline: bool) -> Self {
        let name = or_spacer(name.as_ref());
        let room = self.remaining().saturating_sub(name.chars().count());
        if self.fields.len() >= MAX_FIELDS || room == 0 {
            log::debug!("Dropping field '{name}' from '{}'", self.title);
            return self;
        }
        self.fields.push(EmbedField {
            name,
            value: or_spacer(&truncate(value.as_ref(), MAX_FIELD_VALUE.min(room))),
            inline,
        });
        self
    }

    #[must_use]
    pub fn spacer(self) -> Self {
        self.field(SPACER, SPACER, true)
    }
}

/// Plain-text rendering used by the CLI. Spacer fields are skipped.
impl fmt::Display for Embed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.title)?;
        if !self.description.is_empty() {
            write!(f, "\n{}", self.description)?;
        }
        for field in self.fields.iter().filter(|field| field.name != SPACER) {
            write!(f, "\n\n{}:\n{}", field.name, field.value)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "reply", rename_all = "snake_case")]
pub enum Reply {
    Text(String),
    Embed(Embed),
}

impl fmt::Display for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(text) => f.write_str(text),
            Self::Embed(embed) => write!(f, "{embed}"),
        }
    }
}

fn or_spacer(text: &str) -> String {
    if text.trim().is_empty() {
        SPACER.to_string()
    } else {
        text.to_string()
    }
}

/// Cut `text` to at most `max` characters, marking the cut with an ellipsis.
fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let mut cut: String = text.chars().take(max.saturating_sub(1)).collect();
    cut.push('…');
    cut
}

/// Reply for a successful lookup.
#[must_use]
pub fn reply(outcome: &Outcome, prefix: &str) -> Reply {
    match outcome {
        Outcome::Weapons(weapons) => match weapons.first() {
            Some(weapon) => Reply::Embed(weapon_embed(weapon)),
            None => not_found(Subject::Weapon),
        },
        Outcome::Perk(plug) => Reply::Embed(perk_embed(plug)),
        Outcome::Mod(m) => Reply::Embed(mod_embed(m)),
        Outcome::Comparison(comparison) => Reply::Embed(comparison_embed(comparison)),
        Outcome::Rolls(search) => Reply::Embed(rolls_embed(search)),
        Outcome::Help => Reply::Text(help_text(prefix)),
    }
}

/// Reply for a failed lookup.
#[must_use]
pub fn error_reply(subject: Subject, error: &Error, prefix: &str) -> Reply {
    match error {
        Error::ManifestMissing(_) => Reply::Text(MANIFEST_MISSING_REPLY.to_string()),
        Error::NotFound { .. } => not_found(subject),
        Error::InvalidQuery(detail) => Reply::Text(format!(
            "Invalid {}: {detail}. Run '{prefix} -help' for more information.",
            subject.noun()
        )),
        e if e.is_parse_failure() => Reply::Text(format!(
            "Failed to parse {}. Please try again.",
            subject.noun()
        )),
        _ => Reply::Text(INTERNAL_ERROR_REPLY.to_string()),
    }
}

fn not_found(subject: Subject) -> Reply {
    Reply::Text(format!("{} could not be found.", subject.title()))
}

/// The weapon embed: archetype and flavor text, intrinsic, then perk columns
/// two to a row.
#[must_use]
pub fn weapon_embed(weapon: &Weapon) -> Embed {
    let description = format!("{}\n{}", weapon.archetype, weapon.flavor_text);
    let mut embed = Embed::new(&weapon.name)
        .description(description.trim())
        .thumbnail(weapon.icon.as_deref());

    if let Some(intrinsic) = &weapon.intrinsic {
        embed = embed.field("Intrinsic", &intrinsic.name, false);
    }
    for (idx, column) in weapon.perks.iter().enumerate() {
        if (idx + 1) % 3 == 0 {
            embed = embed.spacer();
        }
        embed = embed.field(&column.name, column.to_string(), true);
    }
    embed.spacer()
}

#[must_use]
pub fn perk_embed(plug: &Plug) -> Embed {
    Embed::new(&plug.name)
        .description(&plug.description)
        .thumbnail(plug.icon.as_deref())
        .field("Column", &plug.category, true)
}

#[must_use]
pub fn mod_embed(m: &Mod) -> Embed {
    let mut embed = Embed::new(&m.name)
        .description(format!("{}{}", m.overview(), m.description))
        .thumbnail(m.icon.as_deref())
        .field("Type", m.category.label(), true);
    if !m.source.is_empty() {
        embed = embed.field("Source", &m.source, true);
    }
    embed
}

#[must_use]
pub fn comparison_embed(comparison: &Comparison) -> Embed {
    let first = comparison.name(Side::First);
    let second = comparison.name(Side::Second);
    Embed::new(format!("{first} vs {second}"))
        .thumbnail(comparison.icons[0].as_deref())
        .field("Stat", comparison.stat_names(), true)
        .field(first, comparison.column(Side::First), true)
        .field(second, comparison.column(Side::Second), true)
}

#[must_use]
pub fn rolls_embed(search: &RollSearch) -> Embed {
    Embed::new("Weapons with these rolls").description(search.to_string())
}

#[must_use]
pub fn help_text(prefix: &str) -> String {
    format!(
        "**Gunsmith** - Destiny 2 weapon rolls\n\
         `{prefix} <weapon>` - every perk the weapon can roll\n\
         `{prefix} -default <weapon>` - the weapon's curated perks\n\
         `{prefix} -perk <perk>` - what a perk does\n\
         `{prefix} -mod <mod>` - what a mod does and where it drops\n\
         `{prefix} -compare <weapon>, <weapon>` - compare base stats\n\
         `{prefix} -rolls -<column> <perk>[, <perk>] ...` - weapons that can roll the given perks\n\
         Columns: barrels, magazines, perks1, perks2, intrinsics, stocks, bowstrings, \
         projectiles, blades, grips, batteries, guards, scopes, arrows, launchers\n\
         `{prefix} -help` - this message"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use gunsmith_core::hashes::{DamageType, TierType, WeaponClass, WeaponType};
    use gunsmith_core::model::{PerkColumn, WeaponArchetype};

    fn plug(name: &str) -> Plug {
        Plug {
            name: name.to_string(),
            description: format!("{name} description"),
            icon: None,
            category: "Perks".to_string(),
        }
    }

    fn column(name: &str, plugs: &[&str]) -> PerkColumn {
        PerkColumn {
            name: name.to_string(),
            plugs: plugs.iter().map(|p| plug(p)).collect(),
        }
    }

    fn weapon(perks: Vec<PerkColumn>) -> Weapon {
        Weapon {
            id: 1,
            hash: 1,
            name: "Fatebringer".to_string(),
            flavor_text: "Fate is a fickle thing.".to_string(),
            icon: Some("https://www.bungie.net/icon.png".to_string()),
            screenshot: None,
            archetype: WeaponArchetype {
                class: Some(WeaponClass::Kinetic),
                weapon_type: Some(WeaponType::HandCannon),
                tier: Some(TierType::Legendary),
                damage: Some(DamageType::Kinetic),
                is_energy: false,
                power_cap: None,
            },
            has_random_rolls: true,
            similarity: 1.0,
            intrinsic: Some(plug("Adaptive Frame")),
            perks,
            stats: Vec::new(),
        }
    }

    fn field_names(embed: &Embed) -> Vec<&str> {
        embed.fields.iter().map(|f| f.name.as_str()).collect()
    }

    #[test]
    fn test_weapon_embed_layout() {
        let embed = weapon_embed(&weapon(vec![
            column("Barrels", &["Arrowhead Brake", "Corkscrew Rifling"]),
            column("Magazines", &["Tactical Mag"]),
            column("Perks", &["Outlaw"]),
            column("Perks", &["Kill Clip", "Rampage"]),
        ]));

        assert_eq!(embed.title, "Fatebringer");
        assert_eq!(
            embed.description,
            "**Kinetic Hand Cannon**\nFate is a fickle thing."
        );
        assert_eq!(embed.colour, 0x36393F);
        assert_eq!(embed.thumbnail.as_deref(), Some("https://www.bungie.net/icon.png"));
        assert_eq!(
            field_names(&embed),
            vec!["Intrinsic", "Barrels", "Magazines", SPACER, "Perks", "Perks", SPACER]
        );
        assert!(!embed.fields[0].inline);
        assert_eq!(embed.fields[1].value, "Arrowhead Brake\nCorkscrew Rifling");
        assert_eq!(embed.fields[6].value, SPACER);
    }

    #[test]
    fn test_weapon_embed_spacer_every_third_column() {
        let columns = (0..6).map(|i| column(&format!("C{i}"), &["x"])).collect();
        let mut w = weapon(columns);
        w.intrinsic = None;
        let embed = weapon_embed(&w);
        assert_eq!(
            field_names(&embed),
            vec!["C0", "C1", SPACER, "C2", "C3", "C4", SPACER, "C5", SPACER]
        );
    }

    #[test]
    fn test_field_limits() {
        let long = "x".repeat(MAX_FIELD_VALUE + 10);
        let mut embed = Embed::new("t").field("long", &long, true);
        assert_eq!(embed.fields[0].value.chars().count(), MAX_FIELD_VALUE);
        assert!(embed.fields[0].value.ends_with('…'));

        for i in 0..40 {
            embed = embed.field(format!("f{i}"), "v", true);
        }
        assert_eq!(embed.fields.len(), MAX_FIELDS);
    }

    #[test]
    fn test_weapon_embed_within_total_limit() {
        let long: Vec<String> = (0..60).map(|i| format!("Extremely Long Perk Name {i}")).collect();
        let long: Vec<&str> = long.iter().map(String::as_str).collect();
        let columns: Vec<PerkColumn> = (0..12).map(|_| column("Perks", &long)).collect();
        let embed = weapon_embed(&weapon(columns));

        assert!(embed.total_len() <= MAX_EMBED_TOTAL, "{}", embed.total_len());
        assert!(embed.fields.len() < 12);
        assert!(embed.fields.iter().all(|f| f.value.chars().count() <= MAX_FIELD_VALUE));
        assert!(embed.fields.iter().any(|f| f.value.ends_with('…')));
    }

    #[test]
    fn test_long_title_and_description_cut() {
        let embed = Embed::new("t".repeat(300)).description("d".repeat(5000));
        assert_eq!(embed.title.chars().count(), MAX_TITLE);
        assert_eq!(embed.description.chars().count(), MAX_DESCRIPTION);
        assert!(embed.total_len() <= MAX_EMBED_TOTAL);
    }

    #[test]
    fn test_empty_field_value_becomes_spacer() {
        let embed = Embed::new("t").field("Perks", "", true);
        assert_eq!(embed.fields[0].value, SPACER);
    }

    #[test]
    fn test_error_replies() {
        let missing = Error::ManifestMissing("/gone".into());
        assert_eq!(
            error_reply(Subject::Weapon, &missing, "!gunsmith").to_string(),
            "An error occurred. Please try again!"
        );

        let not_found = Error::NotFound {
            entity: "perk",
            query: "nope".to_string(),
        };
        assert_eq!(
            error_reply(Subject::Perk, &not_found, "!gunsmith").to_string(),
            "Perk could not be found."
        );

        let parse = Error::InvalidData("bad socket".to_string());
        assert_eq!(
            error_reply(Subject::Weapon, &parse, "!gunsmith").to_string(),
            "Failed to parse weapon. Please try again."
        );

        let io = Error::Io(std::io::Error::other("disk gone"));
        assert_eq!(
            error_reply(Subject::Mod, &io, "!gunsmith").to_string(),
            "An error occurred. Please try again."
        );

        let no_index = Error::IndexMissing("/m/world.content.weapons".into());
        assert_eq!(
            error_reply(Subject::RollQuery, &no_index, "!gunsmith").to_string(),
            INTERNAL_ERROR_REPLY
        );

        let invalid = Error::InvalidQuery("unknown column 'sights'".to_string());
        assert_eq!(
            error_reply(Subject::RollQuery, &invalid, "!gunsmith").to_string(),
            "Invalid roll query: unknown column 'sights'. Run '!gunsmith -help' for more information."
        );
    }

    fn rolls_error() -> Error {
        Error::NotFound {
            entity: "roll query",
            query: "-perks1 x".to_string(),
        }
    }

    #[test]
    fn test_roll_query_not_found() {
        assert_eq!(
            error_reply(Subject::RollQuery, &rolls_error(), "!gunsmith").to_string(),
            "Roll query could not be found."
        );
    }

    #[test]
    fn test_embed_text_skips_spacers() {
        let embed = Embed::new("Title")
            .description("Body")
            .field("Perks", "Outlaw", true)
            .spacer();
        assert_eq!(embed.to_string(), "Title\nBody\n\nPerks:\nOutlaw");
    }

    #[test]
    fn test_help_uses_prefix() {
        let help = help_text("?gs");
        assert!(help.contains("`?gs -perk <perk>`"));
        assert!(help.contains("perks1"));
    }
}
