/// A schema migration.
#[derive(Debug)]
pub struct Migration {
    pub version: u32,
    pub name: &'static str,
    pub sql: &'static str,
}

const MIGRATION_001: &str = r"
PRAGMA foreign_keys = ON;

-- Weapons that made it into the index
CREATE TABLE IF NOT EXISTS weapons (
    id INTEGER PRIMARY KEY,
    hash INTEGER NOT NULL,
    name TEXT NOT NULL,
    weapon_type TEXT
);

CREATE INDEX IF NOT EXISTS idx_weapons_type ON weapons(weapon_type);

-- One row per (column, perk, weapon) the weapon can roll
CREATE TABLE IF NOT EXISTS weapon_perks (
    column_name TEXT NOT NULL,
    perk_name TEXT NOT NULL COLLATE NOCASE,
    weapon_id INTEGER NOT NULL REFERENCES weapons(id),
    PRIMARY KEY (column_name, perk_name, weapon_id)
);

CREATE INDEX IF NOT EXISTS idx_weapon_perks_weapon ON weapon_perks(weapon_id);
";

const MIGRATION_002: &str = r"
-- Which manifest the index was built from
CREATE TABLE IF NOT EXISTS index_source (
    id INTEGER PRIMARY KEY CHECK (id = 1),
    manifest TEXT NOT NULL,
    built_at TEXT NOT NULL DEFAULT (datetime('now'))
);
";

/// Schema version of a fully migrated index.
pub const LATEST_VERSION: u32 = 2;

pub const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        name: "weapon_perks",
        sql: MIGRATION_001,
    },
    Migration {
        version: 2,
        name: "index_source",
        sql: MIGRATION_002,
    },
];
