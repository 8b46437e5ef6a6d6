//! Fixture manifest for tests.
//!
//! Writes a small manifest with the same table layout Bungie ships: one
//! `(id, json)` table per definition kind. The content covers a random-rolled
//! legendary, its timelost reissue, a static energy weapon, an exotic, a
//! dummy, an ornament, plugs across several columns and two mods. The two
//! Fatebringers list their item categories unsorted, as Bungie does.

use std::path::Path;

use rusqlite::{params, Connection};
use serde_json::{json, Value};

use crate::error::Result;
use crate::hashes::{
    convert_hash, ArmorSlot, DamageType, EnergyType, ModCategory, PlugCategory, SocketCategory,
    StatKind, TierType, DUMMY_CATEGORY, WEAPON_CATEGORY,
};
use crate::manifest::DefinitionTable;

// Weapons
pub const FATEBRINGER: u32 = 3_500_000_001;
pub const FATEBRINGER_TIMELOST: u32 = 3_500_000_002;
pub const VISION_OF_CONFLUENCE: u32 = 2_000_000_001;
pub const ACE_OF_SPADES: u32 = 2_000_000_002;
pub const FATEBRINGER_DUMMY: u32 = 2_000_000_003;
pub const FATEBRINGER_ORNAMENT: u32 = 2_000_000_004;

// Plugs
pub const ADAPTIVE_FRAME: u32 = 3_000_000_001;
pub const PRECISION_FRAME: u32 = 1010;
pub const ARROWHEAD_BRAKE: u32 = 1001;
pub const CORKSCREW_RIFLING: u32 = 1002;
pub const TACTICAL_MAG: u32 = 1003;
pub const FLARED_MAGWELL: u32 = 1004;
pub const OUTLAW: u32 = 1005;
pub const RAMPAGE: u32 = 1006;
pub const KILL_CLIP: u32 = 1007;
pub const EXPLOSIVE_PAYLOAD: u32 = 1008;
pub const RETIRED_PERK: u32 = 1009;

// Socket types
pub const SOCKET_INTRINSIC: u32 = 2001;
pub const SOCKET_BARREL: u32 = 2002;
pub const SOCKET_MAGAZINE: u32 = 2003;
pub const SOCKET_TRAIT: u32 = 2004;
pub const SOCKET_TRACKER: u32 = 2005;

// Plug sets
pub const ADAPTIVE_FRAMES: u32 = 3001;
pub const BARREL_SET: u32 = 3002;
pub const MAGAZINE_SET: u32 = 3003;
pub const FATEBRINGER_TRAITS_1: u32 = 3004;
pub const FATEBRINGER_TRAITS_2: u32 = 3005;
pub const PRECISION_FRAMES: u32 = 3006;
pub const VISION_TRAITS_1: u32 = 3007;
pub const VISION_TRAITS_2: u32 = 3008;

// Power caps
pub const CAP_1060: u32 = 4001;
pub const CAP_NONE: u32 = 4002;

// Mods
pub const HAND_CANNON_LOADER: u32 = 4_100_000_001;
pub const BACKUP_MAG: u32 = 4_100_000_002;
const LOADER_PERK: u32 = 5001;
const BACKUP_MAG_PERK: u32 = 5002;
const LOADER_COLLECTIBLE: u32 = 6001;
const BACKUP_MAG_COLLECTIBLE: u32 = 6002;

const ALL_TABLES: [DefinitionTable; 6] = [
    DefinitionTable::InventoryItem,
    DefinitionTable::PlugSet,
    DefinitionTable::SocketType,
    DefinitionTable::PowerCap,
    DefinitionTable::SandboxPerk,
    DefinitionTable::Collectible,
];

/// Write the fixture manifest to `path`, replacing any existing file.
pub fn write_fixture_manifest(path: &Path) -> Result<()> {
    if path.exists() {
        std::fs::remove_file(path)?;
    }
    let conn = Connection::open(path)?;
    for table in ALL_TABLES {
        conn.execute_batch(&format!(
            "CREATE TABLE {} (id INTEGER PRIMARY KEY NOT NULL, json BLOB)",
            table.as_str()
        ))?;
    }

    for (hash, def) in plugs().into_iter().chain(weapons()).chain(mods()) {
        insert(&conn, DefinitionTable::InventoryItem, hash, &def)?;
    }
    for (hash, def) in socket_types() {
        insert(&conn, DefinitionTable::SocketType, hash, &def)?;
    }
    for (hash, def) in plug_sets() {
        insert(&conn, DefinitionTable::PlugSet, hash, &def)?;
    }
    insert(&conn, DefinitionTable::PowerCap, CAP_1060, &json!({ "powerCap": 1060 }))?;
    insert(&conn, DefinitionTable::PowerCap, CAP_NONE, &json!({ "powerCap": 999_990 }))?;
    insert(
        &conn,
        DefinitionTable::SandboxPerk,
        LOADER_PERK,
        &json!({ "displayProperties": { "description": "Faster reload for Hand Cannons." } }),
    )?;
    insert(
        &conn,
        DefinitionTable::SandboxPerk,
        BACKUP_MAG_PERK,
        &json!({ "displayProperties": { "description": "+1 magazine" } }),
    )?;
    insert(
        &conn,
        DefinitionTable::Collectible,
        LOADER_COLLECTIBLE,
        &json!({ "sourceString": "Source: Season Pass" }),
    )?;
    insert(
        &conn,
        DefinitionTable::Collectible,
        BACKUP_MAG_COLLECTIBLE,
        &json!({ "sourceString": "Source: Gunsmith" }),
    )?;
    Ok(())
}

fn insert(conn: &Connection, table: DefinitionTable, hash: u32, json: &Value) -> Result<()> {
    conn.execute(
        &format!("INSERT INTO {} (id, json) VALUES (?1, ?2)", table.as_str()),
        params![convert_hash(hash), json.to_string()],
    )?;
    Ok(())
}

fn plug(hash: u32, name: &str, category: PlugCategory) -> (u32, Value) {
    (
        hash,
        json!({
            "hash": hash,
            "displayProperties": {
                "name": name,
                "description": format!("{name} description"),
                "icon": format!("/icons/{hash}.png"),
            },
            "itemCategoryHashes": [],
            "plug": { "plugCategoryHash": category.hash() },
        }),
    )
}

fn plugs() -> Vec<(u32, Value)> {
    vec![
        plug(ADAPTIVE_FRAME, "Adaptive Frame", PlugCategory::Intrinsics),
        plug(PRECISION_FRAME, "Precision Frame", PlugCategory::Intrinsics),
        plug(ARROWHEAD_BRAKE, "Arrowhead Brake", PlugCategory::Barrels),
        plug(CORKSCREW_RIFLING, "Corkscrew Rifling", PlugCategory::Barrels),
        plug(TACTICAL_MAG, "Tactical Mag", PlugCategory::Magazines),
        plug(FLARED_MAGWELL, "Flared Magwell", PlugCategory::Magazines),
        plug(OUTLAW, "Outlaw", PlugCategory::Perks),
        plug(RAMPAGE, "Rampage", PlugCategory::Perks),
        plug(KILL_CLIP, "Kill Clip", PlugCategory::Perks),
        plug(EXPLOSIVE_PAYLOAD, "Explosive Payload", PlugCategory::Perks),
        plug(RETIRED_PERK, "Retired Perk", PlugCategory::Perks),
    ]
}

fn socket_types() -> Vec<(u32, Value)> {
    let whitelist = |category: u32| json!({ "plugWhitelist": [{ "categoryHash": category }] });
    vec![
        (SOCKET_INTRINSIC, whitelist(PlugCategory::Intrinsics.hash())),
        (SOCKET_BARREL, whitelist(PlugCategory::Barrels.hash())),
        (SOCKET_MAGAZINE, whitelist(PlugCategory::Magazines.hash())),
        (SOCKET_TRAIT, whitelist(PlugCategory::Perks.hash())),
        (SOCKET_TRACKER, whitelist(2_285_418_970)),
    ]
}

fn plug_sets() -> Vec<(u32, Value)> {
    let set = |items: &[(u32, bool)]| {
        let items: Vec<Value> = items
            .iter()
            .map(|(hash, can_roll)| json!({ "plugItemHash": hash, "currentlyCanRoll": can_roll }))
            .collect();
        json!({ "reusablePlugItems": items })
    };
    vec![
        (ADAPTIVE_FRAMES, set(&[(ADAPTIVE_FRAME, true)])),
        (PRECISION_FRAMES, set(&[(PRECISION_FRAME, true)])),
        (BARREL_SET, set(&[(ARROWHEAD_BRAKE, true), (CORKSCREW_RIFLING, true)])),
        (MAGAZINE_SET, set(&[(TACTICAL_MAG, true), (FLARED_MAGWELL, true)])),
        (FATEBRINGER_TRAITS_1, set(&[(OUTLAW, true), (RETIRED_PERK, false)])),
        (
            FATEBRINGER_TRAITS_2,
            set(&[(KILL_CLIP, true), (RAMPAGE, true), (EXPLOSIVE_PAYLOAD, true)]),
        ),
        (VISION_TRAITS_1, set(&[(RAMPAGE, true), (KILL_CLIP, true)])),
        (VISION_TRAITS_2, set(&[(OUTLAW, true)])),
    ]
}

struct WeaponSpec<'a> {
    hash: u32,
    name: &'a str,
    categories: Vec<u32>,
    tier: TierType,
    damage: DamageType,
    display_source: &'a str,
    power_cap: Option<u32>,
    stats: &'a [(u32, i64)],
    sockets: Value,
}

fn weapon(spec: WeaponSpec<'_>) -> (u32, Value) {
    let stats: serde_json::Map<String, Value> = spec
        .stats
        .iter()
        .map(|(hash, value)| (hash.to_string(), json!({ "statHash": hash, "value": value })))
        .collect();
    let quality = spec
        .power_cap
        .map(|cap| json!({ "versions": [{ "powerCapHash": cap }] }));
    (
        spec.hash,
        json!({
            "hash": spec.hash,
            "displayProperties": {
                "name": spec.name,
                "description": "",
                "icon": format!("/icons/{}.png", spec.hash),
            },
            "flavorText": format!("{} flavor text.", spec.name),
            "screenshot": format!("/screenshots/{}.jpg", spec.hash),
            "itemCategoryHashes": spec.categories,
            "displaySource": spec.display_source,
            "inventory": { "tierTypeHash": spec.tier.hash() },
            "defaultDamageType": spec.damage.hash(),
            "quality": quality,
            "stats": { "stats": stats },
            "sockets": spec.sockets,
        }),
    )
}

fn socket(socket_type: u32, randomized: Option<u32>, reusable: Option<u32>, defaults: &[u32]) -> Value {
    let defaults: Vec<Value> = defaults
        .iter()
        .map(|hash| json!({ "plugItemHash": hash }))
        .collect();
    json!({
        "socketTypeHash": socket_type,
        "singleInitialItemHash": 0,
        "randomizedPlugSetHash": randomized,
        "reusablePlugSetHash": reusable,
        "reusablePlugItems": defaults,
    })
}

fn legendary_sockets(intrinsics: u32, traits_1: u32, traits_2: u32, defaults: [u32; 4]) -> Value {
    json!({
        "socketEntries": [
            socket(SOCKET_INTRINSIC, None, Some(intrinsics), &[]),
            socket(SOCKET_BARREL, Some(BARREL_SET), None, &[defaults[0]]),
            socket(SOCKET_MAGAZINE, Some(MAGAZINE_SET), None, &[defaults[1]]),
            socket(SOCKET_TRAIT, Some(traits_1), None, &[defaults[2]]),
            socket(SOCKET_TRAIT, Some(traits_2), None, &[defaults[3]]),
            socket(SOCKET_TRACKER, None, Some(intrinsics), &[]),
        ],
        "socketCategories": [
            { "socketCategoryHash": SocketCategory::Intrinsics.hash(), "socketIndexes": [0] },
            { "socketCategoryHash": SocketCategory::WeaponPerks.hash(), "socketIndexes": [1, 2, 3, 4, 5] },
        ],
    })
}

fn weapons() -> Vec<(u32, Value)> {
    let hand_cannon_stats: &[(u32, i64)] = &[
        (StatKind::Magazine.hash(), 12),
        (StatKind::Impact.hash(), 84),
        (StatKind::Range.hash(), 46),
        (StatKind::Stability.hash(), 54),
        (StatKind::Handling.hash(), 57),
        (StatKind::ReloadSpeed.hash(), 41),
        (StatKind::RoundsPerMinute.hash(), 140),
        (StatKind::AimAssistance.hash(), 0),
        (1_885_944_937, 5),
    ];
    let scout_stats: &[(u32, i64)] = &[
        (StatKind::Impact.hash(), 50),
        (StatKind::Range.hash(), 60),
        (StatKind::Stability.hash(), 40),
        (StatKind::Handling.hash(), 60),
        (StatKind::RoundsPerMinute.hash(), 180),
        (StatKind::Magazine.hash(), 21),
    ];
    let fatebringer_defaults = [ARROWHEAD_BRAKE, TACTICAL_MAG, OUTLAW, KILL_CLIP];

    vec![
        weapon(WeaponSpec {
            hash: FATEBRINGER,
            name: "Fatebringer",
            categories: vec![2, WEAPON_CATEGORY, 6],
            tier: TierType::Legendary,
            damage: DamageType::Kinetic,
            display_source: "Random Perks: This item drops with random perks.",
            power_cap: Some(CAP_1060),
            stats: hand_cannon_stats,
            sockets: legendary_sockets(
                ADAPTIVE_FRAMES,
                FATEBRINGER_TRAITS_1,
                FATEBRINGER_TRAITS_2,
                fatebringer_defaults,
            ),
        }),
        weapon(WeaponSpec {
            hash: FATEBRINGER_TIMELOST,
            name: "Fatebringer (Timelost)",
            categories: vec![6, 2, WEAPON_CATEGORY],
            tier: TierType::Legendary,
            damage: DamageType::Kinetic,
            display_source: "",
            power_cap: Some(CAP_NONE),
            stats: hand_cannon_stats,
            sockets: legendary_sockets(
                ADAPTIVE_FRAMES,
                FATEBRINGER_TRAITS_1,
                FATEBRINGER_TRAITS_2,
                fatebringer_defaults,
            ),
        }),
        weapon(WeaponSpec {
            hash: VISION_OF_CONFLUENCE,
            name: "Vision of Confluence",
            categories: vec![WEAPON_CATEGORY, 3, 8],
            tier: TierType::Legendary,
            damage: DamageType::Arc,
            display_source: "",
            power_cap: None,
            stats: scout_stats,
            sockets: legendary_sockets(
                PRECISION_FRAMES,
                VISION_TRAITS_1,
                VISION_TRAITS_2,
                [CORKSCREW_RIFLING, FLARED_MAGWELL, RAMPAGE, OUTLAW],
            ),
        }),
        weapon(WeaponSpec {
            hash: ACE_OF_SPADES,
            name: "Ace of Spades",
            categories: vec![WEAPON_CATEGORY, 2, 6],
            tier: TierType::Exotic,
            damage: DamageType::Kinetic,
            display_source: "",
            power_cap: None,
            stats: hand_cannon_stats,
            sockets: json!({
                "socketEntries": [
                    socket(SOCKET_INTRINSIC, None, Some(PRECISION_FRAMES), &[]),
                    socket(SOCKET_TRAIT, None, Some(VISION_TRAITS_2), &[OUTLAW]),
                ],
                "socketCategories": [
                    { "socketCategoryHash": SocketCategory::Intrinsics.hash(), "socketIndexes": [0] },
                    { "socketCategoryHash": SocketCategory::WeaponPerks.hash(), "socketIndexes": [1] },
                ],
            }),
        }),
        weapon(WeaponSpec {
            hash: FATEBRINGER_DUMMY,
            name: "Fatebringer Dummy",
            categories: vec![WEAPON_CATEGORY, DUMMY_CATEGORY],
            tier: TierType::Legendary,
            damage: DamageType::Kinetic,
            display_source: "",
            power_cap: None,
            stats: &[],
            sockets: legendary_sockets(
                ADAPTIVE_FRAMES,
                FATEBRINGER_TRAITS_1,
                FATEBRINGER_TRAITS_2,
                fatebringer_defaults,
            ),
        }),
        (
            FATEBRINGER_ORNAMENT,
            json!({
                "hash": FATEBRINGER_ORNAMENT,
                "displayProperties": { "name": "Fatebringer Ornament", "description": "", "icon": "" },
                "itemCategoryHashes": [21],
            }),
        ),
    ]
}

fn mods() -> Vec<(u32, Value)> {
    vec![
        (
            HAND_CANNON_LOADER,
            json!({
                "hash": HAND_CANNON_LOADER,
                "displayProperties": {
                    "name": "Hand Cannon Loader",
                    "description": "",
                    "icon": "/icons/loader.png",
                },
                "itemCategoryHashes": [
                    ModCategory::Mods.hash(),
                    ModCategory::Armor.hash(),
                    ArmorSlot::Arms.hash(),
                ],
                "plug": {
                    "plugCategoryHash": 1_000_000_000,
                    "energyCost": { "energyCost": 3, "energyTypeHash": EnergyType::Arc.hash() },
                },
                "perks": [{ "perkHash": LOADER_PERK }],
                "collectibleHash": LOADER_COLLECTIBLE,
            }),
        ),
        (
            BACKUP_MAG,
            json!({
                "hash": BACKUP_MAG,
                "displayProperties": {
                    "name": "Backup Mag",
                    "description": "Increases magazine size.",
                    "icon": "/icons/backup.png",
                },
                "itemCategoryHashes": [ModCategory::Mods.hash(), ModCategory::Weapon.hash()],
                "plug": { "plugCategoryHash": 1_000_000_001 },
                "perks": [{ "perkHash": BACKUP_MAG_PERK }],
                "collectibleHash": BACKUP_MAG_COLLECTIBLE,
            }),
        ),
    ]
}
