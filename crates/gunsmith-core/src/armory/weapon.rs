//! Resolve a weapon definition into a [`Weapon`].

use crate::armory::RollMode;
use crate::error::{Error, Result};
use crate::hashes::{
    bungie_url, PlugCategory, SocketCategory, StatKind, DUMMY_CATEGORY, WEAPON_CATEGORY,
};
use crate::manifest::definitions::{
    InventoryItemDefinition, PowerCapDefinition, SocketEntry, SocketsBlock,
};
use crate::manifest::{DefinitionTable, ManifestDb};
use crate::model::{PerkColumn, Plug, Weapon, WeaponArchetype, WeaponStat};
use crate::similarity;

pub(crate) const DEFAULT_COLUMN: &str = "Default";

/// Whether a search hit is a real, socketed weapon.
pub(crate) fn is_weapon(def: &InventoryItemDefinition) -> bool {
    def.item_category_hashes.contains(&WEAPON_CATEGORY)
        && !def.item_category_hashes.contains(&DUMMY_CATEGORY)
        && def.sockets.is_some()
}

pub(crate) fn resolve(
    db: &ManifestDb,
    id: i64,
    def: &InventoryItemDefinition,
    query: &str,
    mode: RollMode,
) -> Result<Weapon> {
    let name = def.display_properties.name.clone();
    let sockets = def
        .sockets
        .as_ref()
        .ok_or_else(|| Error::InvalidData(format!("{name} has no sockets")))?;

    let mut archetype = WeaponArchetype::from_categories(
        &def.item_category_hashes,
        def.inventory.as_ref().map_or(0, |inv| inv.tier_type_hash),
        def.default_damage_type,
    );
    if let Some(cap) = power_cap(db, def)? {
        archetype.set_power_cap(cap);
    }

    let (intrinsic, perks) = resolve_sockets(db, sockets, mode)?;

    Ok(Weapon {
        id,
        hash: def.hash,
        similarity: similarity::ratio(&name, query),
        name,
        flavor_text: def.flavor_text.clone(),
        icon: bungie_url(&def.display_properties.icon),
        screenshot: bungie_url(&def.screenshot),
        archetype,
        has_random_rolls: !def.display_source.is_empty(),
        intrinsic,
        perks,
        stats: stats(def),
    })
}

/// Highest power cap across the item's versions.
fn power_cap(db: &ManifestDb, def: &InventoryItemDefinition) -> Result<Option<u32>> {
    let Some(quality) = &def.quality else {
        return Ok(None);
    };
    let mut best = None;
    for version in &quality.versions {
        let cap: Option<PowerCapDefinition> =
            db.definition(DefinitionTable::PowerCap, version.power_cap_hash)?;
        if let Some(cap) = cap {
            best = best.max(Some(cap.power_cap));
        }
    }
    Ok(best)
}

fn stats(def: &InventoryItemDefinition) -> Vec<WeaponStat> {
    let mut stats: Vec<WeaponStat> = def
        .stats
        .iter()
        .flat_map(|block| block.stats.values())
        .filter(|entry| entry.value != 0)
        .filter_map(|entry| {
            StatKind::from_hash(entry.stat_hash).map(|kind| WeaponStat {
                kind,
                value: entry.value,
            })
        })
        .collect();
    stats.sort_by_key(|stat| stat.kind.order());
    stats
}

fn socket_at<'a>(sockets: &'a SocketsBlock, index: usize) -> Result<&'a SocketEntry> {
    sockets
        .socket_entries
        .get(index)
        .ok_or_else(|| Error::InvalidData(format!("socket index {index} out of range")))
}

fn resolve_sockets(
    db: &ManifestDb,
    sockets: &SocketsBlock,
    mode: RollMode,
) -> Result<(Option<Plug>, Vec<PerkColumn>)> {
    let mut intrinsic = None;
    let mut columns = Vec::new();

    for category in &sockets.socket_categories {
        match SocketCategory::from_hash(category.socket_category_hash) {
            Some(SocketCategory::Intrinsics) => {
                if let Some(&index) = category.socket_indexes.first() {
                    intrinsic = resolve_intrinsic(db, socket_at(sockets, index)?)?;
                }
            }
            Some(SocketCategory::WeaponPerks) => {
                columns = resolve_perk_columns(db, sockets, &category.socket_indexes, mode)?;
            }
            None => {}
        }
    }

    Ok((intrinsic, columns))
}

fn resolve_intrinsic(db: &ManifestDb, socket: &SocketEntry) -> Result<Option<Plug>> {
    let Some(plug_set) = socket.reusable_plug_set_hash else {
        log::error!("Intrinsic socket has no reusable plug set");
        return Ok(None);
    };
    let Some(&frame) = db.plug_set_items(plug_set, false)?.first() else {
        return Ok(None);
    };
    plug(db, frame, PlugCategory::Intrinsics.label())
}

fn resolve_perk_columns(
    db: &ManifestDb,
    sockets: &SocketsBlock,
    indexes: &[usize],
    mode: RollMode,
) -> Result<Vec<PerkColumn>> {
    let mut columns = Vec::new();
    let mut defaults = PerkColumn::new(DEFAULT_COLUMN);

    for &index in indexes {
        let socket = socket_at(sockets, index)?;
        let Some(category) = db.socket_plug_category(socket.socket_type_hash)? else {
            continue;
        };

        match mode {
            RollMode::Default => {
                for hash in socket.default_plug_hashes() {
                    if let Some(plug) = plug(db, hash, DEFAULT_COLUMN)? {
                        defaults.plugs.push(plug);
                    }
                }
            }
            RollMode::AllRolls => {
                let Some(plug_set) = socket.rollable_plug_set() else {
                    log::error!("{category} socket {index} has no plug set");
                    continue;
                };
                let mut column = PerkColumn::new(category.label());
                for hash in db.plug_set_items(plug_set, true)? {
                    if let Some(plug) = plug(db, hash, category.label())? {
                        column.plugs.push(plug);
                    }
                }
                columns.push(column);
            }
        }
    }

    if mode == RollMode::Default {
        columns.push(defaults);
    }
    Ok(columns)
}

/// Look up a plug item and describe it under `category`.
pub(crate) fn plug(db: &ManifestDb, hash: u32, category: &str) -> Result<Option<Plug>> {
    Ok(db.display_properties(hash)?.map(|props| Plug {
        name: props.name,
        description: props.description,
        icon: bungie_url(&props.icon),
        category: category.to_string(),
    }))
}
