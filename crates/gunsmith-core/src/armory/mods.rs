//! Mod lookup.

use rusqlite::OptionalExtension;

use crate::error::{Error, Result};
use crate::hashes::{bungie_url, ArmorSlot, EnergyType, ModCategory};
use crate::manifest::definitions::{
    CollectibleDefinition, InventoryItemDefinition, SandboxPerkDefinition,
};
use crate::manifest::{DefinitionTable, ManifestDb};
use crate::model::Mod;

/// First mod whose name starts with `query`.
pub(crate) fn find(db: &ManifestDb, query: &str) -> Result<Mod> {
    let json: Option<String> = db
        .conn()
        .query_row(
            "SELECT json FROM DestinyInventoryItemDefinition
             WHERE json_extract(json, '$.displayProperties.name') LIKE ?1 ESCAPE '\\'
               AND json_extract(json, '$.itemCategoryHashes[0]') = ?2
               AND json_extract(json, '$.perks') IS NOT NULL
               AND json_extract(json, '$.collectibleHash') IS NOT NULL
             LIMIT 1",
            rusqlite::params![
                format!("{}%", crate::manifest::escape_like(query)),
                ModCategory::Mods.hash()
            ],
            |row| row.get(0),
        )
        .optional()?;
    let Some(json) = json else {
        return Err(Error::not_found("mod", query));
    };
    let def: InventoryItemDefinition = serde_json::from_str(&json)?;
    resolve(db, &def)
}

fn resolve(db: &ManifestDb, def: &InventoryItemDefinition) -> Result<Mod> {
    let name = def.display_properties.name.clone();
    let categories = &def.item_category_hashes;
    if !categories.contains(&ModCategory::Mods.hash()) {
        return Err(Error::InvalidData(format!("{name} is not a mod")));
    }
    let category = if categories.contains(&ModCategory::Armor.hash()) {
        ModCategory::Armor
    } else if categories.contains(&ModCategory::Weapon.hash()) {
        ModCategory::Weapon
    } else {
        return Err(Error::InvalidData(format!("{name} is neither an armor nor a weapon mod")));
    };

    let mut perk_descriptions = Vec::new();
    for perk in def.perks.iter().flatten() {
        let sandbox: Option<SandboxPerkDefinition> =
            db.definition(DefinitionTable::SandboxPerk, perk.perk_hash)?;
        if let Some(sandbox) = sandbox {
            if !sandbox.display_properties.description.is_empty() {
                perk_descriptions.push(sandbox.display_properties.description);
            }
        }
    }

    let source = match def.collectible_hash {
        Some(hash) => db
            .definition::<CollectibleDefinition>(DefinitionTable::Collectible, hash)?
            .map(|c| c.source_string)
            .unwrap_or_default(),
        None => String::new(),
    };

    let (energy_cost, energy_type, armor_slot) = if category == ModCategory::Armor {
        let cost = def
            .plug
            .as_ref()
            .and_then(|plug| plug.energy_cost.as_ref())
            .ok_or_else(|| Error::InvalidData(format!("{name} has no energy cost")))?;
        let energy_type = EnergyType::from_hash(cost.energy_type_hash).ok_or_else(|| {
            Error::InvalidData(format!("{name} has unknown energy type {}", cost.energy_type_hash))
        })?;
        let slot = categories.iter().filter_map(|c| ArmorSlot::from_hash(*c)).last();
        (Some(cost.energy_cost), Some(energy_type), slot)
    } else {
        (None, None, None)
    };

    Ok(Mod {
        description: Mod::compose_description(
            &def.display_properties.description,
            &perk_descriptions,
        ),
        name,
        icon: bungie_url(&def.display_properties.icon),
        category,
        energy_cost,
        energy_type,
        armor_slot,
        source,
    })
}
