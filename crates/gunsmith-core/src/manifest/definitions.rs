//! Typed views of the JSON definitions stored in the manifest.
//!
//! Only the fields gunsmith reads are modelled. Everything is defaulted so
//! that items with sparse JSON (ornaments, emblems, dummies) still parse and
//! can be filtered out by the caller.

use std::collections::BTreeMap;

use serde::Deserialize;

/// Manifest tables gunsmith reads from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DefinitionTable {
    InventoryItem,
    PlugSet,
    SocketType,
    PowerCap,
    SandboxPerk,
    Collectible,
}

impl DefinitionTable {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::InventoryItem => "DestinyInventoryItemDefinition",
            Self::PlugSet => "DestinyPlugSetDefinition",
            Self::SocketType => "DestinySocketTypeDefinition",
            Self::PowerCap => "DestinyPowerCapDefinition",
            Self::SandboxPerk => "DestinySandboxPerkDefinition",
            Self::Collectible => "DestinyCollectibleDefinition",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DisplayProperties {
    pub name: String,
    pub description: String,
    pub icon: String,
}

/// `DestinyInventoryItemDefinition`: weapons, plugs, mods and everything else.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct InventoryItemDefinition {
    pub hash: u32,
    pub display_properties: DisplayProperties,
    pub flavor_text: String,
    pub screenshot: String,
    pub item_category_hashes: Vec<u32>,
    /// Non-empty for weapons that drop with random rolls.
    pub display_source: String,
    pub inventory: Option<InventoryBlock>,
    pub default_damage_type: u32,
    pub quality: Option<QualityBlock>,
    pub stats: Option<StatsBlock>,
    pub sockets: Option<SocketsBlock>,
    pub plug: Option<PlugBlock>,
    pub perks: Option<Vec<ItemPerk>>,
    pub collectible_hash: Option<u32>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct InventoryBlock {
    pub tier_type_hash: u32,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct QualityBlock {
    pub versions: Vec<QualityVersion>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct QualityVersion {
    pub power_cap_hash: u32,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StatsBlock {
    pub stats: BTreeMap<String, StatEntry>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StatEntry {
    pub stat_hash: u32,
    pub value: i64,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SocketsBlock {
    pub socket_entries: Vec<SocketEntry>,
    pub socket_categories: Vec<SocketCategoryEntry>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SocketEntry {
    pub socket_type_hash: u32,
    pub single_initial_item_hash: u32,
    pub reusable_plug_items: Vec<PlugItemRef>,
    pub reusable_plug_set_hash: Option<u32>,
    pub randomized_plug_set_hash: Option<u32>,
}

impl SocketEntry {
    /// Plug set listing every plug this socket can roll. Random-rolled
    /// weapons carry a randomized set, static ones a reusable set.
    #[must_use]
    pub fn rollable_plug_set(&self) -> Option<u32> {
        self.randomized_plug_set_hash.or(self.reusable_plug_set_hash)
    }

    /// Plugs the weapon ships with.
    #[must_use]
    pub fn default_plug_hashes(&self) -> Vec<u32> {
        let hashes: Vec<u32> = self
            .reusable_plug_items
            .iter()
            .map(|item| item.plug_item_hash)
            .collect();
        if hashes.is_empty() && self.single_initial_item_hash != 0 {
            vec![self.single_initial_item_hash]
        } else {
            hashes
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PlugItemRef {
    pub plug_item_hash: u32,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SocketCategoryEntry {
    pub socket_category_hash: u32,
    pub socket_indexes: Vec<usize>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PlugBlock {
    pub plug_category_hash: u32,
    pub energy_cost: Option<EnergyCost>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EnergyCost {
    pub energy_cost: u32,
    pub energy_type_hash: u32,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ItemPerk {
    pub perk_hash: u32,
}

/// `DestinyPlugSetDefinition`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PlugSetDefinition {
    pub reusable_plug_items: Vec<PlugSetItem>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PlugSetItem {
    pub plug_item_hash: u32,
    /// Retired perks stay in the set with this flag cleared.
    pub currently_can_roll: bool,
}

/// `DestinySocketTypeDefinition`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SocketTypeDefinition {
    pub plug_whitelist: Vec<PlugWhitelistEntry>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PlugWhitelistEntry {
    pub category_hash: u32,
}

/// `DestinyPowerCapDefinition`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PowerCapDefinition {
    pub power_cap: u32,
}

/// `DestinySandboxPerkDefinition`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SandboxPerkDefinition {
    pub display_properties: DisplayProperties,
}

/// `DestinyCollectibleDefinition`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CollectibleDefinition {
    pub source_string: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sparse_item_deserializes() {
        let json = r#"{"hash": 12, "displayProperties": {"name": "Emblem"}}"#;
        let item: InventoryItemDefinition = serde_json::from_str(json).unwrap();
        assert_eq!(item.hash, 12);
        assert_eq!(item.display_properties.name, "Emblem");
        assert!(item.display_properties.icon.is_empty());
        assert!(item.sockets.is_none());
        assert!(item.item_category_hashes.is_empty());
    }

    #[test]
    fn test_socket_entry_prefers_randomized_plug_set() {
        let json = r#"{
            "socketTypeHash": 1,
            "reusablePlugSetHash": 10,
            "randomizedPlugSetHash": 20
        }"#;
        let socket: SocketEntry = serde_json::from_str(json).unwrap();
        assert_eq!(socket.rollable_plug_set(), Some(20));
    }

    #[test]
    fn test_default_plugs_fall_back_to_initial_item() {
        let json = r#"{"socketTypeHash": 1, "singleInitialItemHash": 99}"#;
        let socket: SocketEntry = serde_json::from_str(json).unwrap();
        assert_eq!(socket.default_plug_hashes(), vec![99]);

        let json = r#"{
            "socketTypeHash": 1,
            "singleInitialItemHash": 99,
            "reusablePlugItems": [{"plugItemHash": 5}, {"plugItemHash": 6}]
        }"#;
        let socket: SocketEntry = serde_json::from_str(json).unwrap();
        assert_eq!(socket.default_plug_hashes(), vec![5, 6]);
    }

    #[test]
    fn test_plug_set_missing_roll_flag_is_false() {
        let json = r#"{"reusablePlugItems": [{"plugItemHash": 7}]}"#;
        let set: PlugSetDefinition = serde_json::from_str(json).unwrap();
        assert!(!set.reusable_plug_items[0].currently_can_roll);
    }
}
