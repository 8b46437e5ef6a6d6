use serde::Serialize;

use crate::hashes::{ArmorSlot, EnergyType, ModCategory};

/// An armor or weapon mod.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Mod {
    pub name: String,
    pub description: String,
    pub icon: Option<String>,
    pub category: ModCategory,
    /// Armor mods only.
    pub energy_cost: Option<u32>,
    pub energy_type: Option<EnergyType>,
    pub armor_slot: Option<ArmorSlot>,
    /// Where the mod is obtained.
    pub source: String,
}

impl Mod {
    /// Combine the item's own description with its sandbox perk descriptions.
    ///
    /// Perk descriptions are bulleted under the item description, or stand
    /// alone when the item has none (bulleted only when there are several).
    #[must_use]
    pub fn compose_description(item_description: &str, perk_descriptions: &[String]) -> String {
        if !item_description.is_empty() {
            if perk_descriptions.is_empty() {
                return item_description.to_string();
            }
            return format!("{item_description}\n- {}", perk_descriptions.join("\n- "));
        }
        match perk_descriptions {
            [] => String::new(),
            [only] => only.clone(),
            many => format!("- {}", many.join("\n- ")),
        }
    }

    /// Energy line for armor mods, e.g. `**3 Arc Energy - Arms**`.
    ///
    /// Empty for weapon mods and for free armor mods.
    #[must_use]
    pub fn overview(&self) -> String {
        if self.category != ModCategory::Armor {
            return String::new();
        }
        let Some(cost) = self.energy_cost.filter(|cost| *cost > 0) else {
            return String::new();
        };
        let mut line = format!("**{cost} ");
        if let Some(energy) = self.energy_type.filter(|e| *e != EnergyType::Any) {
            line.push_str(energy.label());
            line.push(' ');
        }
        line.push_str("Energy");
        if let Some(slot) = self.armor_slot {
            line.push_str(" - ");
            line.push_str(slot.label());
        }
        line.push_str("**\n");
        line
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn armor_mod(energy_type: EnergyType, slot: Option<ArmorSlot>) -> Mod {
        Mod {
            name: "Hand Cannon Loader".to_string(),
            description: String::new(),
            icon: None,
            category: ModCategory::Armor,
            energy_cost: Some(3),
            energy_type: Some(energy_type),
            armor_slot: slot,
            source: String::new(),
        }
    }

    #[test]
    fn test_overview_with_type_and_slot() {
        let m = armor_mod(EnergyType::Arc, Some(ArmorSlot::Arms));
        assert_eq!(m.overview(), "**3 Arc Energy - Arms**\n");
    }

    #[test]
    fn test_overview_any_energy_unknown_slot() {
        let m = armor_mod(EnergyType::Any, None);
        assert_eq!(m.overview(), "**3 Energy**\n");
    }

    #[test]
    fn test_overview_empty_for_weapon_mod() {
        let mut m = armor_mod(EnergyType::Arc, None);
        m.category = ModCategory::Weapon;
        assert_eq!(m.overview(), "");
    }

    #[test]
    fn test_overview_empty_for_free_mod() {
        let mut m = armor_mod(EnergyType::Arc, Some(ArmorSlot::Arms));
        m.energy_cost = Some(0);
        assert_eq!(m.overview(), "");
        m.energy_cost = None;
        assert_eq!(m.overview(), "");
    }

    #[test]
    fn test_compose_description() {
        let perks = vec!["+1 magazine".to_string(), "Faster reload".to_string()];
        assert_eq!(
            Mod::compose_description("Increases magazine size.", &perks[..1]),
            "Increases magazine size.\n- +1 magazine"
        );
        assert_eq!(Mod::compose_description("", &perks[..1]), "+1 magazine");
        assert_eq!(
            Mod::compose_description("", &perks),
            "- +1 magazine\n- Faster reload"
        );
        assert_eq!(Mod::compose_description("Plain.", &[]), "Plain.");
    }
}
