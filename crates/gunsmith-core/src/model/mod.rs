pub mod compare;
pub mod mods;
pub mod weapon;

pub use compare::{Comparison, Side};
pub use mods::Mod;
pub use weapon::{PerkColumn, Plug, Weapon, WeaponArchetype, WeaponStat};
