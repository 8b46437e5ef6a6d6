//! Well-known manifest hashes.
//!
//! Bungie identifies every definition by an unsigned 32-bit hash. The enums
//! here name the hashes gunsmith needs to interpret weapons, perks and mods;
//! anything not listed is treated as unknown and skipped by callers.

use std::fmt;

/// Root for every relative icon and screenshot path in the manifest.
pub const BUNGIE_URL_ROOT: &str = "https://www.bungie.net";

/// Item category shared by every weapon.
pub const WEAPON_CATEGORY: u32 = 1;

/// Item category of placeholder weapons that should never be shown.
pub const DUMMY_CATEGORY: u32 = 3_109_687_656;

/// Convert a definition hash into the `id` column used by manifest tables.
///
/// The manifest stores ids as signed 32-bit integers, so hashes with the top
/// bit set wrap around to negative values.
#[must_use]
pub const fn convert_hash(hash: u32) -> i64 {
    hash as i32 as i64
}

/// Join a relative manifest path onto the bungie.net root.
#[must_use]
pub fn bungie_url(path: &str) -> Option<String> {
    if path.is_empty() {
        None
    } else {
        Some(format!("{BUNGIE_URL_ROOT}{path}"))
    }
}

macro_rules! hash_enum {
    (
        $(#[$meta:meta])*
        $name:ident {
            $($variant:ident = $value:literal => $label:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize)]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            /// Every known variant, in declaration order.
            pub const ALL: &'static [Self] = &[$(Self::$variant),+];

            #[must_use]
            pub const fn from_hash(hash: u32) -> Option<Self> {
                match hash {
                    $($value => Some(Self::$variant),)+
                    _ => None,
                }
            }

            #[must_use]
            pub const fn hash(self) -> u32 {
                match self {
                    $(Self::$variant => $value),+
                }
            }

            #[must_use]
            pub const fn label(self) -> &'static str {
                match self {
                    $(Self::$variant => $label),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.label())
            }
        }
    };
}

hash_enum!(
    /// Socket categories on a weapon's `sockets.socketCategories`.
    SocketCategory {
        Intrinsics = 3_956_125_808 => "Intrinsics",
        WeaponPerks = 4_241_085_061 => "Weapon Perks",
    }
);

hash_enum!(
    /// Plug categories found on a socket type's plug whitelist.
    ///
    /// Frames share the perks hash, grenade launcher magazines share the
    /// projectiles hash, and tubes share the launchers hash.
    PlugCategory {
        Intrinsics = 1_744_546_145 => "Intrinsics",
        Stocks = 577_918_720 => "Stocks",
        Perks = 7_906_839 => "Perks",
        Barrels = 2_833_605_196 => "Barrels",
        Bowstrings = 3_809_303_875 => "Bowstrings",
        Magazines = 1_806_783_418 => "Magazines",
        Projectiles = 2_718_120_384 => "Projectiles",
        Blades = 1_041_766_312 => "Blades",
        Grips = 3_962_145_884 => "Grips",
        Batteries = 1_757_026_848 => "Batteries",
        Guards = 683_359_327 => "Guards",
        Scopes = 2_619_833_294 => "Scopes",
        Arrows = 1_257_608_559 => "Arrows",
        Launchers = 1_202_604_782 => "Launchers",
    }
);

hash_enum!(
    /// Ammo slot of a weapon.
    WeaponClass {
        Kinetic = 2 => "Kinetic",
        Energy = 3 => "Energy",
        Power = 4 => "Power",
    }
);

hash_enum!(
    /// Weapon archetype from `itemCategoryHashes`.
    WeaponType {
        AutoRifle = 5 => "Auto Rifle",
        HandCannon = 6 => "Hand Cannon",
        PulseRifle = 7 => "Pulse Rifle",
        ScoutRifle = 8 => "Scout Rifle",
        FusionRifle = 9 => "Fusion Rifle",
        SniperRifle = 10 => "Sniper Rifle",
        Shotgun = 11 => "Shotgun",
        MachineGun = 12 => "Machine Gun",
        RocketLauncher = 13 => "Rocket Launcher",
        Sidearm = 14 => "Sidearm",
        Sword = 54 => "Sword",
        GrenadeLauncher = 153_950_757 => "Grenade Launcher",
        LinearFusionRifle = 1_504_945_536 => "Linear Fusion Rifle",
        TraceRifle = 2_489_664_120 => "Trace Rifle",
        Bow = 3_317_538_576 => "Bow",
        SubmachineGun = 3_954_685_534 => "Submachine Gun",
    }
);

hash_enum!(
    /// Rarity tier from `inventory.tierTypeHash`.
    TierType {
        Basic = 3_340_296_461 => "Basic",
        Uncommon = 2_395_677_314 => "Uncommon",
        Rare = 2_127_292_149 => "Rare",
        Legendary = 4_008_398_120 => "Legendary",
        Exotic = 2_759_499_571 => "Exotic",
    }
);

hash_enum!(
    /// Damage type from `defaultDamageType`.
    DamageType {
        Kinetic = 1 => "Kinetic",
        Arc = 2 => "Arc",
        Solar = 3 => "Solar",
        Void = 4 => "Void",
    }
);

hash_enum!(
    /// Weapon stats, declared in display order.
    StatKind {
        Impact = 4_043_523_819 => "Impact",
        Accuracy = 1_591_432_999 => "Accuracy",
        Range = 1_240_592_695 => "Range",
        BlastRadius = 3_614_673_599 => "Blast Radius",
        Velocity = 2_523_465_841 => "Velocity",
        Stability = 155_624_089 => "Stability",
        Handling = 943_549_884 => "Handling",
        ReloadSpeed = 4_188_031_367 => "Reload Speed",
        SwingSpeed = 2_837_207_746 => "Swing Speed",
        ChargeRate = 3_022_301_683 => "Charge Rate",
        GuardResistance = 209_426_660 => "Guard Resistance",
        GuardEfficiency = 2_762_071_195 => "Guard Efficiency",
        GuardEndurance = 3_736_848_092 => "Guard Endurance",
        AimAssistance = 1_345_609_583 => "Aim Assistance",
        Zoom = 3_555_269_338 => "Zoom",
        Recoil = 2_715_839_340 => "Recoil",
        RoundsPerMinute = 4_284_893_193 => "RPM",
        ChargeTime = 2_961_396_640 => "Charge Time",
        DrawTime = 447_667_954 => "Draw Time",
        AmmoCapacity = 925_767_036 => "Ammo Capacity",
        Magazine = 3_871_231_066 => "Magazine",
    }
);

hash_enum!(
    /// Item categories carried by mods.
    ModCategory {
        Mods = 59 => "Mods",
        Armor = 4_104_513_227 => "Armor",
        Weapon = 610_365_472 => "Weapon",
    }
);

hash_enum!(
    /// Armor slot an armor mod can be socketed into.
    ArmorSlot {
        Helmet = 1_362_265_421 => "Helmet",
        Arms = 3_872_696_960 => "Arms",
        Chest = 3_723_676_689 => "Chest",
        Legs = 3_607_371_986 => "Legs",
        ClassItem = 3_196_106_184 => "Class Item",
    }
);

hash_enum!(
    /// Armor energy affinity required by a mod.
    EnergyType {
        Any = 1_198_124_803 => "Any",
        Arc = 728_351_493 => "Arc",
        Solar = 591_714_140 => "Solar",
        Void = 4_069_572_561 => "Void",
    }
);

impl StatKind {
    /// Position of the stat in the display order.
    #[must_use]
    pub fn order(self) -> usize {
        Self::ALL
            .iter()
            .position(|kind| *kind == self)
            .unwrap_or(Self::ALL.len())
    }
}
