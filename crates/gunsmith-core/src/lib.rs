//! Destiny 2 manifest queries for gunsmith.
//!
//! This crate reads Bungie's manifest (a SQLite file of JSON definitions)
//! and resolves weapons, perks, mods and stat comparisons from it. It also
//! builds and queries the roll index, a derived database mapping every perk
//! to the weapons that can roll it.

#![deny(unsafe_code)]
#![warn(missing_debug_implementations)]

pub mod armory;
pub mod error;
pub mod hashes;
pub mod manifest;
pub mod model;
pub mod rolls;
pub mod similarity;

#[cfg(any(test, feature = "testkit"))]
pub mod testkit;

pub use armory::{Armory, RollMode};
pub use error::{Error, Result};
pub use manifest::ManifestDb;
pub use rolls::{RollFinder, RollIndex, RollQuery, RollSearch};
