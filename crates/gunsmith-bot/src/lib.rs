//! Gunsmith: a Discord bot for Destiny 2 weapon rolls.
//!
//! The library half of the `gunsmith` binary. Manifest access lives in
//! `gunsmith-core`, manifest downloads and configuration in
//! `gunsmith-manifest`; this crate wires them to Discord and the CLI.

#![deny(unsafe_code)]
#![warn(missing_debug_implementations)]

pub mod bot;
pub mod logging;
