pub mod config;
pub mod lookup;
pub mod manifest;
pub mod run;

pub use lookup::{lookup, Lookup, LookupOptions};
pub use run::run_bot;
