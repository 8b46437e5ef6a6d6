//! The Discord side of gunsmith: parsing chat commands, running them against
//! the current manifest and rendering replies.

pub mod command;
pub mod handler;
pub mod lookup;
pub mod render;
pub mod scheduler;

pub use command::{Command, Subject, UsageError};
pub use handler::Handler;
pub use lookup::Outcome;
pub use render::{Embed, EmbedField, Reply};
