//! The serenity event handler.

use std::path::PathBuf;

use async_trait::async_trait;
use gunsmith_core::Error;
use gunsmith_manifest::SharedState;
use serenity::builder::{CreateEmbed, CreateMessage};
use serenity::model::channel::Message;
use serenity::model::gateway::Ready;
use serenity::prelude::{Context, EventHandler};

use crate::bot::command::{self, Command};
use crate::bot::lookup;
use crate::bot::render::{self, Embed, Reply};

#[derive(Debug)]
pub struct Handler {
    state: SharedState,
    prefix: String,
}

impl Handler {
    #[must_use]
    pub fn new(state: SharedState, prefix: impl Into<String>) -> Self {
        Self {
            state,
            prefix: prefix.into(),
        }
    }

    /// Build the reply for a chat message, or `None` if it isn't for us.
    pub async fn respond(&self, content: &str) -> Option<Reply> {
        let parsed = command::parse(content, &self.prefix)?;
        log::info!("{content}");
        Some(match parsed {
            Ok(command) => self.answer(command, content).await,
            Err(usage) => Reply::Text(usage.to_string()),
        })
    }

    async fn answer(&self, command: Command, content: &str) -> Reply {
        let subject = command.subject();
        let manifest = self
            .state
            .read()
            .await
            .current()
            .map(PathBuf::from)
            .unwrap_or_default();

        let task = tokio::task::spawn_blocking(move || lookup::run(&manifest, &command)).await;
        match task {
            Ok(Ok(outcome)) => {
                log::info!("Sending {} result", subject.noun());
                render::reply(&outcome, &self.prefix)
            }
            Ok(Err(e)) => {
                log_failure(&e, content);
                render::error_reply(subject, &e, &self.prefix)
            }
            Err(e) => {
                log::error!("Command: {content}");
                log::error!("Lookup task failed: {e}");
                Reply::Text(render::INTERNAL_ERROR_REPLY.to_string())
            }
        }
    }
}

fn log_failure(error: &Error, content: &str) {
    match error {
        Error::ManifestMissing(path) => {
            log::error!("Manifest queried does not exist at {}", path.display());
        }
        Error::IndexMissing(path) => {
            log::error!("Roll index has not been built at {}", path.display());
        }
        Error::NotFound { entity, query } => {
            log::info!("No {entity} matching '{query}'");
        }
        e if e.is_parse_failure() => {
            log::error!("Command: {content}");
            log::error!("Failed to parse: {e}");
        }
        Error::InvalidQuery(detail) => {
            log::info!("Rejected query '{content}': {detail}");
        }
        e => {
            log::error!("Command: {content}");
            log::error!("Failed to query manifest: {e}");
        }
    }
}

fn create_embed(embed: Embed) -> CreateEmbed {
    let mut builder = CreateEmbed::new()
        .title(embed.title)
        .description(embed.description)
        .colour(embed.colour);
    if let Some(url) = embed.thumbnail {
        builder = builder.thumbnail(url);
    }
    for field in embed.fields {
        builder = builder.field(field.name, field.value, field.inline);
    }
    builder
}

fn is_rate_limited(error: &serenity::Error) -> bool {
    match error {
        serenity::Error::Http(e) => e.status_code().map(|status| status.as_u16()) == Some(429),
        _ => false,
    }
}

#[async_trait]
impl EventHandler for Handler {
    async fn ready(&self, _ctx: Context, ready: Ready) {
        log::info!("We have logged in as {}", ready.user.name);
    }

    async fn message(&self, ctx: Context, msg: Message) {
        if msg.author.bot {
            return;
        }
        let Some(reply) = self.respond(&msg.content).await else {
            return;
        };

        let sent = match reply {
            Reply::Text(text) => msg.channel_id.say(&ctx.http, text).await,
            Reply::Embed(embed) => {
                let message = CreateMessage::new().embed(create_embed(embed));
                msg.channel_id.send_message(&ctx.http, message).await
            }
        };
        if let Err(e) = sent {
            if is_rate_limited(&e) {
                log::error!("Bot is rate-limited");
            } else {
                log::error!("Failed to send reply: {e}");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gunsmith_core::testkit;
    use gunsmith_manifest::ManifestState;

    fn handler_with_fixture() -> (tempfile::TempDir, Handler) {
        let dir = tempfile::tempdir().unwrap();
        let manifest = dir.path().join("world.content");
        testkit::write_fixture_manifest(&manifest).unwrap();
        let state = ManifestState::with_current(manifest).shared();
        (dir, Handler::new(state, "!gunsmith"))
    }

    #[tokio::test]
    async fn test_ignores_other_messages() {
        let (_dir, handler) = handler_with_fixture();
        assert!(handler.respond("good morning").await.is_none());
    }

    #[tokio::test]
    async fn test_weapon_reply() {
        let (_dir, handler) = handler_with_fixture();
        let Some(Reply::Embed(embed)) = handler.respond("!gunsmith Fatebringer").await else {
            panic!("expected an embed");
        };
        assert_eq!(embed.title, "Fatebringer");
    }

    #[tokio::test]
    async fn test_usage_reply() {
        let (_dir, handler) = handler_with_fixture();
        let reply = handler.respond("!gunsmith ab").await.unwrap();
        assert_eq!(
            reply,
            Reply::Text("Please enter a query of 3 or more characters!".to_string())
        );
    }

    #[tokio::test]
    async fn test_no_manifest_loaded() {
        let handler = Handler::new(ManifestState::new().shared(), "!gunsmith");
        let reply = handler.respond("!gunsmith Fatebringer").await.unwrap();
        assert_eq!(
            reply,
            Reply::Text(render::MANIFEST_MISSING_REPLY.to_string())
        );
    }
}
