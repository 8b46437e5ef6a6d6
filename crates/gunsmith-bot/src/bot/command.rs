//! Parsing of `!gunsmith ...` messages.

use gunsmith_core::RollMode;
use thiserror::Error;

/// Shortest query the bot will search for.
pub const MIN_QUERY_LEN: usize = 3;

/// What a command looks up, used to word replies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Subject {
    Weapon,
    Perk,
    Mod,
    RollQuery,
}

impl Subject {
    #[must_use]
    pub const fn noun(self) -> &'static str {
        match self {
            Self::Weapon => "weapon",
            Self::Perk => "perk",
            Self::Mod => "mod",
            Self::RollQuery => "roll query",
        }
    }

    /// The noun with its first letter capitalised, for sentence starts.
    #[must_use]
    pub const fn title(self) -> &'static str {
        match self {
            Self::Weapon => "Weapon",
            Self::Perk => "Perk",
            Self::Mod => "Mod",
            Self::RollQuery => "Roll query",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Weapon { query: String, mode: RollMode },
    Perk(String),
    Mod(String),
    /// Two weapon names separated by a comma.
    Compare(String),
    /// A raw roll query, `-<column> perk, perk ...`.
    Rolls(String),
    Help,
}

impl Command {
    #[must_use]
    pub const fn subject(&self) -> Subject {
        match self {
            Self::Weapon { .. } | Self::Compare(_) | Self::Help => Subject::Weapon,
            Self::Perk(_) => Subject::Perk,
            Self::Mod(_) => Subject::Mod,
            Self::Rolls(_) => Subject::RollQuery,
        }
    }
}

/// A command that was recognised but cannot be run as typed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UsageError {
    #[error("Please enter the {} name. Run '{prefix} -help' for more information.", .subject.noun())]
    MissingArgument { subject: Subject, prefix: String },

    #[error("Please enter a query of 3 or more characters!")]
    QueryTooShort,
}

#[derive(Debug, Clone, Copy)]
enum Flag {
    Weapon,
    Default,
    Perk,
    Mod,
    Compare,
    Rolls,
}

impl Flag {
    fn from_token(token: &str) -> Option<Self> {
        match token.to_ascii_lowercase().as_str() {
            "-default" => Some(Self::Default),
            "-perk" => Some(Self::Perk),
            "-mod" => Some(Self::Mod),
            "-compare" => Some(Self::Compare),
            "-rolls" => Some(Self::Rolls),
            _ => None,
        }
    }

    const fn subject(self) -> Subject {
        match self {
            Self::Weapon | Self::Default | Self::Compare => Subject::Weapon,
            Self::Perk => Subject::Perk,
            Self::Mod => Subject::Mod,
            Self::Rolls => Subject::RollQuery,
        }
    }

    fn command(self, query: String) -> Command {
        match self {
            Self::Weapon => Command::Weapon {
                query,
                mode: RollMode::AllRolls,
            },
            Self::Default => Command::Weapon {
                query,
                mode: RollMode::Default,
            },
            Self::Perk => Command::Perk(query),
            Self::Mod => Command::Mod(query),
            Self::Compare => Command::Compare(query),
            Self::Rolls => Command::Rolls(query),
        }
    }
}

/// Parse a chat message.
///
/// Returns `None` when the message is not addressed to the bot: it does not
/// start with `prefix`, or the prefix runs straight into another word.
/// Unknown flags and `-help` both yield [`Command::Help`].
pub fn parse(content: &str, prefix: &str) -> Option<Result<Command, UsageError>> {
    let rest = content.trim_start().strip_prefix(prefix)?;
    if !(rest.is_empty() || rest.starts_with(char::is_whitespace)) {
        return None;
    }
    let rest = rest.trim();

    let (flag, argument) = if rest.starts_with('-') {
        let (token, argument) = rest
            .split_once(char::is_whitespace)
            .map_or((rest, ""), |(token, argument)| (token, argument.trim()));
        match Flag::from_token(token) {
            Some(flag) => (flag, argument),
            None => {
                if !token.eq_ignore_ascii_case("-help") {
                    log::debug!("Unknown flag '{token}'");
                }
                return Some(Ok(Command::Help));
            }
        }
    } else {
        (Flag::Weapon, rest)
    };

    Some(
        validate_query(argument, flag.subject(), prefix)
            .map(|query| flag.command(query.to_string())),
    )
}

/// Check a lookup argument: present and at least [`MIN_QUERY_LEN`] characters.
pub fn validate_query<'a>(
    argument: &'a str,
    subject: Subject,
    prefix: &str,
) -> Result<&'a str, UsageError> {
    let argument = argument.trim();
    if argument.is_empty() {
        return Err(UsageError::MissingArgument {
            subject,
            prefix: prefix.to_string(),
        });
    }
    if argument.chars().count() < MIN_QUERY_LEN {
        return Err(UsageError::QueryTooShort);
    }
    Ok(argument)
}
