use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use thiserror::Error;

use crate::db::DatabaseError;
use crate::message::MessageRecord;

pub mod discord;
pub mod dispatcher;
pub mod reddit;
pub mod telegram;
pub mod twitter;

pub use discord::DiscordUpdater;
pub use dispatcher::{DispatchError, UpdaterDispatcher};
pub use reddit::RedditUpdater;
pub use telegram::TelegramUpdater;
pub use twitter::TwitterUpdater;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Platform {
    Discord,
    Reddit,
    Telegram,
    Twitter,
}

impl Platform {
    pub const ALL: [Platform; 4] = [
        Platform::Discord,
        Platform::Reddit,
        Platform::Telegram,
        Platform::Twitter,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Discord => "discord",
            Platform::Reddit => "reddit",
            Platform::Telegram => "telegram",
            Platform::Twitter => "twitter",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Error)]
#[error("unknown platform: {0}")]
pub struct UnknownPlatform(String);

impl FromStr for Platform {
    type Err = UnknownPlatform;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "discord" => Ok(Platform::Discord),
            "reddit" => Ok(Platform::Reddit),
            "telegram" => Ok(Platform::Telegram),
            "twitter" | "x" => Ok(Platform::Twitter),
            other => Err(UnknownPlatform(other.to_string())),
        }
    }
}

#[derive(Debug, Error)]
pub enum UpdaterError {
    /// Session establishment failed. Only the Telegram updater produces
    /// this; silently reporting a failed action would mask a dead session.
    #[error("authentication with {platform} failed: {reason}")]
    Auth { platform: Platform, reason: String },

    /// Malformed URL on a platform whose parser is strict (Telegram).
    #[error("invalid {platform} url: {url}")]
    InvalidUrl { platform: Platform, url: String },

    #[error(transparent)]
    Ledger(#[from] DatabaseError),
}

/// One implementation per platform. Remote and input failures are reported
/// through the return value (`false` or a `success=false` record), never as
/// `Err`, except for the cases [`UpdaterError`] documents.
#[async_trait]
pub trait PlatformUpdater: Send + Sync {
    fn platform(&self) -> Platform;

    /// Add the named reaction to the message behind `url`.
    async fn add_reaction_to_message(
        &self,
        url: &str,
        reaction_name: &str,
    ) -> Result<bool, UpdaterError>;

    /// Post `text` as a threaded reply to the target behind `url`.
    async fn add_reply_to_message(&self, url: &str, text: &str) -> Result<bool, UpdaterError>;

    /// Fetch the canonical message record for `url`.
    async fn message_from_url(&self, url: &str) -> Result<MessageRecord, UpdaterError>;
}


#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::Platform;

    #[test]
    fn platform_round_trips_through_strings() {
        for platform in Platform::ALL {
            assert_eq!(Platform::from_str(platform.as_str()).ok(), Some(platform));
        }
    }

    #[test]
    fn platform_parsing_is_case_insensitive_and_knows_x() {
        assert_eq!(Platform::from_str("Discord").ok(), Some(Platform::Discord));
        assert_eq!(Platform::from_str("x").ok(), Some(Platform::Twitter));
        assert!(Platform::from_str("myspace").is_err());
    }
}
