use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::path::Path;

use super::ConfigError;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub database: DatabaseConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub discord: Option<DiscordConfig>,
    #[serde(default)]
    pub reddit: Option<RedditConfig>,
    #[serde(default)]
    pub telegram: Option<TelegramConfig>,
    #[serde(default)]
    pub twitter: Option<TwitterConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub filename: Option<String>,
    #[serde(default)]
    pub max_connections: Option<u32>,
    #[serde(default)]
    pub min_connections: Option<u32>,
}

impl DatabaseConfig {
    pub fn db_type(&self) -> DbType {
        let url = self.connection_string();
        if url.starts_with("sqlite://") || self.filename.is_some() {
            DbType::Sqlite
        } else {
            DbType::Postgres
        }
    }

    pub fn connection_string(&self) -> String {
        if let Some(ref url) = self.url {
            url.clone()
        } else if let Some(ref file) = self.filename {
            format!("sqlite://{}", file)
        } else {
            String::new()
        }
    }

    pub fn sqlite_path(&self) -> Option<String> {
        if let DbType::Sqlite = self.db_type() {
            let url = self.connection_string();
            Some(url.strip_prefix("sqlite://").unwrap_or(&url).to_string())
        } else {
            None
        }
    }

    pub fn max_connections(&self) -> Option<u32> {
        match self.db_type() {
            DbType::Postgres => self.max_connections,
            DbType::Sqlite => Some(1),
        }
    }

    pub fn min_connections(&self) -> Option<u32> {
        match self.db_type() {
            DbType::Postgres => self.min_connections,
            DbType::Sqlite => Some(1),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DbType {
    Postgres,
    Sqlite,
}

/// Discord credentials and the guild allow-list. URLs pointing outside the
/// listed guilds are rejected before any network call.
#[derive(Debug, Clone, Deserialize)]
pub struct DiscordConfig {
    pub bot_token: SecretString,
    #[serde(default)]
    pub guild_ids: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RedditConfig {
    pub client_id: String,
    pub client_secret: SecretString,
    #[serde(default = "default_reddit_user_agent")]
    pub user_agent: String,
    pub username: String,
    pub password: SecretString,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TelegramConfig {
    pub bot_token: SecretString,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TwitterConfig {
    pub bearer_token: SecretString,
}

impl Config {
    pub fn load() -> Result<Self, ConfigError> {
        let config_path =
            std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config.yaml".to_string());

        Self::load_from_file(&config_path)
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::load_from_str(&content)
    }

    pub fn load_from_str(content: &str) -> Result<Self, ConfigError> {
        let config: Config = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.database.connection_string().is_empty() {
            return Err(ConfigError::InvalidConfig(
                "database connection string cannot be empty".to_string(),
            ));
        }

        if let Some(discord) = &self.discord {
            if discord.bot_token.expose_secret().is_empty() {
                return Err(ConfigError::InvalidConfig(
                    "discord.bot_token cannot be empty".to_string(),
                ));
            }
            if discord.guild_ids.is_empty() {
                return Err(ConfigError::InvalidConfig(
                    "discord.guild_ids cannot be empty".to_string(),
                ));
            }
        }

        if let Some(reddit) = &self.reddit {
            if reddit.client_id.is_empty() {
                return Err(ConfigError::InvalidConfig(
                    "reddit.client_id cannot be empty".to_string(),
                ));
            }
            if reddit.username.is_empty() {
                return Err(ConfigError::InvalidConfig(
                    "reddit.username cannot be empty".to_string(),
                ));
            }
        }

        if let Some(telegram) = &self.telegram {
            if telegram.bot_token.expose_secret().is_empty() {
                return Err(ConfigError::InvalidConfig(
                    "telegram.bot_token cannot be empty".to_string(),
                ));
            }
        }

        if let Some(twitter) = &self.twitter {
            if twitter.bearer_token.expose_secret().is_empty() {
                return Err(ConfigError::InvalidConfig(
                    "twitter.bearer_token cannot be empty".to_string(),
                ));
            }
        }

        Ok(())
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

fn default_reddit_user_agent() -> String {
    "rewards-updater/0.1".to_string()
}

#[cfg(test)]
mod tests {
    use secrecy::ExposeSecret;

    use super::{Config, DbType};
    use crate::config::ConfigError;

    const FULL_CONFIG: &str = r#"
database:
  filename: rewards.db
logging:
  level: debug
discord:
  bot_token: discord-token
  guild_ids: ["111", "444"]
reddit:
  client_id: reddit-id
  client_secret: reddit-secret
  username: rewards-bot
  password: reddit-password
telegram:
  bot_token: telegram-token
twitter:
  bearer_token: twitter-bearer
"#;

    #[test]
    fn load_from_str_parses_every_section() {
        let config = Config::load_from_str(FULL_CONFIG).expect("config should parse");

        assert_eq!(config.database.db_type(), DbType::Sqlite);
        assert_eq!(config.database.sqlite_path().as_deref(), Some("rewards.db"));
        assert_eq!(config.logging.level, "debug");

        let discord = config.discord.expect("discord section");
        assert_eq!(discord.bot_token.expose_secret(), "discord-token");
        assert_eq!(discord.guild_ids, vec!["111", "444"]);

        let reddit = config.reddit.expect("reddit section");
        assert_eq!(reddit.user_agent, "rewards-updater/0.1");
        assert_eq!(reddit.username, "rewards-bot");

        assert!(config.telegram.is_some());
        assert!(config.twitter.is_some());
    }

    #[test]
    fn platform_sections_are_optional() {
        let config = Config::load_from_str("database:\n  filename: rewards.db\n")
            .expect("config should parse");
        assert!(config.discord.is_none());
        assert!(config.reddit.is_none());
        assert!(config.telegram.is_none());
        assert!(config.twitter.is_none());
    }

    #[test]
    fn postgres_url_selects_the_postgres_backend() {
        let config =
            Config::load_from_str("database:\n  url: postgres://rewards@localhost/rewards\n")
                .expect("config should parse");
        assert_eq!(config.database.db_type(), DbType::Postgres);
        assert_eq!(config.database.sqlite_path(), None);
    }

    #[test]
    fn empty_database_section_fails_validation() {
        let result = Config::load_from_str("database: {}\n");
        assert!(matches!(result, Err(ConfigError::InvalidConfig(_))));
    }

    #[test]
    fn empty_guild_allow_list_fails_validation() {
        let result = Config::load_from_str(
            "database:\n  filename: rewards.db\ndiscord:\n  bot_token: tok\n  guild_ids: []\n",
        );
        assert!(matches!(result, Err(ConfigError::InvalidConfig(_))));
    }
}
