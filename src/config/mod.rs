pub use self::parser::{
    Config, DatabaseConfig, DbType, DiscordConfig, LoggingConfig, RedditConfig, TelegramConfig,
    TwitterConfig,
};
pub use self::validator::ConfigError;

mod parser;
mod validator;
