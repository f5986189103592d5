use once_cell::sync::Lazy;
use regex::Regex;

// https://discord.com/channels/{guild}/{channel}/{message}, all numeric.
static MESSAGE_URL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^https://discord\.com/channels/(\d+)/(\d+)/(\d+)$")
        .expect("discord message url pattern")
});

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscordMessageRef {
    pub guild_id: String,
    pub channel_id: String,
    pub message_id: String,
}

/// Extract channel and message identifiers from a Discord message URL.
///
/// A syntactically valid URL whose guild is not in `allowed_guilds` is
/// treated the same as an unrecognized URL.
pub fn parse(url: &str, allowed_guilds: &[String]) -> Option<DiscordMessageRef> {
    let captures = MESSAGE_URL.captures(url)?;
    let guild_id = &captures[1];

    if !allowed_guilds.iter().any(|allowed| allowed == guild_id) {
        return None;
    }

    Some(DiscordMessageRef {
        guild_id: guild_id.to_string(),
        channel_id: captures[2].to_string(),
        message_id: captures[3].to_string(),
    })
}
