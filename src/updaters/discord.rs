use std::collections::HashMap;

use async_trait::async_trait;
use once_cell::sync::Lazy;
use reqwest::StatusCode;
use reqwest::header::AUTHORIZATION;
use secrecy::ExposeSecret;
use serde_json::{Value, json};
use tracing::{error, info};
use url::Url;

use crate::config::DiscordConfig;
use crate::message::MessageRecord;
use crate::parsers;

use super::{Platform, PlatformUpdater, UpdaterError};

pub const DISCORD_API_BASE: &str = "https://discord.com/api/v10";

// Reaction names used by the reward workflow, mapped to the emoji the bot
// actually sets. Unknown names fail closed.
static REACTION_EMOJIS: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("duplicate", "\u{2705}"),
        ("denied", "\u{274c}"),
        ("received", "\u{1f440}"),
        ("rewarded", "\u{1f389}"),
    ])
});

pub fn reaction_emoji(name: &str) -> Option<&'static str> {
    REACTION_EMOJIS.get(name).copied()
}

pub struct DiscordUpdater {
    config: DiscordConfig,
    http: reqwest::Client,
    api_base: String,
}

impl DiscordUpdater {
    pub fn new(config: DiscordConfig) -> Self {
        Self::with_api_base(config, DISCORD_API_BASE)
    }

    pub fn with_api_base(config: DiscordConfig, api_base: &str) -> Self {
        Self {
            config,
            http: reqwest::Client::new(),
            api_base: api_base.trim_end_matches('/').to_string(),
        }
    }

    fn bot_authorization(&self) -> String {
        format!("Bot {}", self.config.bot_token.expose_secret())
    }

    /// Build an endpoint URL from path segments, percent-encoding each one
    /// (the reaction emoji in particular).
    fn endpoint(&self, segments: &[&str]) -> Option<Url> {
        let mut endpoint = Url::parse(&self.api_base).ok()?;
        endpoint
            .path_segments_mut()
            .ok()?
            .pop_if_empty()
            .extend(segments);
        Some(endpoint)
    }
}

#[async_trait]
impl PlatformUpdater for DiscordUpdater {
    fn platform(&self) -> Platform {
        Platform::Discord
    }

    async fn add_reaction_to_message(
        &self,
        url: &str,
        reaction_name: &str,
    ) -> Result<bool, UpdaterError> {
        let Some(target) = parsers::discord::parse(url, &self.config.guild_ids) else {
            error!("discord url not recognized or guild not allowed: {url}");
            return Ok(false);
        };

        let Some(emoji) = reaction_emoji(reaction_name) else {
            error!("invalid reaction name: {reaction_name}");
            return Ok(false);
        };

        let Some(endpoint) = self.endpoint(&[
            "channels",
            &target.channel_id,
            "messages",
            &target.message_id,
            "reactions",
            emoji,
            "@me",
        ]) else {
            error!("failed to build reaction endpoint for {url}");
            return Ok(false);
        };

        let response = match self
            .http
            .put(endpoint)
            .header(AUTHORIZATION, self.bot_authorization())
            // Discord rejects the reaction PUT without an explicit zero-length body.
            .body("")
            .send()
            .await
        {
            Ok(response) => response,
            Err(err) => {
                error!("discord reaction request failed: {err}");
                return Ok(false);
            }
        };

        if response.status() == StatusCode::NO_CONTENT {
            info!(
                "emoji {reaction_name} added to message {}",
                target.message_id
            );
            Ok(true)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            error!("failed to add reaction: {} - {}", status.as_u16(), body);
            Ok(false)
        }
    }

    async fn add_reply_to_message(&self, url: &str, text: &str) -> Result<bool, UpdaterError> {
        let Some(target) = parsers::discord::parse(url, &self.config.guild_ids) else {
            error!("discord url not recognized or guild not allowed: {url}");
            return Ok(false);
        };

        let Some(endpoint) = self.endpoint(&["channels", &target.channel_id, "messages"]) else {
            error!("failed to build reply endpoint for {url}");
            return Ok(false);
        };

        let payload = json!({
            "content": text,
            "message_reference": {
                "channel_id": target.channel_id,
                "message_id": target.message_id,
            },
        });

        let response = match self
            .http
            .post(endpoint)
            .header(AUTHORIZATION, self.bot_authorization())
            .json(&payload)
            .send()
            .await
        {
            Ok(response) => response,
            Err(err) => {
                error!("discord reply request failed: {err}");
                return Ok(false);
            }
        };

        if response.status() == StatusCode::OK {
            info!("reply added to message {}", target.message_id);
            Ok(true)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            error!("failed to add reply: {} - {}", status.as_u16(), body);
            Ok(false)
        }
    }

    async fn message_from_url(&self, url: &str) -> Result<MessageRecord, UpdaterError> {
        let Some(target) = parsers::discord::parse(url, &self.config.guild_ids) else {
            return Ok(MessageRecord::failure("Invalid URL"));
        };

        let Some(endpoint) = self.endpoint(&[
            "channels",
            &target.channel_id,
            "messages",
            &target.message_id,
        ]) else {
            return Ok(MessageRecord::failure("Invalid URL"));
        };

        let response = match self
            .http
            .get(endpoint)
            .header(AUTHORIZATION, self.bot_authorization())
            .send()
            .await
        {
            Ok(response) => response,
            Err(err) => {
                error!("discord message fetch failed: {err}");
                return Ok(MessageRecord::failure(format!("Request error: {err}")));
            }
        };

        let status = response.status();
        if status != StatusCode::OK {
            return Ok(MessageRecord::failure(format!(
                "API Error: {}",
                status.as_u16()
            )));
        }

        let data: Value = match response.json().await {
            Ok(data) => data,
            Err(err) => {
                error!("malformed discord message response: {err}");
                return Ok(MessageRecord::failure(format!("Malformed response: {err}")));
            }
        };

        let content = data
            .get("content")
            .and_then(Value::as_str)
            .unwrap_or("")
            .to_string();
        let author = data
            .pointer("/author/username")
            .and_then(Value::as_str)
            .unwrap_or("Unknown")
            .to_string();
        let timestamp = data
            .get("timestamp")
            .and_then(Value::as_str)
            .unwrap_or("")
            .to_string();

        Ok(MessageRecord::found(
            content.clone(),
            content,
            author,
            timestamp,
            target.message_id.clone(),
            data,
        ))
    }
}
