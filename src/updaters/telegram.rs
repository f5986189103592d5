use async_trait::async_trait;
use secrecy::ExposeSecret;
use serde_json::{Value, json};
use tokio::sync::Mutex;
use tracing::{debug, error, info};

use crate::config::TelegramConfig;
use crate::ledger::MentionLedger;
use crate::message::MessageRecord;
use crate::parsers;

use super::{Platform, PlatformUpdater, UpdaterError};

pub const TELEGRAM_API_BASE: &str = "https://api.telegram.org";

#[derive(Default)]
struct TelegramSession {
    connected: bool,
}

/// Telegram updater over the Bot API.
///
/// The session is validated lazily on the first networked call and cached
/// behind `connected`; a failed validation propagates as an authentication
/// error instead of collapsing to `false`. Calls on one instance serialize
/// on the session mutex, and the guard is released on every exit path, so a
/// failed action never wedges the session.
pub struct TelegramUpdater {
    config: TelegramConfig,
    http: reqwest::Client,
    ledger: MentionLedger,
    api_base: String,
    session: Mutex<TelegramSession>,
}

impl TelegramUpdater {
    pub fn new(config: TelegramConfig, ledger: MentionLedger) -> Self {
        Self::with_api_base(config, ledger, TELEGRAM_API_BASE)
    }

    pub fn with_api_base(config: TelegramConfig, ledger: MentionLedger, api_base: &str) -> Self {
        Self {
            config,
            http: reqwest::Client::new(),
            ledger,
            api_base: api_base.trim_end_matches('/').to_string(),
            session: Mutex::new(TelegramSession::default()),
        }
    }

    fn method_url(&self, method: &str) -> String {
        format!(
            "{}/bot{}/{}",
            self.api_base,
            self.config.bot_token.expose_secret(),
            method
        )
    }

    async fn ensure_connected(&self, session: &mut TelegramSession) -> Result<(), UpdaterError> {
        if session.connected {
            return Ok(());
        }

        let response = self
            .http
            .get(self.method_url("getMe"))
            .send()
            .await
            .map_err(|err| UpdaterError::Auth {
                platform: Platform::Telegram,
                reason: format!("connection failed: {err}"),
            })?;

        let status = response.status();
        let body: Value = response.json().await.map_err(|err| UpdaterError::Auth {
            platform: Platform::Telegram,
            reason: format!("malformed getMe response: {err}"),
        })?;

        let authorized = status.is_success()
            && body.get("ok").and_then(Value::as_bool).unwrap_or(false);
        if !authorized {
            let description = body
                .get("description")
                .and_then(Value::as_str)
                .unwrap_or("unauthorized");
            return Err(UpdaterError::Auth {
                platform: Platform::Telegram,
                reason: description.to_string(),
            });
        }

        info!("telegram session established");
        session.connected = true;
        Ok(())
    }

    /// Drop the cached session; the next call re-validates the token.
    pub async fn disconnect(&self) {
        let mut session = self.session.lock().await;
        if session.connected {
            info!("closing telegram session");
            session.connected = false;
        }
    }
}

#[async_trait]
impl PlatformUpdater for TelegramUpdater {
    fn platform(&self) -> Platform {
        Platform::Telegram
    }

    async fn add_reaction_to_message(
        &self,
        _url: &str,
        _reaction_name: &str,
    ) -> Result<bool, UpdaterError> {
        // TODO: implement via setMessageReaction.
        debug!("telegram reactions are not implemented yet");
        Ok(true)
    }

    async fn add_reply_to_message(&self, url: &str, text: &str) -> Result<bool, UpdaterError> {
        let target = parsers::telegram::parse(url).map_err(|err| {
            error!("telegram url rejected: {err}");
            UpdaterError::InvalidUrl {
                platform: Platform::Telegram,
                url: url.to_string(),
            }
        })?;

        let mut session = self.session.lock().await;
        self.ensure_connected(&mut session).await?;

        let payload = json!({
            "chat_id": target.chat_id,
            "text": text,
            "reply_to_message_id": target.message_id,
        });

        let response = match self
            .http
            .post(self.method_url("sendMessage"))
            .json(&payload)
            .send()
            .await
        {
            Ok(response) => response,
            Err(err) => {
                error!("telegram reply request failed: {err}");
                return Ok(false);
            }
        };

        let body: Value = match response.json().await {
            Ok(body) => body,
            Err(err) => {
                error!("malformed sendMessage response: {err}");
                return Ok(false);
            }
        };

        if body.get("ok").and_then(Value::as_bool).unwrap_or(false) {
            info!(
                "reply added to telegram message {} in chat {}",
                target.message_id, target.chat_id
            );
            Ok(true)
        } else {
            let description = body
                .get("description")
                .and_then(Value::as_str)
                .unwrap_or("unknown error");
            error!("failed to add telegram reply: {description}");
            Ok(false)
        }
    }

    /// Telegram content retrieval is backed by previously ingested data; no
    /// live fetch happens here.
    async fn message_from_url(&self, url: &str) -> Result<MessageRecord, UpdaterError> {
        Ok(self.ledger.message_from_url(url).await?)
    }
}
