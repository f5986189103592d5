use async_trait::async_trait;
use secrecy::ExposeSecret;
use serde_json::{Value, json};
use thiserror::Error;
use tracing::{debug, error, info};

use crate::config::TwitterConfig;
use crate::ledger::MentionLedger;
use crate::message::MessageRecord;
use crate::parsers;

use super::{Platform, PlatformUpdater, UpdaterError};

pub const TWITTER_API_BASE: &str = "https://api.twitter.com";

#[derive(Debug, Error)]
enum TwitterError {
    #[error("{0}")]
    Api(String),

    #[error("{0}")]
    Transport(#[from] reqwest::Error),

    #[error("{0}")]
    Unexpected(String),
}

pub struct TwitterUpdater {
    config: TwitterConfig,
    http: reqwest::Client,
    ledger: MentionLedger,
    api_base: String,
}

impl TwitterUpdater {
    pub fn new(config: TwitterConfig, ledger: MentionLedger) -> Self {
        Self::with_api_base(config, ledger, TWITTER_API_BASE)
    }

    pub fn with_api_base(config: TwitterConfig, ledger: MentionLedger, api_base: &str) -> Self {
        Self {
            config,
            http: reqwest::Client::new(),
            ledger,
            api_base: api_base.trim_end_matches('/').to_string(),
        }
    }

    async fn post_reply(&self, tweet_id: &str, text: &str) -> Result<(), TwitterError> {
        let payload = json!({
            "text": text,
            "reply": {"in_reply_to_tweet_id": tweet_id},
        });

        let response = self
            .http
            .post(format!("{}/2/tweets", self.api_base))
            .bearer_auth(self.config.bearer_token.expose_secret())
            .json(&payload)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(TwitterError::Api(format!(
                "tweet request failed with status {}",
                response.status().as_u16()
            )));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| TwitterError::Unexpected(format!("malformed tweet response: {e}")))?;

        if body.get("data").is_none() {
            return Err(TwitterError::Api("tweet response carried no data".to_string()));
        }

        Ok(())
    }
}

#[async_trait]
impl PlatformUpdater for TwitterUpdater {
    fn platform(&self) -> Platform {
        Platform::Twitter
    }

    async fn add_reaction_to_message(
        &self,
        _url: &str,
        _reaction_name: &str,
    ) -> Result<bool, UpdaterError> {
        // X has no emoji reactions; the action is a recorded no-op.
        debug!("twitter reaction requested, nothing to do");
        Ok(true)
    }

    async fn add_reply_to_message(&self, url: &str, text: &str) -> Result<bool, UpdaterError> {
        let Some(tweet_id) = parsers::twitter::parse(url) else {
            error!("invalid tweet url format: {url}");
            return Ok(false);
        };

        match self.post_reply(&tweet_id, text).await {
            Ok(()) => {
                info!("reply added to tweet {tweet_id}");
                Ok(true)
            }
            Err(TwitterError::Api(detail)) => {
                error!("twitter api error: {detail}");
                Ok(false)
            }
            Err(TwitterError::Transport(err)) => {
                error!("twitter client error: {err}");
                Ok(false)
            }
            Err(TwitterError::Unexpected(detail)) => {
                error!("unexpected twitter error: {detail}");
                Ok(false)
            }
        }
    }

    /// Twitter content retrieval is backed by previously ingested data; no
    /// live fetch happens here.
    async fn message_from_url(&self, url: &str) -> Result<MessageRecord, UpdaterError> {
        Ok(self.ledger.message_from_url(url).await?)
    }
}

#[cfg(all(test, feature = "sqlite"))]
mod tests {
    use secrecy::SecretString;

    use super::super::test_support::{MockRemote, response};
    use super::TwitterUpdater;
    use crate::config::TwitterConfig;
    use crate::ledger::MentionLedger;
    use crate::ledger::test_util::sqlite_ledger;
    use crate::updaters::PlatformUpdater;

    fn updater(ledger: MentionLedger, remote: &MockRemote) -> TwitterUpdater {
        TwitterUpdater::with_api_base(
            TwitterConfig {
                bearer_token: SecretString::from("bearer"),
            },
            ledger,
            &remote.base_url,
        )
    }

    #[tokio::test]
    async fn reaction_is_always_a_successful_no_op() {
        let (ledger, _manager, _file) = sqlite_ledger().await;
        let remote = MockRemote::spawn(vec![]).await;
        let updater = updater(ledger, &remote);

        let added = updater
            .add_reaction_to_message("anything", "duplicate")
            .await
            .expect("no updater error");
        assert!(added);
        assert_eq!(remote.connection_count(), 0);
    }

    #[tokio::test]
    async fn reply_targets_the_parsed_status_id() {
        let (ledger, _manager, _file) = sqlite_ledger().await;
        let remote = MockRemote::spawn(vec![(
            "/2/tweets",
            response("201 Created", r#"{"data": {"id": "1", "text": "reply"}}"#),
        )])
        .await;
        let updater = updater(ledger, &remote);

        let replied = updater
            .add_reply_to_message("https://x.com/someuser/status/987", "Congrats!")
            .await
            .expect("no updater error");
        assert!(replied);

        let requests = remote.requests().await;
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].method, "POST");
        assert_eq!(requests[0].path, "/2/tweets");
        assert!(requests[0].body.contains("\"in_reply_to_tweet_id\":\"987\""));
    }

    #[tokio::test]
    async fn reply_short_circuits_for_invalid_url() {
        let (ledger, _manager, _file) = sqlite_ledger().await;
        let remote = MockRemote::spawn(vec![]).await;
        let updater = updater(ledger, &remote);

        let replied = updater
            .add_reply_to_message("https://example.com/status/1", "hello")
            .await
            .expect("no updater error");

        assert!(!replied);
        assert_eq!(remote.connection_count(), 0);
    }

    #[tokio::test]
    async fn reply_fails_when_the_response_has_no_data() {
        let (ledger, _manager, _file) = sqlite_ledger().await;
        let remote = MockRemote::spawn(vec![(
            "/2/tweets",
            response("200 OK", r#"{"errors": [{"message": "not permitted"}]}"#),
        )])
        .await;
        let updater = updater(ledger, &remote);

        let replied = updater
            .add_reply_to_message("https://twitter.com/someuser/status/55", "hello")
            .await
            .expect("no updater error");
        assert!(!replied);
    }
}
