use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use reqwest::header::USER_AGENT;
use secrecy::ExposeSecret;
use serde_json::Value;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, error, info};

use crate::config::RedditConfig;
use crate::ledger::MentionLedger;
use crate::message::MessageRecord;
use crate::parsers;

use super::{Platform, PlatformUpdater, UpdaterError};

pub const REDDIT_API_BASE: &str = "https://oauth.reddit.com";
pub const REDDIT_TOKEN_URL: &str = "https://www.reddit.com/api/v1/access_token";

/// The three remote failure categories the reply path distinguishes in its
/// logs. All of them collapse to `false` at the trait boundary.
#[derive(Debug, Error)]
enum RedditError {
    #[error("{0}")]
    Api(String),

    #[error("{0}")]
    Transport(#[from] reqwest::Error),

    #[error("{0}")]
    Unexpected(String),
}

struct CachedToken {
    access_token: String,
    expires_at: DateTime<Utc>,
}

pub struct RedditUpdater {
    config: RedditConfig,
    http: reqwest::Client,
    ledger: MentionLedger,
    api_base: String,
    token_url: String,
    token: Mutex<Option<CachedToken>>,
}

impl RedditUpdater {
    pub fn new(config: RedditConfig, ledger: MentionLedger) -> Self {
        Self::with_endpoints(config, ledger, REDDIT_API_BASE, REDDIT_TOKEN_URL)
    }

    pub fn with_endpoints(
        config: RedditConfig,
        ledger: MentionLedger,
        api_base: &str,
        token_url: &str,
    ) -> Self {
        Self {
            config,
            http: reqwest::Client::new(),
            ledger,
            api_base: api_base.trim_end_matches('/').to_string(),
            token_url: token_url.to_string(),
            token: Mutex::new(None),
        }
    }

    /// OAuth2 script-grant token, fetched lazily and cached until shortly
    /// before expiry.
    async fn access_token(&self) -> Result<String, RedditError> {
        let mut cached = self.token.lock().await;
        if let Some(token) = cached.as_ref() {
            if token.expires_at > Utc::now() {
                return Ok(token.access_token.clone());
            }
        }

        let response = self
            .http
            .post(&self.token_url)
            .basic_auth(
                &self.config.client_id,
                Some(self.config.client_secret.expose_secret()),
            )
            .header(USER_AGENT, &self.config.user_agent)
            .form(&[
                ("grant_type", "password"),
                ("username", self.config.username.as_str()),
                ("password", self.config.password.expose_secret()),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(RedditError::Api(format!(
                "token request failed with status {}",
                response.status().as_u16()
            )));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| RedditError::Unexpected(format!("malformed token response: {e}")))?;
        let access_token = body
            .get("access_token")
            .and_then(Value::as_str)
            .ok_or_else(|| RedditError::Api("token response carried no access_token".to_string()))?
            .to_string();
        let expires_in = body
            .get("expires_in")
            .and_then(Value::as_i64)
            .unwrap_or(3600);

        *cached = Some(CachedToken {
            access_token: access_token.clone(),
            expires_at: Utc::now() + Duration::seconds((expires_in - 60).max(60)),
        });

        Ok(access_token)
    }

    async fn post_comment(&self, thing_id: &str, text: &str) -> Result<(), RedditError> {
        let token = self.access_token().await?;

        let response = self
            .http
            .post(format!("{}/api/comment", self.api_base))
            .bearer_auth(&token)
            .header(USER_AGENT, &self.config.user_agent)
            .form(&[
                ("api_type", "json"),
                ("thing_id", thing_id),
                ("text", text),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(RedditError::Api(format!(
                "comment request failed with status {}",
                response.status().as_u16()
            )));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| RedditError::Unexpected(format!("malformed comment response: {e}")))?;

        if let Some(errors) = body.pointer("/json/errors").and_then(Value::as_array) {
            if !errors.is_empty() {
                return Err(RedditError::Api(Value::Array(errors.clone()).to_string()));
            }
        }

        Ok(())
    }
}

#[async_trait]
impl PlatformUpdater for RedditUpdater {
    fn platform(&self) -> Platform {
        Platform::Reddit
    }

    async fn add_reaction_to_message(
        &self,
        _url: &str,
        _reaction_name: &str,
    ) -> Result<bool, UpdaterError> {
        // Reddit has no emoji reactions; the action is a recorded no-op.
        debug!("reddit reaction requested, nothing to do");
        Ok(true)
    }

    async fn add_reply_to_message(&self, url: &str, text: &str) -> Result<bool, UpdaterError> {
        let Some(target) = parsers::reddit::parse(url) else {
            error!("invalid reddit url: {url}");
            return Ok(false);
        };

        let thing_id = match &target.comment_id {
            Some(comment_id) => format!("t1_{comment_id}"),
            None => format!("t3_{}", target.submission_id),
        };

        match self.post_comment(&thing_id, text).await {
            Ok(()) => {
                match &target.comment_id {
                    Some(comment_id) => info!("replied to comment {comment_id}"),
                    None => info!("replied to submission {}", target.submission_id),
                }
                Ok(true)
            }
            Err(RedditError::Api(detail)) => {
                error!("reddit api error: {detail}");
                Ok(false)
            }
            Err(RedditError::Transport(err)) => {
                error!("reddit client error: {err}");
                Ok(false)
            }
            Err(RedditError::Unexpected(detail)) => {
                error!("unexpected reddit error: {detail}");
                Ok(false)
            }
        }
    }

    /// Reddit content retrieval is backed by previously ingested data; no
    /// live fetch happens here.
    async fn message_from_url(&self, url: &str) -> Result<MessageRecord, UpdaterError> {
        Ok(self.ledger.message_from_url(url).await?)
    }
}

#[cfg(all(test, feature = "sqlite"))]
mod tests {
    use secrecy::SecretString;
    use serde_json::json;

    use super::super::test_support::{MockRemote, response};
    use super::RedditUpdater;
    use crate::config::RedditConfig;
    use crate::ledger::MentionLedger;
    use crate::ledger::test_util::sqlite_ledger;
    use crate::updaters::PlatformUpdater;

    fn config() -> RedditConfig {
        RedditConfig {
            client_id: "client-id".to_string(),
            client_secret: SecretString::from("client-secret"),
            user_agent: "rewards-updater/test".to_string(),
            username: "rewards-bot".to_string(),
            password: SecretString::from("password"),
        }
    }

    fn updater(ledger: MentionLedger, remote: &MockRemote) -> RedditUpdater {
        RedditUpdater::with_endpoints(
            config(),
            ledger,
            &remote.base_url,
            &format!("{}/api/v1/access_token", remote.base_url),
        )
    }

    fn token_route() -> (&'static str, String) {
        (
            "/api/v1/access_token",
            response(
                "200 OK",
                r#"{"access_token": "tok", "token_type": "bearer", "expires_in": 3600}"#,
            ),
        )
    }

    #[tokio::test]
    async fn reaction_is_always_a_successful_no_op() {
        let (ledger, _manager, _file) = sqlite_ledger().await;
        let remote = MockRemote::spawn(vec![]).await;
        let updater = updater(ledger, &remote);

        // Even malformed URLs succeed; the platform has nothing to react with.
        for url in [
            "https://reddit.com/r/test/comments/abc123/post/",
            "not-a-url",
            "",
        ] {
            let added = updater
                .add_reaction_to_message(url, "duplicate")
                .await
                .expect("no updater error");
            assert!(added);
        }
        assert_eq!(remote.connection_count(), 0);
    }

    #[tokio::test]
    async fn reply_targets_the_submission_without_a_comment_id() {
        let (ledger, _manager, _file) = sqlite_ledger().await;
        let remote = MockRemote::spawn(vec![
            token_route(),
            ("/api/comment", response("200 OK", r#"{"json": {"errors": []}}"#)),
        ])
        .await;
        let updater = updater(ledger, &remote);

        let replied = updater
            .add_reply_to_message(
                "https://reddit.com/r/test/comments/abc123/title/",
                "Great work!",
            )
            .await
            .expect("no updater error");
        assert!(replied);

        let requests = remote.requests().await;
        let comment_request = requests
            .iter()
            .find(|request| request.path.contains("/api/comment"))
            .expect("comment request issued");
        assert!(comment_request.body.contains("thing_id=t3_abc123"));
        assert!(comment_request.body.contains("text=Great+work%21"));
    }

    #[tokio::test]
    async fn reply_targets_the_comment_when_one_was_parsed() {
        let (ledger, _manager, _file) = sqlite_ledger().await;
        let remote = MockRemote::spawn(vec![
            token_route(),
            ("/api/comment", response("200 OK", r#"{"json": {"errors": []}}"#)),
        ])
        .await;
        let updater = updater(ledger, &remote);

        let replied = updater
            .add_reply_to_message(
                "https://reddit.com/r/test/comments/abc123/title/def456/",
                "I agree!",
            )
            .await
            .expect("no updater error");
        assert!(replied);

        let requests = remote.requests().await;
        let comment_request = requests
            .iter()
            .find(|request| request.path.contains("/api/comment"))
            .expect("comment request issued");
        assert!(comment_request.body.contains("thing_id=t1_def456"));
    }

    #[tokio::test]
    async fn reply_short_circuits_for_invalid_url() {
        let (ledger, _manager, _file) = sqlite_ledger().await;
        let remote = MockRemote::spawn(vec![]).await;
        let updater = updater(ledger, &remote);

        let replied = updater
            .add_reply_to_message("https://invalid-url.example", "Test reply")
            .await
            .expect("no updater error");

        assert!(!replied);
        assert_eq!(remote.connection_count(), 0);
    }

    #[tokio::test]
    async fn reply_fails_when_the_api_reports_errors() {
        let (ledger, _manager, _file) = sqlite_ledger().await;
        let remote = MockRemote::spawn(vec![
            token_route(),
            (
                "/api/comment",
                response(
                    "200 OK",
                    r#"{"json": {"errors": [["RATELIMIT", "you are doing that too much", "ratelimit"]]}}"#,
                ),
            ),
        ])
        .await;
        let updater = updater(ledger, &remote);

        let replied = updater
            .add_reply_to_message("https://reddit.com/r/test/comments/abc123/post/", "reply")
            .await
            .expect("no updater error");
        assert!(!replied);
    }

    #[tokio::test]
    async fn reply_fails_when_the_token_request_is_rejected() {
        let (ledger, _manager, _file) = sqlite_ledger().await;
        let remote = MockRemote::spawn(vec![(
            "/api/v1/access_token",
            response("401 Unauthorized", "{}"),
        )])
        .await;
        let updater = updater(ledger, &remote);

        let replied = updater
            .add_reply_to_message("https://reddit.com/r/test/comments/abc123/post/", "reply")
            .await
            .expect("no updater error");
        assert!(!replied);
    }

    #[tokio::test]
    async fn token_is_cached_across_replies() {
        let (ledger, _manager, _file) = sqlite_ledger().await;
        let remote = MockRemote::spawn(vec![
            token_route(),
            ("/api/comment", response("200 OK", r#"{"json": {"errors": []}}"#)),
        ])
        .await;
        let updater = updater(ledger, &remote);

        for _ in 0..2 {
            let replied = updater
                .add_reply_to_message("https://reddit.com/r/test/comments/abc123/post/", "reply")
                .await
                .expect("no updater error");
            assert!(replied);
        }

        let token_requests = remote
            .requests()
            .await
            .iter()
            .filter(|request| request.path.contains("/api/v1/access_token"))
            .count();
        assert_eq!(token_requests, 1);
    }

    #[tokio::test]
    async fn message_from_url_reads_the_ledger_not_the_network() {
        let (ledger, _manager, _file) = sqlite_ledger().await;
        ledger
            .mark_processed(
                "abc123",
                "reddit",
                json!({
                    "suggestion_url": "https://reddit.com/r/test/comments/abc123/post/",
                    "content": "stored content",
                    "contributor": "userA",
                    "timestamp": 1_700_000_000,
                }),
            )
            .await
            .expect("mark processed");

        let remote = MockRemote::spawn(vec![]).await;
        let updater = updater(ledger, &remote);

        let record = updater
            .message_from_url("https://reddit.com/r/test/comments/abc123/post/")
            .await
            .expect("no updater error");

        assert!(record.success);
        assert_eq!(record.content.as_deref(), Some("stored content"));
        assert_eq!(remote.connection_count(), 0);
    }
}
