use std::collections::HashMap;
use std::sync::Arc;

use thiserror::Error;
use tracing::warn;

use crate::ledger::MentionLedger;
use crate::message::MessageRecord;

use super::{Platform, PlatformUpdater, UpdaterError};

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("no updater configured for platform {0}")]
    UnconfiguredPlatform(Platform),

    #[error(transparent)]
    Updater(#[from] UpdaterError),
}

/// Routes actions to the updater registered for a platform and records every
/// attempt in the action log. Callers invoke at most once per action; there
/// is no retry or queueing here.
pub struct UpdaterDispatcher {
    updaters: HashMap<Platform, Arc<dyn PlatformUpdater>>,
    ledger: MentionLedger,
}

impl UpdaterDispatcher {
    pub fn new(ledger: MentionLedger) -> Self {
        Self {
            updaters: HashMap::new(),
            ledger,
        }
    }

    pub fn register(&mut self, updater: Arc<dyn PlatformUpdater>) {
        self.updaters.insert(updater.platform(), updater);
    }

    pub fn platforms(&self) -> Vec<Platform> {
        Platform::ALL
            .into_iter()
            .filter(|platform| self.updaters.contains_key(platform))
            .collect()
    }

    fn updater_for(&self, platform: Platform) -> Result<&Arc<dyn PlatformUpdater>, DispatchError> {
        self.updaters
            .get(&platform)
            .ok_or(DispatchError::UnconfiguredPlatform(platform))
    }

    pub async fn add_reaction(
        &self,
        platform: Platform,
        url: &str,
        reaction_name: &str,
    ) -> Result<bool, DispatchError> {
        let updater = self.updater_for(platform)?;
        let result = updater.add_reaction_to_message(url, reaction_name).await;
        self.record(platform, "reacted", url, outcome_of_flag(&result))
            .await;
        Ok(result?)
    }

    pub async fn add_reply(
        &self,
        platform: Platform,
        url: &str,
        text: &str,
    ) -> Result<bool, DispatchError> {
        let updater = self.updater_for(platform)?;
        let result = updater.add_reply_to_message(url, text).await;
        self.record(platform, "replied", url, outcome_of_flag(&result))
            .await;
        Ok(result?)
    }

    pub async fn fetch_message(
        &self,
        platform: Platform,
        url: &str,
    ) -> Result<MessageRecord, DispatchError> {
        let updater = self.updater_for(platform)?;
        let result = updater.message_from_url(url).await;
        self.record(platform, "fetched", url, outcome_of_record(&result))
            .await;
        Ok(result?)
    }

    /// Audit only; a failed log write never fails the action itself.
    async fn record(&self, platform: Platform, action: &str, url: &str, outcome: &str) {
        let details = format!("{outcome}: {url}");
        if let Err(err) = self
            .ledger
            .log_action(platform.as_str(), action, &details)
            .await
        {
            warn!("failed to record {action} action for {platform}: {err}");
        }
    }
}

fn outcome_of_flag(result: &Result<bool, UpdaterError>) -> &'static str {
    match result {
        Ok(true) => "ok",
        Ok(false) => "failed",
        Err(_) => "error",
    }
}

fn outcome_of_record(result: &Result<MessageRecord, UpdaterError>) -> &'static str {
    match result {
        Ok(record) if record.success => "ok",
        Ok(_) => "failed",
        Err(_) => "error",
    }
}
