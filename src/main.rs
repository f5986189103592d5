#![forbid(unsafe_code)]
#![allow(dead_code)]

use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tracing::info;

mod cli;
mod config;
mod db;
mod ledger;
mod message;
mod parsers;
mod updaters;
mod utils;

use cli::{Cli, Command};
use config::Config;
use ledger::MentionLedger;
use updaters::{
    DiscordUpdater, RedditUpdater, TelegramUpdater, TwitterUpdater, UpdaterDispatcher,
};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = Arc::new(Config::load_from_file(&cli.config)?);
    utils::logging::init_tracing(&config.logging);
    info!("rewards updater starting up");

    let db_manager = Arc::new(db::DatabaseManager::new(&config.database).await?);
    db_manager.migrate().await?;

    let ledger = MentionLedger::new(&db_manager);
    let dispatcher = build_dispatcher(&config, &ledger);

    match cli.command {
        Command::Migrate => {
            info!("database migrated");
        }
        Command::React {
            platform,
            url,
            reaction,
        } => {
            let added = dispatcher.add_reaction(platform, &url, &reaction).await?;
            println!("{added}");
        }
        Command::Reply {
            platform,
            url,
            text,
        } => {
            let replied = dispatcher.add_reply(platform, &url, &text).await?;
            println!("{replied}");
        }
        Command::Fetch { platform, url } => {
            let record = dispatcher.fetch_message(platform, &url).await?;
            println!("{}", serde_json::to_string_pretty(&record)?);
        }
        Command::Log { limit } => {
            for entry in ledger.recent_actions(limit).await? {
                println!(
                    "{} {} {} {}",
                    entry.timestamp.to_rfc3339(),
                    entry.platform,
                    entry.action,
                    entry.details
                );
            }
        }
    }

    Ok(())
}

fn build_dispatcher(config: &Config, ledger: &MentionLedger) -> UpdaterDispatcher {
    let mut dispatcher = UpdaterDispatcher::new(ledger.clone());

    if let Some(discord) = &config.discord {
        dispatcher.register(Arc::new(DiscordUpdater::new(discord.clone())));
    }
    if let Some(reddit) = &config.reddit {
        dispatcher.register(Arc::new(RedditUpdater::new(reddit.clone(), ledger.clone())));
    }
    if let Some(telegram) = &config.telegram {
        dispatcher.register(Arc::new(TelegramUpdater::new(
            telegram.clone(),
            ledger.clone(),
        )));
    }
    if let Some(twitter) = &config.twitter {
        dispatcher.register(Arc::new(TwitterUpdater::new(
            twitter.clone(),
            ledger.clone(),
        )));
    }

    info!(
        "dispatcher ready for platforms: {:?}",
        dispatcher.platforms()
    );
    dispatcher
}
