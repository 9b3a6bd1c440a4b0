// This is the entry point of the Telegram antispam bot.
//
// **Architecture Overview:**
// - `core/` = Business logic (platform-agnostic)
// - `infra/` = Implementations of core traits (HTTP clients, JSON state)
// - `telegram/` = Telegram-specific adapters (update parsing, dispatch)
//
// This file's job is to:
// 1. Load configuration
// 2. Initialize services (dependency injection)
// 3. Start background refresh loops
// 4. Feed incoming updates to the dispatcher

// These attrs point each module declaration at a more descriptive root file
// so we don't end up with half a dozen mod.rs files that all look the same.
#[path = "core/core_layer.rs"]
mod core;
#[path = "infra/infra_layer.rs"]
mod infra;
#[path = "telegram/telegram_layer.rs"]
mod telegram;

mod config;

use crate::config::{AdminProvider, AppConfig};
use crate::core::actions::{ModerationActions, RetryingActions, TokioScheduler};
use crate::core::admin::{AdminCache, AdminRoster};
use crate::core::ai::AiProvider;
use crate::core::commands::CommandService;
use crate::core::filters::content_filter::DEFAULT_PROMPT;
use crate::core::filters::{
    ContentFilter, FilterChain, ForwardFilter, JoinGuard, ReputationFilter, SpamFilter,
};
use crate::core::locale::Locale;
use crate::core::moderation::ModerationState;
use crate::core::reputation::ReputationCache;
use crate::infra::admin::MembersRoster;
use crate::infra::ai::OpenAiClient;
use crate::infra::reputation::LolsClient;
use crate::infra::state::JsonStateStore;
use crate::infra::telegram::TelegramClient;
use crate::telegram::Dispatcher;
use anyhow::Context;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

/// Pending updates buffered between stdin and the dispatcher.
const UPDATE_QUEUE_SIZE: usize = 1024;

fn load_prompt(config: &AppConfig) -> String {
    match &config.prompt_file {
        Some(path) => std::fs::read_to_string(path).unwrap_or_else(|e| {
            tracing::warn!("Failed to read prompt file at {}: {}", path.display(), e);
            DEFAULT_PROMPT.to_string()
        }),
        None => DEFAULT_PROMPT.to_string(),
    }
}

fn admin_roster(config: &AppConfig) -> anyhow::Result<Box<dyn AdminRoster>> {
    match config.admin_provider {
        AdminProvider::Chat => {
            let client = TelegramClient::new(&config.telegram_api_url, &config.telegram_token)?;
            Ok(Box::new(client))
        }
        AdminProvider::Members => {
            let url = config.members_api_url.as_deref().unwrap_or_default();
            let key = config.members_api_key.as_deref().unwrap_or_default();
            Ok(Box::new(MembersRoster::new(url, key)?))
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging so we can see what's happening
    tracing_subscriber::fmt::init();

    // Load environment variables from .env file (if it exists)
    dotenv::dotenv().ok();

    let config = AppConfig::from_env()?;

    // ========================================================================
    // DEPENDENCY INJECTION
    // ========================================================================
    // This is the "composition root" where we wire everything together.

    let telegram = TelegramClient::new(&config.telegram_api_url, &config.telegram_token)?;
    let actions: Arc<dyn ModerationActions> = Arc::new(RetryingActions::new(telegram));
    let scheduler = Arc::new(TokioScheduler::new(Arc::clone(&actions)));

    let state = Arc::new(
        ModerationState::load(JsonStateStore::new(config.state_file()))
            .await
            .context("Failed to load moderation state")?,
    );

    let admins = Arc::new(AdminCache::new(admin_roster(&config)?, config.admin_cache_ttl));

    let reputation_client = LolsClient::new(
        config.reputation_api_url.clone(),
        config.reputation_lists_url.clone(),
        config.reputation_list_name.clone(),
    )?;
    let reputation = Arc::new(ReputationCache::new(reputation_client, config.reputation_max_age));
    if config.reputation_lists_url.is_some() {
        Arc::clone(&reputation).spawn_refresh(config.reputation_refresh);
    } else {
        tracing::info!("No reputation list configured, using point lookups only");
    }

    let ai_client: Option<Box<dyn AiProvider>> = match &config.openai {
        Some(openai) => Some(Box::new(OpenAiClient::new(
            openai.api_key.clone(),
            openai.base_url.clone(),
            openai.proxy_url.clone(),
        )?)),
        None => None,
    };
    let classifier = crate::core::filters::ClassifierConfig {
        prompt: load_prompt(&config),
        ..config.classifier.clone()
    };

    // Fixed order: reputation, forward origin, content.
    let filters: Vec<Box<dyn SpamFilter>> = vec![
        Box::new(ReputationFilter::new(Arc::clone(&reputation))),
        Box::new(ForwardFilter::new(Arc::clone(&state))),
        Box::new(ContentFilter::new(ai_client, classifier, Arc::clone(&actions))),
    ];
    let chain = FilterChain::new(
        filters,
        Arc::clone(&state),
        Arc::clone(&admins),
        Arc::clone(&actions),
        scheduler.clone(),
        config.policy.clone(),
    );
    let commands = CommandService::new(
        Arc::clone(&state),
        admins,
        Arc::clone(&actions),
        scheduler.clone(),
        config.policy.clone(),
    );
    let joins = JoinGuard::new(reputation, state, actions);
    let dispatcher = Arc::new(Dispatcher::new(chain, commands, joins, Locale::default()));

    // ========================================================================
    // UPDATE INTAKE
    // ========================================================================
    // The webhook relay writes one JSON update per line to our stdin.

    let (tx, rx) = mpsc::channel(UPDATE_QUEUE_SIZE);
    let dispatch = tokio::spawn(dispatcher.run(rx));

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    tracing::info!("Bot is ready, reading updates from stdin");
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<serde_json::Value>(&line) {
            Ok(update) => {
                if tx.send(update).await.is_err() {
                    tracing::error!("Dispatcher stopped, no longer accepting updates");
                    break;
                }
            }
            Err(e) => tracing::warn!("Ignoring invalid update line: {}", e),
        }
    }

    drop(tx);
    dispatch.await?;

    let pending = scheduler.pending();
    if pending > 0 {
        tracing::warn!(pending, "Shutting down with deferred actions that will not run");
    }
    tracing::info!("Update stream ended, shutting down");
    Ok(())
}
