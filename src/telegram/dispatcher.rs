// Update dispatcher - routes each Telegram update to commands, the join
// check and the filter chain.

use super::update::Update;
use crate::core::admin::AdminRoster;
use crate::core::commands::CommandService;
use crate::core::filters::{FilterChain, JoinGuard};
use crate::core::locale::Locale;
use crate::core::moderation::{MessageKind, StateStore};
use crate::core::reputation::ReputationService;
use std::sync::Arc;
use tokio::sync::mpsc;

pub struct Dispatcher<S, R, Q>
where
    S: StateStore,
    R: AdminRoster,
    Q: ReputationService,
{
    chain: FilterChain<S, R>,
    commands: CommandService<S, R>,
    joins: JoinGuard<Q, S>,
    locale: Locale,
}

impl<S, R, Q> Dispatcher<S, R, Q>
where
    S: StateStore + 'static,
    R: AdminRoster + 'static,
    Q: ReputationService + 'static,
{
    pub fn new(
        chain: FilterChain<S, R>,
        commands: CommandService<S, R>,
        joins: JoinGuard<Q, S>,
        locale: Locale,
    ) -> Self {
        Self {
            chain,
            commands,
            joins,
            locale,
        }
    }

    pub async fn handle_update(&self, update: Update) {
        let update_id = update.update_id;
        let Some(event) = update.message.and_then(|m| m.into_event()) else {
            tracing::debug!(update_id, "Update carries no moderatable message, skipping");
            return;
        };

        if let MessageKind::MembersJoined(_) = event.kind {
            self.joins.handle(&event).await;
        }

        if self.commands.handle(&event, &self.locale).await {
            return;
        }

        let outcome = self.chain.apply(&event, &self.locale).await;
        tracing::debug!(update_id, ?outcome, "Update processed");
    }

    /// Consume raw updates until the channel closes. Each update runs on its own task.
    pub async fn run(self: Arc<Self>, mut updates: mpsc::Receiver<serde_json::Value>) {
        tracing::info!("Dispatcher started");
        while let Some(raw) = updates.recv().await {
            let update: Update = match serde_json::from_value(raw) {
                Ok(update) => update,
                Err(e) => {
                    tracing::warn!("Skipping malformed update: {}", e);
                    continue;
                }
            };

            let dispatcher = Arc::clone(&self);
            tokio::spawn(async move {
                dispatcher.handle_update(update).await;
            });
        }
        tracing::info!("Update channel closed, dispatcher stopping");
    }
}
