// Filter chain - ordered spam filters with shared ignore, escalate and trust rules.
//
// The chain owns the spam-response protocol. Filters only judge; they never
// act on the platform directly (apart from the content filter's informational
// reaction, which runs after a full pass).

use crate::core::actions::audit_log::write_audit_log;
use crate::core::actions::{ActionScheduler, ModerationActions};
use crate::core::admin::{AdminCache, AdminRoster};
use crate::core::locale::{escape_markdown, render, Locale};
use crate::core::moderation::{
    ActionKind, FilterVerdict, MessageEvent, ModerationState, ResponsePolicy, StateStore,
};
use async_trait::async_trait;
use std::sync::Arc;

/// A single spam judge in the chain.
#[async_trait]
pub trait SpamFilter: Send + Sync {
    fn name(&self) -> &'static str;

    async fn check(&self, event: &MessageEvent) -> FilterVerdict;

    /// Called on every invoked filter once the whole chain passed.
    async fn on_chain_pass(&self, _event: &MessageEvent) {}

    /// Drop any per-message state kept since `check`. Always called.
    fn release(&self, _event: &MessageEvent) {}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    /// Membership notices and the like
    Unsupported,
    Trusted,
    NotModerated,
    Admin,
}

/// What `apply` did with an event. Informational only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChainOutcome {
    Ignored(IgnoreReason),
    Spam { filter: &'static str, reason: String },
    Passed,
}

pub struct FilterChain<S: StateStore, R: AdminRoster> {
    filters: Vec<Box<dyn SpamFilter>>,
    state: Arc<ModerationState<S>>,
    admins: Arc<AdminCache<R>>,
    actions: Arc<dyn ModerationActions>,
    scheduler: Arc<dyn ActionScheduler>,
    policy: ResponsePolicy,
}

impl<S: StateStore, R: AdminRoster> FilterChain<S, R> {
    /// Build a chain. `filters` are evaluated in the given order.
    pub fn new(
        filters: Vec<Box<dyn SpamFilter>>,
        state: Arc<ModerationState<S>>,
        admins: Arc<AdminCache<R>>,
        actions: Arc<dyn ModerationActions>,
        scheduler: Arc<dyn ActionScheduler>,
        policy: ResponsePolicy,
    ) -> Self {
        tracing::info!(
            filters = ?filters.iter().map(|f| f.name()).collect::<Vec<_>>(),
            "Filter chain assembled"
        );
        Self {
            filters,
            state,
            admins,
            actions,
            scheduler,
            policy,
        }
    }

    async fn ignore_reason(&self, event: &MessageEvent) -> Option<IgnoreReason> {
        if event.is_membership_notice() {
            return Some(IgnoreReason::Unsupported);
        }
        if self.state.is_trusted(event.sender.id).await {
            return Some(IgnoreReason::Trusted);
        }
        if !self.state.is_chat_moderated(event.chat_id).await {
            return Some(IgnoreReason::NotModerated);
        }
        // Last: this is the only check that may hit the network.
        if self.admins.is_admin(event.sender.id, event.chat_id).await {
            return Some(IgnoreReason::Admin);
        }
        None
    }

    /// Run one event through the chain. Never fails; every error is logged.
    pub async fn apply(&self, event: &MessageEvent, locale: &Locale) -> ChainOutcome {
        if let Some(reason) = self.ignore_reason(event).await {
            tracing::debug!(
                chat_id = event.chat_id,
                user_id = event.sender.id,
                ?reason,
                "Event not eligible for moderation"
            );
            return ChainOutcome::Ignored(reason);
        }

        let mut invoked = 0;
        let mut outcome = ChainOutcome::Passed;
        for filter in &self.filters {
            invoked += 1;
            if let FilterVerdict::Spam { reason } = filter.check(event).await {
                tracing::info!(
                    chat_id = event.chat_id,
                    user_id = event.sender.id,
                    message_id = event.message_id,
                    filter = filter.name(),
                    %reason,
                    "Spam detected"
                );
                outcome = ChainOutcome::Spam {
                    filter: filter.name(),
                    reason,
                };
                break;
            }
        }

        let invoked = &self.filters[..invoked];
        match &outcome {
            ChainOutcome::Spam { reason, .. } => {
                self.respond_to_spam(event, reason, locale).await;
            }
            _ => {
                for filter in invoked {
                    filter.on_chain_pass(event).await;
                }
                self.promote(event).await;
            }
        }

        for filter in invoked {
            filter.release(event);
        }
        outcome
    }

    async fn promote(&self, event: &MessageEvent) {
        match self.state.trust(event.sender.id).await {
            Ok(true) => tracing::info!(
                chat_id = event.chat_id,
                user_id = event.sender.id,
                "User passed all filters and is now trusted"
            ),
            Ok(false) => {}
            Err(e) => tracing::error!(user_id = event.sender.id, "Failed to trust user: {}", e),
        }
    }

    /// Delete, restrict, notify, then schedule notice cleanup and the ban.
    async fn respond_to_spam(&self, event: &MessageEvent, reason: &str, locale: &Locale) {
        let chat_id = event.chat_id;
        let user_id = event.sender.id;

        if let Err(e) = self.actions.delete_message(chat_id, event.message_id).await {
            tracing::warn!(chat_id, message_id = event.message_id, "Failed to delete spam message: {}", e);
        }

        if let Err(e) = self.actions.restrict_member(chat_id, user_id).await {
            tracing::error!(chat_id, user_id, "Failed to restrict spammer: {}", e);
        }

        let notice = render(
            &locale.spam_restrict_notice,
            &[
                ("user", event.sender.mention()),
                ("reason", escape_markdown(reason)),
                ("ban_delay_min", (self.policy.ban_delay.as_secs() / 60).to_string()),
            ],
        );
        match self.actions.send_message(chat_id, &notice).await {
            Ok(sent) => {
                self.scheduler.schedule(
                    self.policy.notice_delete_delay,
                    ActionKind::DeleteMessage {
                        chat_id: sent.chat_id,
                        message_id: sent.message_id,
                    },
                );
            }
            Err(e) => tracing::error!(chat_id, "Failed to send restriction notice: {}", e),
        }

        let ban = self
            .scheduler
            .schedule(self.policy.ban_delay, ActionKind::BanMember { chat_id, user_id });
        tracing::info!(chat_id, user_id, fire_at = %ban.fire_at(), "Ban scheduled");

        let chat = event
            .chat_title
            .as_deref()
            .map(escape_markdown)
            .unwrap_or_else(|| chat_id.to_string());
        let entry = render(
            &locale.audit_log_spam_restricted,
            &[
                ("user", event.sender.mention()),
                ("user_id", user_id.to_string()),
                ("chat", chat),
                ("reason", escape_markdown(reason)),
            ],
        );
        write_audit_log(&self.state, self.actions.as_ref(), chat_id, &entry).await;
    }
}

// ============================================================================
// TESTS
// ============================================================================
