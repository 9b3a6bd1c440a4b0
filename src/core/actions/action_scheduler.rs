// Deferred one-shot actions (notice cleanup, delayed bans).
//
// Timers live only in memory: pending actions are lost on restart.

use super::moderation_actions::ModerationActions;
use crate::core::moderation::{ActionKind, ScheduledAction};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

pub trait ActionScheduler: Send + Sync {
    /// Hand an action over to the timer. Must not block the caller.
    fn submit(&self, action: ScheduledAction);

    /// Schedule `kind` to fire once after `delay`.
    fn schedule(&self, delay: Duration, kind: ActionKind) -> ScheduledAction {
        let action = ScheduledAction::new(kind, delay);
        self.submit(action.clone());
        action
    }
}

/// Runs a deferred action against the platform. Failures are logged and dropped.
pub async fn execute_action<A: ModerationActions + ?Sized>(actions: &A, kind: ActionKind) {
    let result = match kind {
        ActionKind::DeleteMessage {
            chat_id,
            message_id,
        } => actions.delete_message(chat_id, message_id).await,
        ActionKind::BanMember { chat_id, user_id } => actions.ban_member(chat_id, user_id).await,
    };

    match result {
        Ok(()) => tracing::info!("Deferred action done: {}", kind),
        Err(e) => tracing::warn!("Deferred action failed ({}): {}", kind, e),
    }
}

/// Scheduler backed by detached tokio tasks.
pub struct TokioScheduler {
    actions: Arc<dyn ModerationActions>,
    pending: Arc<AtomicUsize>,
}

impl TokioScheduler {
    pub fn new(actions: Arc<dyn ModerationActions>) -> Self {
        Self {
            actions,
            pending: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Number of actions that have not fired yet.
    pub fn pending(&self) -> usize {
        self.pending.load(Ordering::SeqCst)
    }
}

impl ActionScheduler for TokioScheduler {
    fn submit(&self, action: ScheduledAction) {
        let actions = Arc::clone(&self.actions);
        let pending = Arc::clone(&self.pending);
        pending.fetch_add(1, Ordering::SeqCst);

        tracing::debug!(
            "Scheduled {} at {} ({}s)",
            action.kind,
            action.fire_at(),
            action.delay.as_secs()
        );

        tokio::spawn(async move {
            tokio::time::sleep(action.delay).await;
            execute_action(actions.as_ref(), action.kind).await;
            pending.fetch_sub(1, Ordering::SeqCst);
        });
    }
}

// ============================================================================
// TESTS
// ============================================================================
