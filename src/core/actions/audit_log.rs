use super::moderation_actions::ModerationActions;
use crate::core::moderation::{ModerationState, StateStore};

pub const AUDIT_LOG_PREFIX: &str = "[#auditlog] ";

/// Post an audit entry to the configured audit chat, or to `source_chat_id`
/// when none is set. Delivery failures are logged and dropped.
pub async fn write_audit_log<S: StateStore, A: ModerationActions + ?Sized>(
    state: &ModerationState<S>,
    actions: &A,
    source_chat_id: i64,
    entry: &str,
) {
    let target = state.audit_log_target().await.unwrap_or(source_chat_id);
    let text = format!("{}{}", AUDIT_LOG_PREFIX, entry);

    if let Err(e) = actions.send_message(target, &text).await {
        tracing::error!(target_chat = target, "Failed to write audit log entry: {}", e);
    }
}
