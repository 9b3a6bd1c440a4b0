// Administrator commands - chat configuration and manual bans.
//
// Every command goes through `admin_only`. Commands from non-admins are not
// run and are handed back to the caller as ordinary messages.

use crate::core::actions::audit_log::write_audit_log;
use crate::core::actions::{ActionScheduler, ModerationActions};
use crate::core::admin::{AdminCache, AdminRoster};
use crate::core::locale::{escape_markdown, render, Locale};
use crate::core::moderation::{
    ActionKind, MessageEvent, ModerationState, ResponsePolicy, SentMessage, StateStore,
};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

/// How long the "user banned" confirmation stays visible.
const BAN_NOTICE_TTL: Duration = Duration::from_secs(20);
/// Max characters of the banned message quoted in the audit log.
const AUDIT_EXCERPT_LEN: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Moderate,
    Abandon,
    SetAuditLog,
    UnsetAuditLog,
    Ban(Option<i64>),
    BanCommunity(Option<i64>),
}

impl Command {
    /// Parse `/name[@bot] [arg]`. Unknown commands and plain text yield `None`.
    pub fn parse(text: &str) -> Option<Self> {
        let mut parts = text.split_whitespace();
        let head = parts.next()?.strip_prefix('/')?;
        let name = head.split('@').next().unwrap_or(head);
        let arg = parts.next().and_then(|a| a.parse::<i64>().ok());

        match name {
            "moderate" => Some(Command::Moderate),
            "abandon" => Some(Command::Abandon),
            "set_audit_log" => Some(Command::SetAuditLog),
            "unset_audit_log" => Some(Command::UnsetAuditLog),
            "ban" => Some(Command::Ban(arg)),
            "banc" => Some(Command::BanCommunity(arg)),
            _ => None,
        }
    }
}

/// Run `handler` only if `check` says the user is an admin.
/// Returns whether the handler ran.
pub async fn admin_only<C, H>(check: C, user_id: i64, handler: H) -> bool
where
    C: Future<Output = bool>,
    H: Future<Output = ()>,
{
    if !check.await {
        tracing::info!(user_id, "Unauthorized command attempt");
        return false;
    }
    handler.await;
    true
}

pub struct CommandService<S: StateStore, R: AdminRoster> {
    state: Arc<ModerationState<S>>,
    admins: Arc<AdminCache<R>>,
    actions: Arc<dyn ModerationActions>,
    scheduler: Arc<dyn ActionScheduler>,
    policy: ResponsePolicy,
}

impl<S: StateStore, R: AdminRoster> CommandService<S, R> {
    pub fn new(
        state: Arc<ModerationState<S>>,
        admins: Arc<AdminCache<R>>,
        actions: Arc<dyn ModerationActions>,
        scheduler: Arc<dyn ActionScheduler>,
        policy: ResponsePolicy,
    ) -> Self {
        Self {
            state,
            admins,
            actions,
            scheduler,
            policy,
        }
    }

    /// Run `event` as an admin command. Returns `false` when it is not a
    /// command or the sender may not run it.
    pub async fn handle(&self, event: &MessageEvent, locale: &Locale) -> bool {
        let Some(command) = event.text.as_deref().and_then(Command::parse) else {
            return false;
        };

        tracing::debug!(chat_id = event.chat_id, user_id = event.sender.id, ?command, "Command received");
        admin_only(
            self.admins.is_admin(event.sender.id, event.chat_id),
            event.sender.id,
            self.execute(command, event, locale),
        )
        .await
    }

    async fn execute(&self, command: Command, event: &MessageEvent, locale: &Locale) {
        match command {
            Command::Moderate => self.moderate(event, locale).await,
            Command::Abandon => self.abandon(event, locale).await,
            Command::SetAuditLog => self.set_audit_log(event, locale).await,
            Command::UnsetAuditLog => self.unset_audit_log(event, locale).await,
            Command::Ban(arg) => self.ban_user(event, arg, locale).await,
            Command::BanCommunity(arg) => self.ban_community(event, arg, locale).await,
        }
    }

    // ------------------------------------------------------------------
    // Chat configuration
    // ------------------------------------------------------------------

    async fn moderate(&self, event: &MessageEvent, locale: &Locale) {
        let chat_id = event.chat_id;
        let values = [("chat_id", chat_id.to_string())];

        match self.state.moderate_chat(chat_id).await {
            Ok(true) => {
                tracing::info!(chat_id, "Chat added to the moderated list");
                self.send(chat_id, &render(&locale.chat_added_to_moderate, &values)).await;
            }
            Ok(false) => {
                self.send(chat_id, &render(&locale.chat_already_moderated, &values)).await;
            }
            Err(e) => tracing::error!(chat_id, "Failed to enable moderation: {}", e),
        }
    }

    async fn abandon(&self, event: &MessageEvent, locale: &Locale) {
        let chat_id = event.chat_id;
        let values = [("chat_id", chat_id.to_string())];

        match self.state.unmoderate_chat(chat_id).await {
            Ok(true) => {
                tracing::info!(chat_id, "Chat removed from the moderated list");
                self.send(chat_id, &render(&locale.chat_removed_from_moderate, &values)).await;
            }
            Ok(false) => {
                self.send(chat_id, &render(&locale.chat_not_moderated, &values)).await;
            }
            Err(e) => tracing::error!(chat_id, "Failed to disable moderation: {}", e),
        }
    }

    async fn set_audit_log(&self, event: &MessageEvent, locale: &Locale) {
        let chat_id = event.chat_id;
        let previous = match self.state.set_audit_log_target(chat_id).await {
            Ok(previous) => previous,
            Err(e) => {
                tracing::error!(chat_id, "Failed to set audit log chat: {}", e);
                return;
            }
        };
        tracing::info!(chat_id, user_id = event.sender.id, "Audit log chat set");

        let new_chat_name = chat_name(event);
        match previous {
            Some(old_chat_id) => {
                let old_chat_name = match self.actions.get_chat_title(old_chat_id).await {
                    Ok(title) => escape_markdown(&title),
                    Err(e) => {
                        tracing::warn!(old_chat_id, "Failed to resolve previous audit log chat: {}", e);
                        "Unknown".to_string()
                    }
                };
                let text = render(
                    &locale.audit_log_chat_updated,
                    &[
                        ("old_chat_name", old_chat_name),
                        ("old_chat_id", old_chat_id.to_string()),
                        ("new_chat_name", new_chat_name),
                        ("new_chat_id", chat_id.to_string()),
                        ("user", event.sender.mention()),
                    ],
                );
                for target in distinct(chat_id, old_chat_id) {
                    self.send(target, &text).await;
                }
            }
            None => {
                let text = render(
                    &locale.audit_log_chat_set,
                    &[
                        ("chat_id", chat_id.to_string()),
                        ("chat_name", new_chat_name),
                        ("user", event.sender.mention()),
                    ],
                );
                self.send(chat_id, &text).await;
            }
        }
    }

    async fn unset_audit_log(&self, event: &MessageEvent, locale: &Locale) {
        let chat_id = event.chat_id;
        let previous = match self.state.clear_audit_log_target().await {
            Ok(previous) => previous,
            Err(e) => {
                tracing::error!(chat_id, "Failed to clear audit log chat: {}", e);
                return;
            }
        };

        let Some(old_chat_id) = previous else {
            self.send_temporary(chat_id, &locale.audit_log_chat_not_found, self.policy.notice_delete_delay)
                .await;
            return;
        };

        tracing::info!(old_chat_id, user_id = event.sender.id, "Audit log chat unset");
        let text = render(&locale.audit_log_chat_removed, &[("user", event.sender.mention())]);
        for target in distinct(old_chat_id, chat_id) {
            self.send(target, &text).await;
        }
    }

    // ------------------------------------------------------------------
    // Manual moderation
    // ------------------------------------------------------------------

    async fn ban_user(&self, event: &MessageEvent, arg: Option<i64>, locale: &Locale) {
        let chat_id = event.chat_id;
        let reply = event.reply_to.as_deref();

        let Some(user_id) = reply.map(|r| r.sender.id).or(arg) else {
            self.send(chat_id, &locale.ban_user_not_found).await;
            return;
        };
        if self.admins.is_admin(user_id, chat_id).await {
            self.send(chat_id, &locale.ban_admin_refused).await;
            return;
        }

        if let Err(e) = self.actions.ban_member(chat_id, user_id).await {
            tracing::warn!(chat_id, user_id, "Manual ban failed: {}", e);
            let text = render(
                &locale.ban_failed,
                &[("user_id", user_id.to_string()), ("error", escape_markdown(&e.to_string()))],
            );
            self.send(chat_id, &text).await;
            return;
        }
        tracing::info!(chat_id, user_id, banned_by = event.sender.id, "User banned manually");

        if let Some(reply) = reply {
            if let Err(e) = self.actions.delete_message(chat_id, reply.message_id).await {
                tracing::warn!(chat_id, message_id = reply.message_id, "Failed to delete banned user's message: {}", e);
            }
        }
        self.send_temporary(
            chat_id,
            &render(&locale.ban_success, &[("user_id", user_id.to_string())]),
            BAN_NOTICE_TTL,
        )
        .await;

        let entry = match reply {
            Some(reply) => render(
                &locale.audit_log_user_banned_by_reply,
                &[
                    ("banned_user", reply.sender.mention()),
                    ("banned_by", event.sender.mention()),
                    ("message", excerpt(reply.content().unwrap_or_default())),
                    ("chat", chat_name(event)),
                ],
            ),
            None => render(
                &locale.audit_log_user_banned_by_id,
                &[
                    ("banned_id", user_id.to_string()),
                    ("banned_by", event.sender.mention()),
                    ("chat", chat_name(event)),
                ],
            ),
        };
        write_audit_log(&self.state, self.actions.as_ref(), chat_id, &entry).await;
    }

    async fn ban_community(&self, event: &MessageEvent, arg: Option<i64>, locale: &Locale) {
        let chat_id = event.chat_id;
        let from_reply = event
            .reply_to
            .as_deref()
            .and_then(|r| r.forward_origin.as_ref())
            .and_then(|o| o.community_id());

        let Some(community_id) = from_reply.or(arg) else {
            self.send(chat_id, &locale.ban_community_not_found).await;
            write_audit_log(&self.state, self.actions.as_ref(), chat_id, &locale.audit_log_community_not_found)
                .await;
            return;
        };

        if self.state.is_origin_banned(community_id).await {
            let text = render(
                &locale.community_already_banned,
                &[("community_id", community_id.to_string())],
            );
            self.send(chat_id, &text).await;
            return;
        }

        let community_id = match self.state.ban_origin(community_id).await {
            Ok((normalized, _)) => normalized,
            Err(e) => {
                tracing::error!(community_id, "Failed to ban community: {}", e);
                let text = render(
                    &locale.ban_community_failed,
                    &[
                        ("community_id", community_id.to_string()),
                        ("error", escape_markdown(&e.to_string())),
                    ],
                );
                self.send(chat_id, &text).await;
                return;
            }
        };
        tracing::info!(community_id, banned_by = event.sender.id, "Community banned");

        self.send_temporary(
            chat_id,
            &render(&locale.ban_community_success, &[("community_id", community_id.to_string())]),
            self.policy.notice_delete_delay,
        )
        .await;
        self.scheduler.schedule(
            self.policy.notice_delete_delay,
            ActionKind::DeleteMessage {
                chat_id,
                message_id: event.message_id,
            },
        );

        let entry = render(
            &locale.audit_log_community_banned_by_id,
            &[
                ("community_id", community_id.to_string()),
                ("banned_by", event.sender.mention()),
                ("chat", chat_name(event)),
            ],
        );
        write_audit_log(&self.state, self.actions.as_ref(), chat_id, &entry).await;
    }

    // ------------------------------------------------------------------
    // Helpers
    // ------------------------------------------------------------------

    async fn send(&self, chat_id: i64, text: &str) -> Option<SentMessage> {
        match self.actions.send_message(chat_id, text).await {
            Ok(sent) => Some(sent),
            Err(e) => {
                tracing::error!(chat_id, "Failed to send reply: {}", e);
                None
            }
        }
    }

    /// Send a notice that deletes itself after `ttl`.
    async fn send_temporary(&self, chat_id: i64, text: &str, ttl: Duration) {
        if let Some(sent) = self.send(chat_id, text).await {
            self.scheduler.schedule(
                ttl,
                ActionKind::DeleteMessage {
                    chat_id: sent.chat_id,
                    message_id: sent.message_id,
                },
            );
        }
    }
}

fn chat_name(event: &MessageEvent) -> String {
    event
        .chat_title
        .as_deref()
        .map(escape_markdown)
        .unwrap_or_else(|| "Unknown".to_string())
}

fn excerpt(text: &str) -> String {
    let cut: String = text.chars().take(AUDIT_EXCERPT_LEN).collect();
    escape_markdown(&cut)
}

/// `a`, then `b` unless it is the same chat.
fn distinct(a: i64, b: i64) -> Vec<i64> {
    if a == b {
        vec![a]
    } else {
        vec![a, b]
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::actions::action_scheduler::tests::RecordingScheduler;
    use crate::core::actions::moderation_actions::tests::{Call, MockActions};
    use crate::core::actions::ActionError;
    use crate::core::admin::tests::MockRoster;
    use crate::core::admin::DEFAULT_ADMIN_TTL;
    use crate::core::moderation::moderation_state::tests::MockStateStore;
    use crate::core::moderation::{test_event, ForwardOrigin, ModerationData};

    const CHAT: i64 = -1001;
    const ADMIN: i64 = 1;

    struct Harness {
        service: CommandService<MockStateStore, MockRoster>,
        state: Arc<ModerationState<MockStateStore>>,
        actions: Arc<MockActions>,
        scheduler: Arc<RecordingScheduler>,
    }

    async fn harness(data: ModerationData, actions: MockActions) -> Harness {
        let state = Arc::new(ModerationState::load(MockStateStore::with(data)).await.unwrap());
        let admins = Arc::new(AdminCache::new(MockRoster::with_admins(&[ADMIN, 2]), DEFAULT_ADMIN_TTL));
        let actions = Arc::new(actions);
        let scheduler = Arc::new(RecordingScheduler::default());
        let service = CommandService::new(
            Arc::clone(&state),
            admins,
            actions.clone(),
            scheduler.clone(),
            ResponsePolicy::default(),
        );
        Harness {
            service,
            state,
            actions,
            scheduler,
        }
    }

    fn sent_texts(actions: &MockActions) -> Vec<(i64, String)> {
        actions
            .calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Send(chat, text) => Some((chat, text)),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_parse_commands() {
        assert_eq!(Command::parse("/moderate"), Some(Command::Moderate));
        assert_eq!(Command::parse("/abandon@AntispamBot"), Some(Command::Abandon));
        assert_eq!(Command::parse("/ban 12345"), Some(Command::Ban(Some(12345))));
        assert_eq!(Command::parse("/ban"), Some(Command::Ban(None)));
        assert_eq!(Command::parse("/ban someone"), Some(Command::Ban(None)));
        assert_eq!(
            Command::parse("/banc -100123"),
            Some(Command::BanCommunity(Some(-100123)))
        );
        assert_eq!(Command::parse("/help"), None);
        assert_eq!(Command::parse("moderate"), None);
        assert_eq!(Command::parse(""), None);
    }

    #[tokio::test]
    async fn test_admin_only_skips_handler_for_non_admin() {
        let ran = std::sync::atomic::AtomicBool::new(false);
        let handler = async {
            ran.store(true, std::sync::atomic::Ordering::SeqCst);
        };

        assert!(!admin_only(async { false }, 5, handler).await);
        assert!(!ran.load(std::sync::atomic::Ordering::SeqCst));

        assert!(admin_only(async { true }, 5, async {}).await);
    }

    #[tokio::test]
    async fn test_non_admin_command_is_not_run() {
        let h = harness(ModerationData::default(), MockActions::default()).await;

        assert!(!h.service.handle(&test_event(CHAT, 1, 50, "/moderate"), &Locale::default()).await);

        assert!(!h.state.is_chat_moderated(CHAT).await);
        assert!(h.actions.calls().is_empty());
    }

    #[tokio::test]
    async fn test_plain_text_is_not_a_command() {
        let h = harness(ModerationData::default(), MockActions::default()).await;
        assert!(!h.service.handle(&test_event(CHAT, 1, ADMIN, "hello"), &Locale::default()).await);
    }

    #[tokio::test]
    async fn test_moderate_and_abandon() {
        let h = harness(ModerationData::default(), MockActions::default()).await;
        let locale = Locale::default();

        h.service.handle(&test_event(CHAT, 1, ADMIN, "/moderate"), &locale).await;
        assert!(h.state.is_chat_moderated(CHAT).await);

        h.service.handle(&test_event(CHAT, 2, ADMIN, "/moderate"), &locale).await;
        h.service.handle(&test_event(CHAT, 3, ADMIN, "/abandon"), &locale).await;
        assert!(!h.state.is_chat_moderated(CHAT).await);
        h.service.handle(&test_event(CHAT, 4, ADMIN, "/abandon"), &locale).await;

        let chat = CHAT.to_string();
        assert_eq!(
            sent_texts(&h.actions),
            vec![
                (CHAT, render(&locale.chat_added_to_moderate, &[("chat_id", chat.clone())])),
                (CHAT, render(&locale.chat_already_moderated, &[("chat_id", chat.clone())])),
                (CHAT, render(&locale.chat_removed_from_moderate, &[("chat_id", chat.clone())])),
                (CHAT, render(&locale.chat_not_moderated, &[("chat_id", chat)])),
            ]
        );
    }

    #[tokio::test]
    async fn test_set_audit_log_notifies_previous_chat() {
        let h = harness(
            ModerationData {
                audit_log_chat_id: Some(-77),
                ..Default::default()
            },
            MockActions::default(),
        )
        .await;

        h.service.handle(&test_event(CHAT, 1, ADMIN, "/set_audit_log"), &Locale::default()).await;

        assert_eq!(h.state.audit_log_target().await, Some(CHAT));
        let calls = h.actions.calls();
        assert_eq!(calls[0], Call::ChatTitle(-77));
        let targets: Vec<i64> = sent_texts(&h.actions).into_iter().map(|(c, _)| c).collect();
        assert_eq!(targets, vec![CHAT, -77]);
        assert!(sent_texts(&h.actions)[0].1.contains("Chat -77"));
    }

    #[tokio::test]
    async fn test_unset_audit_log_without_target_sends_temporary_notice() {
        let h = harness(ModerationData::default(), MockActions::default()).await;
        let locale = Locale::default();

        h.service.handle(&test_event(CHAT, 1, ADMIN, "/unset_audit_log"), &locale).await;

        assert_eq!(sent_texts(&h.actions), vec![(CHAT, locale.audit_log_chat_not_found.clone())]);
        let scheduled = h.scheduler.scheduled();
        assert_eq!(scheduled.len(), 1);
        assert_eq!(scheduled[0].delay, Duration::from_secs(30));
    }

    #[tokio::test]
    async fn test_unset_audit_log_notifies_both_chats() {
        let h = harness(
            ModerationData {
                audit_log_chat_id: Some(-77),
                ..Default::default()
            },
            MockActions::default(),
        )
        .await;

        h.service.handle(&test_event(CHAT, 1, ADMIN, "/unset_audit_log"), &Locale::default()).await;

        assert_eq!(h.state.audit_log_target().await, None);
        let targets: Vec<i64> = sent_texts(&h.actions).into_iter().map(|(c, _)| c).collect();
        assert_eq!(targets, vec![-77, CHAT]);
    }

    #[tokio::test]
    async fn test_ban_by_reply() {
        let h = harness(ModerationData::default(), MockActions::default()).await;
        let mut event = test_event(CHAT, 5, ADMIN, "/ban");
        event.reply_to = Some(Box::new(test_event(CHAT, 4, 99, &"x".repeat(150))));

        h.service.handle(&event, &Locale::default()).await;

        let calls = h.actions.calls();
        assert_eq!(calls[0], Call::Ban(CHAT, 99));
        assert_eq!(calls[1], Call::Delete(CHAT, 4));
        let texts = sent_texts(&h.actions);
        assert_eq!(texts[0], (CHAT, "User `99` has been banned.".to_string()));
        assert!(texts[1].1.starts_with("[#auditlog] "));
        assert!(texts[1].1.contains(&"x".repeat(100)));
        assert!(!texts[1].1.contains(&"x".repeat(101)));

        let scheduled = h.scheduler.scheduled();
        assert_eq!(scheduled.len(), 1);
        assert_eq!(scheduled[0].delay, BAN_NOTICE_TTL);
    }

    #[tokio::test]
    async fn test_ban_audit_entry_escapes_markdown() {
        let h = harness(ModerationData::default(), MockActions::default()).await;
        let mut event = test_event(CHAT, 5, ADMIN, "/ban");
        event.chat_title = Some("dev_chat".to_string());
        event.reply_to = Some(Box::new(test_event(CHAT, 4, 99, "buy_now *cheap*")));

        h.service.handle(&event, &Locale::default()).await;

        let audit = &sent_texts(&h.actions)[1].1;
        assert!(audit.contains("buy\\_now \\*cheap\\*"));
        assert!(audit.contains("dev\\_chat"));
    }

    #[tokio::test]
    async fn test_ban_by_id() {
        let h = harness(ModerationData::default(), MockActions::default()).await;

        h.service.handle(&test_event(CHAT, 5, ADMIN, "/ban 4242"), &Locale::default()).await;

        assert_eq!(h.actions.calls()[0], Call::Ban(CHAT, 4242));
        assert!(sent_texts(&h.actions)[1].1.contains("`4242`"));
    }

    #[tokio::test]
    async fn test_ban_refuses_admins_and_missing_target() {
        let h = harness(ModerationData::default(), MockActions::default()).await;
        let locale = Locale::default();

        h.service.handle(&test_event(CHAT, 5, ADMIN, "/ban 2"), &locale).await;
        h.service.handle(&test_event(CHAT, 6, ADMIN, "/ban"), &locale).await;

        assert_eq!(
            h.actions.calls(),
            vec![
                Call::Send(CHAT, locale.ban_admin_refused.clone()),
                Call::Send(CHAT, locale.ban_user_not_found.clone()),
            ]
        );
    }

    #[tokio::test]
    async fn test_ban_failure_is_reported() {
        let h = harness(
            ModerationData::default(),
            MockActions {
                fail_ban: Some(ActionError::Rejected("not enough rights".to_string())),
                ..Default::default()
            },
        )
        .await;

        h.service.handle(&test_event(CHAT, 5, ADMIN, "/ban 4242"), &Locale::default()).await;

        let texts = sent_texts(&h.actions);
        assert_eq!(texts.len(), 1);
        assert!(texts[0].1.contains("not enough rights"));
        assert!(h.scheduler.scheduled().is_empty());
    }

    #[tokio::test]
    async fn test_ban_community_from_forwarded_reply() {
        let h = harness(ModerationData::default(), MockActions::default()).await;
        let mut forwarded = test_event(CHAT, 4, 99, "promo");
        forwarded.forward_origin = Some(ForwardOrigin::Channel { chat_id: 123456789 });
        let mut event = test_event(CHAT, 5, ADMIN, "/banc");
        event.reply_to = Some(Box::new(forwarded));

        h.service.handle(&event, &Locale::default()).await;

        assert!(h.state.is_origin_banned(-100123456789).await);
        let texts = sent_texts(&h.actions);
        assert!(texts[0].1.contains("-100123456789"));
        assert!(texts[1].1.starts_with("[#auditlog] "));

        let kinds: Vec<ActionKind> = h.scheduler.scheduled().into_iter().map(|a| a.kind).collect();
        assert!(kinds.contains(&ActionKind::DeleteMessage {
            chat_id: CHAT,
            message_id: 5
        }));
    }

    #[tokio::test]
    async fn test_ban_community_already_banned() {
        let h = harness(
            ModerationData {
                banned_channel_ids: [-100123456789].into(),
                ..Default::default()
            },
            MockActions::default(),
        )
        .await;
        let locale = Locale::default();

        h.service.handle(&test_event(CHAT, 5, ADMIN, "/banc 123456789"), &locale).await;

        assert_eq!(
            sent_texts(&h.actions),
            vec![(
                CHAT,
                render(&locale.community_already_banned, &[("community_id", "123456789".to_string())])
            )]
        );
        assert_eq!(h.state.store().saves.load(std::sync::atomic::Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_ban_community_without_target() {
        let h = harness(ModerationData::default(), MockActions::default()).await;
        let locale = Locale::default();

        h.service.handle(&test_event(CHAT, 5, ADMIN, "/banc"), &locale).await;

        assert_eq!(
            sent_texts(&h.actions),
            vec![
                (CHAT, locale.ban_community_not_found.clone()),
                (CHAT, format!("[#auditlog] {}", locale.audit_log_community_not_found)),
            ]
        );
    }
}
