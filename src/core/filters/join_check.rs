// Join-time reputation check - bans known spammers as soon as they enter.

use crate::core::actions::ModerationActions;
use crate::core::moderation::{MessageEvent, MessageKind, ModerationState, StateStore};
use crate::core::reputation::{ReputationCache, ReputationService};
use std::sync::Arc;

pub struct JoinGuard<R: ReputationService, S: StateStore> {
    reputation: Arc<ReputationCache<R>>,
    state: Arc<ModerationState<S>>,
    actions: Arc<dyn ModerationActions>,
}

impl<R: ReputationService, S: StateStore> JoinGuard<R, S> {
    pub fn new(
        reputation: Arc<ReputationCache<R>>,
        state: Arc<ModerationState<S>>,
        actions: Arc<dyn ModerationActions>,
    ) -> Self {
        Self {
            reputation,
            state,
            actions,
        }
    }

    /// Check every newly joined member. Returns how many were banned.
    pub async fn handle(&self, event: &MessageEvent) -> usize {
        let MessageKind::MembersJoined(members) = &event.kind else {
            return 0;
        };
        if !self.state.is_chat_moderated(event.chat_id).await {
            return 0;
        }

        let mut banned = 0;
        for member in members {
            if !self.reputation.is_flagged(member.id).await {
                continue;
            }
            match self.actions.ban_member(event.chat_id, member.id).await {
                Ok(()) => {
                    tracing::info!(chat_id = event.chat_id, user_id = member.id, "Banned flagged user on join");
                    banned += 1;
                }
                Err(e) => tracing::error!(
                    chat_id = event.chat_id,
                    user_id = member.id,
                    "Failed to ban flagged user on join: {}",
                    e
                ),
            }
        }
        banned
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::actions::moderation_actions::tests::{Call, MockActions};
    use crate::core::moderation::moderation_state::tests::MockStateStore;
    use crate::core::moderation::{test_event, ChatUser, ModerationData};
    use crate::core::reputation::tests::MockReputationService;
    use std::collections::HashSet;

    fn member(id: i64) -> ChatUser {
        ChatUser {
            id,
            first_name: format!("m{}", id),
            username: None,
        }
    }

    async fn guard(moderated: bool) -> (JoinGuard<MockReputationService, MockStateStore>, Arc<MockActions>) {
        let reputation = ReputationCache::new(
            MockReputationService {
                banned: HashSet::from([66]),
                ..Default::default()
            },
            chrono::Duration::hours(72),
        );
        let data = ModerationData {
            moderated_chat_ids: if moderated { [-5].into() } else { Default::default() },
            ..Default::default()
        };
        let state = ModerationState::load(MockStateStore::with(data)).await.unwrap();
        let actions = Arc::new(MockActions::default());
        (
            JoinGuard::new(Arc::new(reputation), Arc::new(state), actions.clone()),
            actions,
        )
    }

    #[tokio::test]
    async fn test_flagged_members_are_banned() {
        let (guard, actions) = guard(true).await;
        let mut event = test_event(-5, 1, 65, "");
        event.kind = MessageKind::MembersJoined(vec![member(65), member(66)]);

        assert_eq!(guard.handle(&event).await, 1);
        assert_eq!(actions.calls(), vec![Call::Ban(-5, 66)]);
    }

    #[tokio::test]
    async fn test_unmoderated_chat_is_skipped() {
        let (guard, actions) = guard(false).await;
        let mut event = test_event(-5, 1, 66, "");
        event.kind = MessageKind::MembersJoined(vec![member(66)]);

        assert_eq!(guard.handle(&event).await, 0);
        assert!(actions.calls().is_empty());
    }

    #[tokio::test]
    async fn test_regular_message_is_ignored() {
        let (guard, actions) = guard(true).await;

        assert_eq!(guard.handle(&test_event(-5, 1, 66, "hi")).await, 0);
        assert!(actions.calls().is_empty());
    }
}
