use super::filter_chain::SpamFilter;
use crate::core::moderation::{FilterVerdict, MessageEvent, ModerationState, StateStore};
use async_trait::async_trait;
use std::sync::Arc;

/// Flags content forwarded from a banned channel or group.
pub struct ForwardFilter<S: StateStore> {
    state: Arc<ModerationState<S>>,
}

impl<S: StateStore> ForwardFilter<S> {
    pub fn new(state: Arc<ModerationState<S>>) -> Self {
        Self { state }
    }
}

#[async_trait]
impl<S: StateStore> SpamFilter for ForwardFilter<S> {
    fn name(&self) -> &'static str {
        "ForwardOrigin"
    }

    async fn check(&self, event: &MessageEvent) -> FilterVerdict {
        let Some(origin_id) = event.forward_origin.as_ref().and_then(|o| o.community_id()) else {
            return FilterVerdict::NotSpam;
        };

        if self.state.is_origin_banned(origin_id).await {
            tracing::debug!(origin_id, "Message forwarded from banned origin");
            FilterVerdict::spam("forwarded from banned origin")
        } else {
            FilterVerdict::NotSpam
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::moderation::moderation_state::tests::MockStateStore;
    use crate::core::moderation::{test_event, ForwardOrigin, ModerationData};

    async fn filter() -> ForwardFilter<MockStateStore> {
        let state = ModerationState::load(MockStateStore::with(ModerationData {
            banned_channel_ids: [-100123456789].into(),
            ..Default::default()
        }))
        .await
        .unwrap();
        ForwardFilter::new(Arc::new(state))
    }

    #[tokio::test]
    async fn test_forward_from_banned_channel_is_spam() {
        let filter = filter().await;
        let mut event = test_event(-1, 1, 5, "promo");
        event.forward_origin = Some(ForwardOrigin::Channel {
            chat_id: -100123456789,
        });

        assert_eq!(
            filter.check(&event).await,
            FilterVerdict::spam("forwarded from banned origin")
        );
    }

    #[tokio::test]
    async fn test_public_id_form_matches_stored_origin() {
        let filter = filter().await;
        let mut event = test_event(-1, 1, 5, "promo");
        event.forward_origin = Some(ForwardOrigin::Chat { chat_id: 123456789 });

        assert!(filter.check(&event).await.is_spam());
    }

    #[tokio::test]
    async fn test_other_forwards_pass() {
        let filter = filter().await;
        let mut event = test_event(-1, 1, 5, "fwd");

        assert_eq!(filter.check(&event).await, FilterVerdict::NotSpam);

        event.forward_origin = Some(ForwardOrigin::User { user_id: 9 });
        assert_eq!(filter.check(&event).await, FilterVerdict::NotSpam);

        event.forward_origin = Some(ForwardOrigin::Channel { chat_id: -100555 });
        assert_eq!(filter.check(&event).await, FilterVerdict::NotSpam);
    }
}
