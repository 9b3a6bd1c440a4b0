use super::filter_chain::SpamFilter;
use crate::core::moderation::{FilterVerdict, MessageEvent};
use crate::core::reputation::{ReputationCache, ReputationService};
use async_trait::async_trait;
use std::sync::Arc;

/// Flags senders known to the reputation service.
pub struct ReputationFilter<S: ReputationService> {
    cache: Arc<ReputationCache<S>>,
}

impl<S: ReputationService> ReputationFilter<S> {
    pub fn new(cache: Arc<ReputationCache<S>>) -> Self {
        Self { cache }
    }
}

#[async_trait]
impl<S: ReputationService> SpamFilter for ReputationFilter<S> {
    fn name(&self) -> &'static str {
        "Reputation"
    }

    async fn check(&self, event: &MessageEvent) -> FilterVerdict {
        if self.cache.is_flagged(event.sender.id).await {
            FilterVerdict::spam("sender is a known spammer")
        } else {
            FilterVerdict::NotSpam
        }
    }
}
