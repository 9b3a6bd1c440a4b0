// Admin cache - TTL-gated view of each community's administrator roster.
//
// A failed refresh falls back to the last roster we saw and waits
// `FAILED_REFRESH_BACKOFF` before asking again. With no roster at all the
// user is treated as a regular member.

use async_trait::async_trait;
use dashmap::DashMap;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::Mutex;
use tokio::time::Instant;

pub const DEFAULT_ADMIN_TTL: Duration = Duration::from_secs(60);
/// How long a stale roster is served after a failed refresh.
const FAILED_REFRESH_BACKOFF: Duration = Duration::from_secs(10);

#[derive(Debug, Error)]
pub enum RosterError {
    #[error("Roster request failed: {0}")]
    Request(String),

    #[error("Roster service returned {0}")]
    Status(u16),

    #[error("Malformed roster response: {0}")]
    Malformed(String),
}

/// External source of administrator ids for a community.
#[async_trait]
pub trait AdminRoster: Send + Sync {
    async fn fetch_admins(&self, chat_id: i64) -> Result<HashSet<i64>, RosterError>;
}

#[async_trait]
impl AdminRoster for Box<dyn AdminRoster> {
    async fn fetch_admins(&self, chat_id: i64) -> Result<HashSet<i64>, RosterError> {
        (**self).fetch_admins(chat_id).await
    }
}

#[derive(Debug, Clone)]
struct RosterEntry {
    admins: HashSet<i64>,
    expires_at: Instant,
}

pub struct AdminCache<R: AdminRoster> {
    roster: R,
    ttl: Duration,
    entries: DashMap<i64, RosterEntry>,
    // One lock per chat: an expiry triggers one fetch for that chat only.
    refresh_locks: DashMap<i64, Arc<Mutex<()>>>,
}

impl<R: AdminRoster> AdminCache<R> {
    pub fn new(roster: R, ttl: Duration) -> Self {
        Self {
            roster,
            ttl,
            entries: DashMap::new(),
            refresh_locks: DashMap::new(),
        }
    }

    #[cfg(test)]
    pub(crate) fn roster(&self) -> &R {
        &self.roster
    }

    fn fresh_entry(&self, chat_id: i64) -> Option<RosterEntry> {
        self.entries
            .get(&chat_id)
            .filter(|e| Instant::now() < e.expires_at)
            .map(|e| e.value().clone())
    }

    pub async fn is_admin(&self, user_id: i64, chat_id: i64) -> bool {
        if let Some(entry) = self.fresh_entry(chat_id) {
            return entry.admins.contains(&user_id);
        }

        let lock = self.refresh_locks.entry(chat_id).or_default().value().clone();
        let _guard = lock.lock().await;

        // Someone else may have refreshed while we waited.
        if let Some(entry) = self.fresh_entry(chat_id) {
            return entry.admins.contains(&user_id);
        }

        tracing::debug!(chat_id, "Admin roster missing or outdated, refreshing");
        match self.roster.fetch_admins(chat_id).await {
            Ok(admins) => {
                tracing::debug!(chat_id, count = admins.len(), "Admin roster refreshed");
                let is_admin = admins.contains(&user_id);
                self.entries.insert(
                    chat_id,
                    RosterEntry {
                        admins,
                        expires_at: Instant::now() + self.ttl,
                    },
                );
                is_admin
            }
            Err(e) => match self.entries.get_mut(&chat_id) {
                Some(mut stale) => {
                    tracing::warn!(chat_id, "Admin roster refresh failed, using stale roster: {}", e);
                    stale.expires_at = Instant::now() + FAILED_REFRESH_BACKOFF;
                    stale.admins.contains(&user_id)
                }
                None => {
                    tracing::error!(chat_id, "Admin roster unavailable: {}", e);
                    false
                }
            },
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
