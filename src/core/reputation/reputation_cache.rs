// Reputation cache - local snapshots of known bad actors merged with point lookups.
//
// Snapshots come from a periodic "recent offenders" download. A snapshot older
// than `max_age` is purged before any lookup consults the set. When no retained
// snapshot knows the user, the remote service is asked directly; if that fails
// the user is reported as not flagged.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use std::collections::HashSet;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;

/// Default lifetime of a downloaded snapshot.
pub const DEFAULT_MAX_AGE_HOURS: i64 = 72;

#[derive(Debug, Error)]
pub enum ReputationError {
    #[error("Reputation request failed: {0}")]
    Request(String),

    #[error("Reputation service returned {0}")]
    Status(u16),

    #[error("Malformed reputation response: {0}")]
    Malformed(String),

    #[error("List '{0}' not found in list index")]
    ListNotFound(String),
}

/// Remote "known bad actor" service.
#[async_trait]
pub trait ReputationService: Send + Sync {
    /// Point lookup of a single account.
    async fn is_banned(&self, user_id: i64) -> Result<bool, ReputationError>;

    /// Full list of recently flagged accounts.
    async fn recent_offenders(&self) -> Result<Vec<i64>, ReputationError>;
}

#[derive(Debug)]
struct Snapshot {
    ids: HashSet<i64>,
    taken_at: DateTime<Utc>,
}

pub struct ReputationCache<S: ReputationService> {
    service: S,
    snapshots: RwLock<Vec<Snapshot>>,
    max_age: Duration,
}

impl<S: ReputationService> ReputationCache<S> {
    pub fn new(service: S, max_age: Duration) -> Self {
        Self {
            service,
            snapshots: RwLock::new(Vec::new()),
            max_age,
        }
    }

    /// Whether the user is a known bad actor.
    pub async fn is_flagged(&self, user_id: i64) -> bool {
        self.prune(Utc::now()).await;

        if self.in_snapshot(user_id, Utc::now()).await {
            tracing::info!(user_id, "User found in cached reputation snapshot");
            return true;
        }

        match self.service.is_banned(user_id).await {
            Ok(banned) => {
                tracing::info!(user_id, banned, "Reputation lookup finished");
                banned
            }
            Err(e) => {
                tracing::warn!(user_id, "Reputation lookup failed, assuming clean: {}", e);
                false
            }
        }
    }

    /// Download the recent offenders list and store it as a new snapshot.
    pub async fn refresh(&self) -> Result<usize, ReputationError> {
        let ids: HashSet<i64> = self.service.recent_offenders().await?.into_iter().collect();
        let count = ids.len();
        self.insert_snapshot(ids, Utc::now()).await;
        tracing::info!(count, "Reputation snapshot refreshed");
        Ok(count)
    }

    /// Store a fully built snapshot and drop expired ones.
    pub(crate) async fn insert_snapshot(&self, ids: HashSet<i64>, taken_at: DateTime<Utc>) {
        let now = Utc::now();
        let mut snapshots = self.snapshots.write().await;
        snapshots.push(Snapshot { ids, taken_at });
        snapshots.retain(|s| now - s.taken_at <= self.max_age);
    }

    /// Only snapshots within the max age at `now` are consulted.
    async fn in_snapshot(&self, user_id: i64, now: DateTime<Utc>) -> bool {
        self.snapshots
            .read()
            .await
            .iter()
            .any(|s| now - s.taken_at <= self.max_age && s.ids.contains(&user_id))
    }

    async fn prune(&self, now: DateTime<Utc>) {
        let expired = self
            .snapshots
            .read()
            .await
            .iter()
            .any(|s| now - s.taken_at > self.max_age);
        if expired {
            let mut snapshots = self.snapshots.write().await;
            let before = snapshots.len();
            snapshots.retain(|s| now - s.taken_at <= self.max_age);
            tracing::debug!("Purged {} expired reputation snapshot(s)", before - snapshots.len());
        }
    }

    #[cfg(test)]
    async fn snapshot_count(&self) -> usize {
        self.snapshots.read().await.len()
    }
}

impl<S: ReputationService + 'static> ReputationCache<S> {
    /// Spawn the periodic refresh loop. The first refresh runs immediately.
    pub fn spawn_refresh(self: Arc<Self>, interval: std::time::Duration) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                ticker.tick().await;
                tracing::debug!("Starting reputation snapshot refresh...");
                if let Err(e) = self.refresh().await {
                    tracing::warn!("Reputation snapshot refresh failed: {}", e);
                }
            }
        })
    }
}

// ============================================================================
// TESTS
// ============================================================================
