// Moderation state - trust list, moderated chats, banned origins, audit-log target.
//
// Every mutation is applied to a copy, persisted, and only then published.
// A failed save leaves memory as it was.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use thiserror::Error;
use tokio::sync::RwLock;

// ============================================================================
// ERRORS
// ============================================================================

#[derive(Debug, Error)]
pub enum StateError {
    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("Invalid origin id: {0}")]
    InvalidOrigin(i64),
}

// ============================================================================
// STORAGE TRAIT (PORT)
// ============================================================================

/// Persisted shape of the moderation state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModerationData {
    #[serde(default)]
    pub trusted_user_ids: BTreeSet<i64>,
    #[serde(default)]
    pub moderated_chat_ids: BTreeSet<i64>,
    #[serde(default)]
    pub banned_channel_ids: BTreeSet<i64>,
    #[serde(default)]
    pub audit_log_chat_id: Option<i64>,
}

#[async_trait]
pub trait StateStore: Send + Sync {
    /// Load the persisted state, or defaults if nothing was saved yet.
    async fn load(&self) -> Result<ModerationData, StateError>;

    async fn save(&self, data: &ModerationData) -> Result<(), StateError>;
}

/// Map a public channel id into the platform's negative broadcast id space.
///
/// `123456789` becomes `-100123456789`; ids that are already negative are kept.
pub fn normalize_origin_id(origin_id: i64) -> Result<i64, StateError> {
    if origin_id <= 0 {
        return Ok(origin_id);
    }
    format!("-100{}", origin_id)
        .parse::<i64>()
        .map_err(|_| StateError::InvalidOrigin(origin_id))
}

// ============================================================================
// STATE
// ============================================================================

pub struct ModerationState<S: StateStore> {
    store: S,
    data: RwLock<ModerationData>,
}

impl<S: StateStore> ModerationState<S> {
    /// Load state from the store.
    pub async fn load(store: S) -> Result<Self, StateError> {
        let data = store.load().await?;
        tracing::info!(
            trusted = data.trusted_user_ids.len(),
            moderated_chats = data.moderated_chat_ids.len(),
            banned_origins = data.banned_channel_ids.len(),
            "Moderation state loaded"
        );
        Ok(Self {
            store,
            data: RwLock::new(data),
        })
    }

    /// Apply `change` under the write guard and persist if it reports a modification.
    async fn mutate<T>(
        &self,
        change: impl FnOnce(&mut ModerationData) -> (bool, T),
    ) -> Result<T, StateError> {
        let mut data = self.data.write().await;
        let mut next = data.clone();
        let (changed, result) = change(&mut next);
        if changed {
            self.store.save(&next).await?;
            *data = next;
        }
        Ok(result)
    }

    #[cfg(test)]
    pub(crate) fn store(&self) -> &S {
        &self.store
    }

    pub async fn is_trusted(&self, user_id: i64) -> bool {
        self.data.read().await.trusted_user_ids.contains(&user_id)
    }

    /// Add a user to the trust list. Returns `false` if they were already trusted.
    pub async fn trust(&self, user_id: i64) -> Result<bool, StateError> {
        self.mutate(|d| {
            let added = d.trusted_user_ids.insert(user_id);
            (added, added)
        })
        .await
    }

    pub async fn is_chat_moderated(&self, chat_id: i64) -> bool {
        self.data.read().await.moderated_chat_ids.contains(&chat_id)
    }

    pub async fn moderate_chat(&self, chat_id: i64) -> Result<bool, StateError> {
        self.mutate(|d| {
            let added = d.moderated_chat_ids.insert(chat_id);
            (added, added)
        })
        .await
    }

    pub async fn unmoderate_chat(&self, chat_id: i64) -> Result<bool, StateError> {
        self.mutate(|d| {
            let removed = d.moderated_chat_ids.remove(&chat_id);
            (removed, removed)
        })
        .await
    }

    pub async fn is_origin_banned(&self, origin_id: i64) -> bool {
        match normalize_origin_id(origin_id) {
            Ok(id) => self.data.read().await.banned_channel_ids.contains(&id),
            Err(_) => false,
        }
    }

    /// Ban an origin. Returns the stored (normalized) id and whether it was new.
    pub async fn ban_origin(&self, origin_id: i64) -> Result<(i64, bool), StateError> {
        let normalized = normalize_origin_id(origin_id)?;
        self.mutate(|d| {
            let added = d.banned_channel_ids.insert(normalized);
            (added, (normalized, added))
        })
        .await
    }

    pub async fn audit_log_target(&self) -> Option<i64> {
        self.data.read().await.audit_log_chat_id
    }

    /// Set the audit-log chat, returning the previous one.
    pub async fn set_audit_log_target(&self, chat_id: i64) -> Result<Option<i64>, StateError> {
        self.mutate(|d| {
            let previous = d.audit_log_chat_id.replace(chat_id);
            (previous != Some(chat_id), previous)
        })
        .await
    }

    /// Clear the audit-log chat, returning the one that was set.
    pub async fn clear_audit_log_target(&self) -> Result<Option<i64>, StateError> {
        self.mutate(|d| {
            let previous = d.audit_log_chat_id.take();
            (previous.is_some(), previous)
        })
        .await
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// In-memory store that counts writes.
    #[derive(Default)]
    pub(crate) struct MockStateStore {
        pub initial: ModerationData,
        pub saved: Mutex<Option<ModerationData>>,
        pub saves: AtomicUsize,
        pub fail_saves: AtomicBool,
    }

    impl MockStateStore {
        pub fn with(initial: ModerationData) -> Self {
            Self {
                initial,
                ..Default::default()
            }
        }
    }

    #[async_trait]
    impl StateStore for MockStateStore {
        async fn load(&self) -> Result<ModerationData, StateError> {
            Ok(self.initial.clone())
        }

        async fn save(&self, data: &ModerationData) -> Result<(), StateError> {
            if self.fail_saves.load(Ordering::SeqCst) {
                return Err(StateError::StorageError("disk full".to_string()));
            }
            self.saves.fetch_add(1, Ordering::SeqCst);
            *self.saved.lock().unwrap() = Some(data.clone());
            Ok(())
        }
    }

    #[test]
    fn test_normalize_origin_id() {
        assert_eq!(normalize_origin_id(123456789).unwrap(), -100123456789);
        assert_eq!(normalize_origin_id(-100123456789).unwrap(), -100123456789);
        assert!(normalize_origin_id(i64::MAX).is_err());
    }

    #[tokio::test]
    async fn test_trust_is_idempotent() {
        let state = ModerationState::load(MockStateStore::default()).await.unwrap();

        assert!(!state.is_trusted(42).await);
        assert!(state.trust(42).await.unwrap());
        assert!(!state.trust(42).await.unwrap());
        assert!(state.is_trusted(42).await);

        // Only the first trust touched the disk
        assert_eq!(state.store.saves.load(Ordering::SeqCst), 1);
        let saved = state.store.saved.lock().unwrap().clone().unwrap();
        assert_eq!(saved.trusted_user_ids.len(), 1);
    }

    #[tokio::test]
    async fn test_moderate_and_unmoderate_chat() {
        let state = ModerationState::load(MockStateStore::default()).await.unwrap();

        assert!(state.moderate_chat(-5).await.unwrap());
        assert!(state.is_chat_moderated(-5).await);
        assert!(!state.moderate_chat(-5).await.unwrap());

        assert!(state.unmoderate_chat(-5).await.unwrap());
        assert!(!state.is_chat_moderated(-5).await);
        assert!(!state.unmoderate_chat(-5).await.unwrap());
    }

    #[tokio::test]
    async fn test_ban_origin_stores_broadcast_id() {
        let state = ModerationState::load(MockStateStore::default()).await.unwrap();

        let (stored, added) = state.ban_origin(123456789).await.unwrap();
        assert_eq!(stored, -100123456789);
        assert!(added);

        assert!(state.is_origin_banned(-100123456789).await);
        assert!(state.is_origin_banned(123456789).await);

        let saved = state.store.saved.lock().unwrap().clone().unwrap();
        assert!(saved.banned_channel_ids.contains(&-100123456789));
    }

    #[tokio::test]
    async fn test_failed_save_leaves_state_untouched() {
        let state = ModerationState::load(MockStateStore::default()).await.unwrap();
        state.store.fail_saves.store(true, Ordering::SeqCst);

        assert!(state.ban_origin(123456789).await.is_err());
        assert!(!state.is_origin_banned(123456789).await);
        assert!(state.trust(42).await.is_err());
        assert!(!state.is_trusted(42).await);

        // Retrying once the store recovers persists the ban
        state.store.fail_saves.store(false, Ordering::SeqCst);
        assert_eq!(state.ban_origin(123456789).await.unwrap(), (-100123456789, true));
        let saved = state.store.saved.lock().unwrap().clone().unwrap();
        assert!(saved.banned_channel_ids.contains(&-100123456789));
    }

    #[tokio::test]
    async fn test_audit_log_target_lifecycle() {
        let state = ModerationState::load(MockStateStore::default()).await.unwrap();

        assert_eq!(state.audit_log_target().await, None);
        assert_eq!(state.set_audit_log_target(-10).await.unwrap(), None);
        assert_eq!(state.set_audit_log_target(-20).await.unwrap(), Some(-10));
        assert_eq!(state.audit_log_target().await, Some(-20));
        assert_eq!(state.clear_audit_log_target().await.unwrap(), Some(-20));
        assert_eq!(state.clear_audit_log_target().await.unwrap(), None);
    }
}
