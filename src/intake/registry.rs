//! Open wizard sessions, keyed by session id.
//!
//! Sessions idle for longer than the configured window are swept whenever a
//! new one is registered. A swept session flushes its pending draft first so
//! the visitor can resume it later under the same id.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, RwLock};
use tokio::time::Instant;

use super::IntakeWizard;

/// One registered wizard and the time it was last used.
pub struct SessionSlot {
    pub wizard: Mutex<IntakeWizard>,
    /// Milliseconds since the registry epoch
    last_used: AtomicU64,
}

pub struct SessionRegistry {
    sessions: RwLock<HashMap<String, Arc<SessionSlot>>>,
    idle_timeout: Duration,
    epoch: Instant,
}

impl SessionRegistry {
    pub fn new(idle_timeout: Duration) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            idle_timeout,
            epoch: Instant::now(),
        }
    }

    fn now_ms(&self) -> u64 {
        self.epoch.elapsed().as_millis() as u64
    }

    /// Look up a session and mark it as used.
    pub async fn get(&self, id: &str) -> Option<Arc<SessionSlot>> {
        let slot = self.sessions.read().await.get(id).cloned()?;
        slot.last_used.store(self.now_ms(), Ordering::Relaxed);
        Some(slot)
    }

    /// Register `wizard` under `id` unless another request got there first.
    /// Idle sessions are swept beforehand.
    pub async fn insert(&self, id: &str, wizard: IntakeWizard) -> Arc<SessionSlot> {
        self.sweep().await;

        let slot = Arc::new(SessionSlot {
            wizard: Mutex::new(wizard),
            last_used: AtomicU64::new(self.now_ms()),
        });
        self.sessions
            .write()
            .await
            .entry(id.to_string())
            .or_insert(slot)
            .clone()
    }

    pub async fn remove(&self, id: &str) -> Option<Arc<SessionSlot>> {
        self.sessions.write().await.remove(id)
    }

    #[cfg(test)]
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Drop sessions idle past the timeout. Returns how many were dropped.
    pub async fn sweep(&self) -> usize {
        let cutoff = self
            .now_ms()
            .saturating_sub(self.idle_timeout.as_millis() as u64);

        let expired: Vec<(String, Arc<SessionSlot>)> = {
            let mut sessions = self.sessions.write().await;
            let ids: Vec<String> = sessions
                .iter()
                // A slot still referenced elsewhere is in use by a request
                .filter(|(_, slot)| {
                    slot.last_used.load(Ordering::Relaxed) < cutoff
                        && Arc::strong_count(slot) == 1
                })
                .map(|(id, _)| id.clone())
                .collect();
            ids.into_iter()
                .filter_map(|id| sessions.remove(&id).map(|slot| (id, slot)))
                .collect()
        };

        for (id, slot) in &expired {
            slot.wizard.lock().await.flush_draft().await;
            tracing::debug!(session_id = %id, "Idle intake session expired");
        }
        if !expired.is_empty() {
            tracing::info!(expired = expired.len(), "Swept idle intake sessions");
        }
        expired.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryStore;
    use crate::intake::WizardSettings;
    use crate::models::{FieldValue, FormVariant};

    const IDLE: Duration = Duration::from_secs(60);

    async fn wizard_with(mem: &Arc<MemoryStore>, key: &str, debounce: Duration) -> IntakeWizard {
        let settings = WizardSettings {
            destination: "info@castlecrewglazing.co.uk".to_string(),
            fallback_phone: "+44 7949 821925".to_string(),
            debounce,
        };
        IntakeWizard::open(FormVariant::Contact, mem.clone(), key, settings).await
    }

    async fn wizard(mem: &Arc<MemoryStore>, key: &str) -> IntakeWizard {
        wizard_with(mem, key, Duration::from_millis(1000)).await
    }

    #[tokio::test(start_paused = true)]
    async fn test_idle_sessions_are_swept_on_insert() {
        let mem = Arc::new(MemoryStore::new());
        let registry = SessionRegistry::new(IDLE);

        registry.insert("old", wizard(&mem, "draft:old").await).await;
        tokio::time::advance(Duration::from_secs(45)).await;
        registry.insert("recent", wizard(&mem, "draft:recent").await).await;
        tokio::time::advance(Duration::from_secs(30)).await;

        registry.insert("new", wizard(&mem, "draft:new").await).await;
        assert!(registry.get("old").await.is_none());
        assert!(registry.get("recent").await.is_some());
        assert_eq!(registry.len().await, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_use_keeps_session_alive() {
        let mem = Arc::new(MemoryStore::new());
        let registry = SessionRegistry::new(IDLE);

        registry.insert("busy", wizard(&mem, "draft:busy").await).await;
        for _ in 0..3 {
            tokio::time::advance(Duration::from_secs(40)).await;
            assert!(registry.get("busy").await.is_some());
        }
        assert_eq!(registry.sweep().await, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweep_flushes_pending_draft() {
        let mem = Arc::new(MemoryStore::new());
        let registry = SessionRegistry::new(IDLE);

        // Debounce outlasts the idle window, so only the sweep can persist
        let w = wizard_with(&mem, "draft:s1", IDLE * 10).await;
        let slot = registry.insert("s1", w).await;
        slot.wizard
            .lock()
            .await
            .set_field("message", FieldValue::Text("Quote".to_string()))
            .unwrap();
        drop(slot);

        tokio::time::advance(IDLE * 2).await;
        assert!(mem.get("draft:s1").is_none());
        assert_eq!(registry.sweep().await, 1);
        let saved = mem.get("draft:s1").unwrap();
        assert!(saved.contains("Quote"));
    }

    #[tokio::test]
    async fn test_insert_keeps_first_registration() {
        let mem = Arc::new(MemoryStore::new());
        let registry = SessionRegistry::new(IDLE);

        let first = registry.insert("dup", wizard(&mem, "draft:a").await).await;
        let second = registry.insert("dup", wizard(&mem, "draft:b").await).await;
        assert!(Arc::ptr_eq(&first, &second));
        assert!(registry.remove("dup").await.is_some());
        assert_eq!(registry.len().await, 0);
    }
}
