//! Debounced draft persistence.
//!
//! Each `schedule` replaces the pending write, so a burst of edits produces a
//! single write of the last state once the window passes without edits.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;

use crate::db::Store;
use crate::models::{DraftState, FieldValue};

struct PendingSave {
    handle: JoinHandle<()>,
    value: String,
}

/// Cancellable deferred writer for one draft key.
pub struct DraftAutosave {
    store: Arc<dyn Store>,
    key: String,
    window: Duration,
    pending: Option<PendingSave>,
}

impl DraftAutosave {
    pub fn new(store: Arc<dyn Store>, key: impl Into<String>, window: Duration) -> Self {
        Self {
            store,
            key: key.into(),
            window,
            pending: None,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    #[cfg(test)]
    pub fn is_pending(&self) -> bool {
        self.pending
            .as_ref()
            .is_some_and(|p| !p.handle.is_finished())
    }

    /// Replace any pending write with one for `draft` after the window.
    ///
    /// Must be called from within a tokio runtime.
    pub fn schedule(&mut self, draft: &DraftState) {
        self.cancel();

        if !draft.has_input() {
            return;
        }
        let value = match serde_json::to_string(&draft.values) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(key = %self.key, "Failed to serialize draft: {}", e);
                return;
            }
        };

        let store = self.store.clone();
        let key = self.key.clone();
        let window = self.window;
        let task_value = value.clone();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(window).await;
            persist(store.as_ref(), &key, &task_value).await;
        });

        self.pending = Some(PendingSave { handle, value });
    }

    /// Drop the pending write, if any.
    pub fn cancel(&mut self) {
        if let Some(pending) = self.pending.take() {
            pending.handle.abort();
        }
    }

    /// Write the pending draft now instead of waiting for the window.
    pub async fn flush(&mut self) {
        if let Some(pending) = self.pending.take() {
            if pending.handle.is_finished() {
                return;
            }
            pending.handle.abort();
            persist(self.store.as_ref(), &self.key, &pending.value).await;
        }
    }

    /// Cancel pending work and delete the stored draft.
    pub async fn erase(&mut self) {
        self.cancel();
        if let Err(e) = self.store.remove(&self.key).await {
            tracing::warn!(key = %self.key, "Failed to erase draft: {}", e);
        }
    }

    /// Previously saved field values, or `None` when absent or unreadable.
    pub async fn load(&self) -> Option<BTreeMap<String, FieldValue>> {
        let raw = match self.store.read(&self.key).await {
            Ok(raw) => raw?,
            Err(e) => {
                tracing::warn!(key = %self.key, "Failed to read draft: {}", e);
                return None;
            }
        };

        let entries: BTreeMap<String, serde_json::Value> = match serde_json::from_str(&raw) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!(key = %self.key, "Ignoring corrupt draft: {}", e);
                return None;
            }
        };

        // Entries that are not field values are skipped individually
        Some(
            entries
                .into_iter()
                .filter_map(|(name, value)| {
                    serde_json::from_value(value).ok().map(|value| (name, value))
                })
                .collect(),
        )
    }
}

impl Drop for DraftAutosave {
    fn drop(&mut self) {
        self.cancel();
    }
}

async fn persist(store: &dyn Store, key: &str, value: &str) {
    match store.write(key, value).await {
        Ok(()) => tracing::debug!(key, "Draft saved"),
        Err(e) => tracing::warn!(key, "Draft autosave failed: {}", e),
    }
}
