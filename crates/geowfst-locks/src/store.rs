//! The persisted lock-session store.
//!
//! Sessions live behind a [`KeyValueStore`]: one record per session plus
//! one well-known index key holding lightweight pointers, so listings and
//! expiry checks never deserialize full sessions. Mutations notify
//! registered observers synchronously.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::error::{LockError, Result};
use crate::session::{EditedFeature, InsertedFeature, LockSession};
use crate::storage::KeyValueStore;

const INDEX_KEY: &str = "WFSTEditFeatureLockItemIndex";
const RECORD_PREFIX: &str = "WFSTFeatureLock";

/// Lightweight index entry, enough for listing and expiry checks.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockPointer {
    pub id: String,
    /// End of life, epoch milliseconds.
    pub eol: u64,
    pub lock_name: String,
    pub lock_id: String,
}

/// Search and pagination over the session index.
#[derive(Clone, Debug)]
pub struct LockQuery {
    /// Substring matched case-insensitively against lock names and lock
    /// tokens. Empty matches everything.
    pub text: String,
    pub page_number: usize,
    pub page_size: usize,
}

/// One page of matching index pointers.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct LockQueryResult {
    pub rows: Vec<LockPointer>,
    /// Pointers matching the search across all pages.
    pub matches: usize,
    /// Pointers in the index overall.
    pub total: usize,
}

/// Handle returned by [`LockSessionStore::subscribe`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ObserverHandle(u64);

type Observer = Arc<dyn Fn(Option<&LockSession>) + Send + Sync>;

/// Persists [`LockSession`] records behind any [`KeyValueStore`].
pub struct LockSessionStore {
    backend: Arc<dyn KeyValueStore>,
    observers: Mutex<HashMap<u64, Observer>>,
    next_observer: AtomicU64,
    next_suffix: AtomicU64,
}

impl LockSessionStore {
    #[must_use]
    pub fn new(backend: Arc<dyn KeyValueStore>) -> Self {
        Self {
            backend,
            observers: Mutex::new(HashMap::new()),
            next_observer: AtomicU64::new(0),
            next_suffix: AtomicU64::new(0),
        }
    }

    /// Stores a new session: assigns an id unique within the index,
    /// stamps the end of life from the expiry, and writes both the record
    /// and its index pointer. Returns the stored session.
    ///
    /// # Errors
    ///
    /// Backend or serialization failures.
    pub async fn create(&self, mut session: LockSession) -> Result<LockSession> {
        let start = current_time_ms();
        let mut index = self.load_index().await?;

        let id = self.generate_id(&index, &session.lock_id, start);
        session.id = id.clone();
        session.eol = start + u64::from(session.expiry) * 60_000;

        self.backend
            .set(&id, &serde_json::to_string(&session)?)
            .await?;
        index.insert(
            id.clone(),
            LockPointer {
                id,
                eol: session.eol,
                lock_name: session.lock_name.clone(),
                lock_id: session.lock_id.clone(),
            },
        );
        self.save_index(&index).await?;

        self.notify(None);
        Ok(session)
    }

    /// Rewrites an existing session record. The index pointer is left
    /// untouched, so a replace never resurrects a deleted session.
    ///
    /// # Errors
    ///
    /// [`LockError::UnknownSession`] when the id is not in the index.
    pub async fn replace(&self, session: &LockSession) -> Result<()> {
        let index = self.load_index().await?;
        if !index.contains_key(&session.id) {
            return Err(LockError::UnknownSession {
                id: session.id.clone(),
            });
        }
        self.backend
            .set(&session.id, &serde_json::to_string(session)?)
            .await?;
        self.notify(Some(session));
        Ok(())
    }

    /// Deletes the record and its pointer. Returns false, without
    /// notifying, when the session had already vanished.
    ///
    /// # Errors
    ///
    /// Backend or serialization failures.
    pub async fn delete(&self, id: &str) -> Result<bool> {
        self.delete_inner(id, true).await
    }

    /// Records a local edit on a stored session and persists the result.
    /// Returns false, without writing, when the session does not track
    /// the feature id.
    ///
    /// # Errors
    ///
    /// [`LockError::UnknownSession`] when the session is gone, plus
    /// backend or serialization failures.
    pub async fn apply_update(&self, id: &str, feature: EditedFeature) -> Result<bool> {
        let mut session = self.require(id).await?;
        if !session.record_update(feature) {
            return Ok(false);
        }
        self.replace(&session).await?;
        Ok(true)
    }

    /// Records a locally created feature on a stored session and
    /// persists the result.
    ///
    /// # Errors
    ///
    /// [`LockError::UnknownSession`] when the session is gone, plus
    /// backend or serialization failures.
    pub async fn apply_insert(&self, id: &str, feature: InsertedFeature) -> Result<()> {
        let mut session = self.require(id).await?;
        session.record_insert(feature);
        self.replace(&session).await
    }

    /// Records a local removal on a stored session and persists the
    /// result. Returns false, without writing, when the session does not
    /// track the feature id.
    ///
    /// # Errors
    ///
    /// [`LockError::UnknownSession`] when the session is gone, plus
    /// backend or serialization failures.
    pub async fn apply_removal(&self, id: &str, feature_id: &str) -> Result<bool> {
        let mut session = self.require(id).await?;
        if !session.record_removal(feature_id) {
            return Ok(false);
        }
        self.replace(&session).await?;
        Ok(true)
    }

    async fn require(&self, id: &str) -> Result<LockSession> {
        self.get(id)
            .await?
            .ok_or_else(|| LockError::UnknownSession { id: id.to_string() })
    }

    /// Loads a full session. Ids missing from the index yield `None`.
    ///
    /// # Errors
    ///
    /// Backend failures, or a record that no longer parses.
    pub async fn get(&self, id: &str) -> Result<Option<LockSession>> {
        let index = self.load_index().await?;
        if !index.contains_key(id) {
            return Ok(None);
        }
        match self.backend.get(id).await? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    /// Loads a single index pointer.
    ///
    /// # Errors
    ///
    /// Backend or serialization failures.
    pub async fn pointer(&self, id: &str) -> Result<Option<LockPointer>> {
        Ok(self.load_index().await?.remove(id))
    }

    /// All index pointers in key order.
    ///
    /// # Errors
    ///
    /// Backend or serialization failures.
    pub async fn pointers(&self) -> Result<Vec<LockPointer>> {
        Ok(self.load_index().await?.into_values().collect())
    }

    /// Case-insensitive substring search over lock names and tokens,
    /// paginated, in index key order.
    ///
    /// # Errors
    ///
    /// Backend or serialization failures.
    pub async fn query(&self, query: &LockQuery) -> Result<LockQueryResult> {
        let all = self.pointers().await?;
        let total = all.len();
        let needle = query.text.to_lowercase();
        let matching: Vec<LockPointer> = all
            .into_iter()
            .filter(|pointer| {
                pointer.lock_name.to_lowercase().contains(&needle)
                    || pointer.lock_id.to_lowercase().contains(&needle)
            })
            .collect();
        let matches = matching.len();

        let start = query
            .page_number
            .saturating_mul(query.page_size)
            .min(matches);
        let end = start.saturating_add(query.page_size).min(matches);
        Ok(LockQueryResult {
            rows: matching[start..end].to_vec(),
            matches,
            total,
        })
    }

    /// Pointers whose end of life lies before `now_ms`.
    ///
    /// # Errors
    ///
    /// Backend or serialization failures.
    pub async fn expired(&self, now_ms: u64) -> Result<Vec<LockPointer>> {
        Ok(self
            .pointers()
            .await?
            .into_iter()
            .filter(|pointer| pointer.eol < now_ms)
            .collect())
    }

    /// Deletes every session expired right now. See [`Self::sweep_at`].
    ///
    /// # Errors
    ///
    /// Backend or serialization failures.
    pub async fn sweep(&self) -> Result<usize> {
        self.sweep_at(current_time_ms()).await
    }

    /// Deletes every session expired at `now_ms`. Per-delete
    /// notifications are suppressed; observers hear one notification at
    /// the end if anything was removed.
    ///
    /// # Errors
    ///
    /// Backend or serialization failures.
    pub async fn sweep_at(&self, now_ms: u64) -> Result<usize> {
        let mut removed = 0;
        for pointer in self.expired(now_ms).await? {
            // A foreground delete may have raced us; false is fine.
            if self.delete_inner(&pointer.id, false).await? {
                removed += 1;
            }
        }
        if removed > 0 {
            self.notify(None);
        }
        Ok(removed)
    }

    /// Registers an observer called synchronously after every mutation.
    /// Replacements pass the new session; creates, deletes and sweeps
    /// pass `None`.
    pub fn subscribe<F>(&self, observer: F) -> ObserverHandle
    where
        F: Fn(Option<&LockSession>) + Send + Sync + 'static,
    {
        let handle = self.next_observer.fetch_add(1, Ordering::Relaxed);
        let mut observers = self
            .observers
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        observers.insert(handle, Arc::new(observer));
        ObserverHandle(handle)
    }

    /// Removes an observer. Returns false for an unknown handle.
    pub fn unsubscribe(&self, handle: ObserverHandle) -> bool {
        let mut observers = self
            .observers
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        observers.remove(&handle.0).is_some()
    }

    async fn delete_inner(&self, id: &str, announce: bool) -> Result<bool> {
        let mut index = self.load_index().await?;
        let Some(pointer) = index.remove(id) else {
            return Ok(false);
        };
        self.save_index(&index).await?;
        self.backend.remove(&pointer.id).await?;
        if announce {
            self.notify(None);
        }
        Ok(true)
    }

    fn generate_id(
        &self,
        index: &BTreeMap<String, LockPointer>,
        lock_id: &str,
        start_ms: u64,
    ) -> String {
        loop {
            let suffix = self.next_suffix.fetch_add(1, Ordering::Relaxed);
            let id = format!("{RECORD_PREFIX}-{start_ms}-{lock_id}-{suffix}");
            if !index.contains_key(&id) {
                return id;
            }
        }
    }

    async fn load_index(&self) -> Result<BTreeMap<String, LockPointer>> {
        match self.backend.get(INDEX_KEY).await? {
            Some(raw) => Ok(serde_json::from_str(&raw)?),
            None => Ok(BTreeMap::new()),
        }
    }

    async fn save_index(&self, index: &BTreeMap<String, LockPointer>) -> Result<()> {
        self.backend
            .set(INDEX_KEY, &serde_json::to_string(index)?)
            .await
    }

    fn notify(&self, extra: Option<&LockSession>) {
        let observers: Vec<Observer> = {
            let guard = self
                .observers
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            guard.values().cloned().collect()
        };
        for observer in observers {
            observer(extra);
        }
    }
}

fn current_time_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |elapsed| {
            u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX)
        })
}
