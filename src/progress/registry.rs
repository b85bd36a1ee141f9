// src/progress/registry.rs

use std::{
    collections::HashMap,
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
    time::Duration,
};

use tokio::{
    sync::{Mutex, OnceCell, RwLock},
    time::Instant,
};
use uuid::Uuid;

use super::{
    merge::MergeReport,
    store::{AccountKey, ProgressSeed, ProgressStore, read_snapshot, write_snapshot},
};
use crate::{
    error::AppError,
    models::progress::UserProgress,
    quiz::session::QuizSession,
    storage::{DocumentStore, LocalStorage, StoreError},
};

/// Live state of one signed-in account or anonymous session.
pub struct Session {
    pub store: ProgressStore,
    /// The quiz currently being played, if any.
    pub quiz: Option<QuizSession>,
}

pub type SessionHandle = Arc<Mutex<Session>>;

/// Map entry for one key. The cell is filled by the single load that wins.
struct Slot {
    session: OnceCell<SessionHandle>,
    /// Milliseconds since the registry was created.
    last_access: AtomicU64,
}

/// Owns the progress stores of active sessions.
///
/// A store is created and loaded the first time its key is opened, and flushed
/// and dropped when the session signs out or sits idle past the sweep limit.
pub struct SessionRegistry {
    sessions: RwLock<HashMap<AccountKey, Arc<Slot>>>,
    remote: Arc<dyn DocumentStore>,
    local: Arc<dyn LocalStorage>,
    load_timeout: Duration,
    epoch: Instant,
}

impl SessionRegistry {
    pub fn new(
        remote: Arc<dyn DocumentStore>,
        local: Arc<dyn LocalStorage>,
        load_timeout: Duration,
    ) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            remote,
            local,
            load_timeout,
            epoch: Instant::now(),
        }
    }

    fn now_millis(&self) -> u64 {
        self.epoch.elapsed().as_millis() as u64
    }

    fn touch(&self, slot: &Slot) {
        slot.last_access.store(self.now_millis(), Ordering::Relaxed);
    }

    pub async fn get(&self, key: &AccountKey) -> Option<SessionHandle> {
        let sessions = self.sessions.read().await;
        let slot = sessions.get(key)?;
        let handle = slot.session.get()?.clone();
        self.touch(slot);
        Some(handle)
    }

    /// Returns the live session for `key`, loading it first if needed.
    ///
    /// Concurrent first requests for one key share a single load. A failed or
    /// timed-out load registers nothing, so the next call retries.
    pub async fn open(&self, key: AccountKey, seed: ProgressSeed) -> Result<SessionHandle, AppError> {
        if let Some(handle) = self.get(&key).await {
            return Ok(handle);
        }

        let slot = self
            .sessions
            .write()
            .await
            .entry(key.clone())
            .or_insert_with(|| {
                Arc::new(Slot {
                    session: OnceCell::new(),
                    last_access: AtomicU64::new(0),
                })
            })
            .clone();
        self.touch(&slot);

        let loaded = slot
            .session
            .get_or_try_init(|| self.load(key.clone(), seed))
            .await
            .cloned();

        if loaded.is_err() {
            let mut sessions = self.sessions.write().await;
            let abandoned = sessions
                .get(&key)
                .is_some_and(|s| Arc::ptr_eq(s, &slot) && !s.session.initialized());
            if abandoned {
                sessions.remove(&key);
            }
        }

        loaded
    }

    async fn load(&self, key: AccountKey, seed: ProgressSeed) -> Result<SessionHandle, AppError> {
        let mut store = ProgressStore::new(key.clone(), self.remote.clone(), self.local.clone());
        match tokio::time::timeout(self.load_timeout, store.load(seed)).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                tracing::warn!("Failed to load progress for {}: {}", key, e);
                return Err(e.into());
            }
            Err(_) => {
                tracing::warn!("Loading progress for {} timed out", key);
                return Err(StoreError::Timeout(self.load_timeout).into());
            }
        }

        tracing::debug!("Session opened for {}", key);
        Ok(Arc::new(Mutex::new(Session { store, quiz: None })))
    }

    /// Removes a session without flushing it.
    pub async fn take(&self, key: &AccountKey) -> Option<SessionHandle> {
        let slot = self.sessions.write().await.remove(key)?;
        slot.session.get().cloned()
    }

    /// Teardown on sign-out. Returns whether everything reached storage.
    pub async fn close(&self, key: &AccountKey) -> bool {
        let Some(handle) = self.take(key).await else {
            return true;
        };

        let flushed = match Arc::try_unwrap(handle) {
            Ok(mutex) => mutex.into_inner().store.close().await,
            // Still borrowed by an in-flight request.
            Err(shared) => shared.lock().await.store.flush().await,
        };
        tracing::debug!("Session closed for {}", key);
        flushed
    }

    /// Drops sessions not touched for `idle`, flushing each first.
    ///
    /// A session whose flush fails stays registered so its outbox is not lost.
    /// Returns how many sessions were dropped.
    pub async fn evict_idle(&self, idle: Duration) -> usize {
        let cutoff = self.now_millis().saturating_sub(idle.as_millis() as u64);
        let candidates: Vec<(AccountKey, Arc<Slot>)> = self
            .sessions
            .read()
            .await
            .iter()
            .filter(|(_, slot)| {
                slot.session.initialized() && slot.last_access.load(Ordering::Relaxed) <= cutoff
            })
            .map(|(key, slot)| (key.clone(), slot.clone()))
            .collect();

        let mut evicted = 0;
        for (key, slot) in candidates {
            let Some(handle) = slot.session.get() else {
                continue;
            };

            let mut session = handle.lock().await;
            if !session.store.flush().await {
                tracing::warn!("Keeping idle session {}: progress not yet persisted", key);
                continue;
            }

            let mut sessions = self.sessions.write().await;
            let still_idle = sessions.get(&key).is_some_and(|s| {
                Arc::ptr_eq(s, &slot) && s.last_access.load(Ordering::Relaxed) <= cutoff
            });
            if still_idle {
                sessions.remove(&key);
                evicted += 1;
                tracing::debug!("Evicted idle session {}", key);
            }
            drop(session);
        }

        if evicted > 0 {
            tracing::info!("Evicted {} idle session(s)", evicted);
        }
        evicted
    }

    /// Runs `evict_idle` every `period` for the lifetime of the process.
    pub fn spawn_sweeper(self: Arc<Self>, period: Duration, idle: Duration) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                self.evict_idle(idle).await;
            }
        })
    }

    /// Number of loaded sessions.
    pub async fn len(&self) -> usize {
        self.sessions
            .read()
            .await
            .values()
            .filter(|slot| slot.session.initialized())
            .count()
    }

    /// Moves an anonymous session's progress into an account session.
    ///
    /// The anonymous progress is handed over first: its snapshot is stamped
    /// with a merge token and the account it went to, and only then merged.
    /// The live anonymous session is preferred over its local snapshot since it
    /// may hold writes that never reached local storage. `None` when there is
    /// nothing to merge.
    pub async fn absorb_anonymous(
        &self,
        account: &SessionHandle,
        anonymous: &AccountKey,
    ) -> Result<Option<MergeReport>, AppError> {
        let account_id = account.lock().await.store.key().id().to_string();

        let snapshot = match self.get(anonymous).await {
            Some(handle) => {
                let snapshot = handle.lock().await.store.hand_over(&account_id).await?;
                self.take(anonymous).await;
                Some(snapshot)
            }
            None => self.hand_over_snapshot(anonymous, &account_id).await?,
        };

        let Some(snapshot) = snapshot else {
            return Ok(None);
        };

        let mut session = account.lock().await;
        let report = session
            .store
            .merge_anonymous_into_account(anonymous.id(), &snapshot)
            .await?;
        Ok(Some(report))
    }

    /// Stamps a stored snapshot for a merge into `account_id`.
    ///
    /// A snapshot already handed over keeps its token, so a retried merge is
    /// recognised. A snapshot without a token gets one written back before it
    /// can be merged at all.
    async fn hand_over_snapshot(
        &self,
        anonymous: &AccountKey,
        account_id: &str,
    ) -> Result<Option<UserProgress>, AppError> {
        let Some(mut snapshot) = read_snapshot(&*self.local, anonymous).await else {
            return Ok(None);
        };

        if snapshot.merge_token.is_none() || snapshot.merged_into.is_none() {
            snapshot.merge_token.get_or_insert_with(Uuid::new_v4);
            snapshot.merged_into = Some(account_id.to_string());
            write_snapshot(&*self.local, anonymous, &snapshot).await?;
        }

        Ok(Some(snapshot))
    }
}
