// src/progress/store.rs

use std::{fmt, sync::Arc};

use serde::Serialize;
use uuid::Uuid;

use super::{
    merge::{MergeOutcome, MergeReport, merge_anonymous},
    notification::Notification,
    outbox::{Mutation, Outbox, PendingWrite},
};
use crate::{
    config::{ANONYMOUS_SNAPSHOT_KEY, THEME_KEY},
    error::AppError,
    models::progress::{
        ANONYMOUS_USERNAME, Attempt, QuizSetProgress, RewardGrant, Theme, UserProgress,
    },
    storage::{DocumentStore, LocalStorage, StoreError},
};

/// Identity a progress document belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AccountKey {
    /// Signed-up account; progress lives in the remote document store.
    Account(String),
    /// Anonymous session; progress lives in local storage.
    Anonymous(String),
}

impl AccountKey {
    pub fn id(&self) -> &str {
        match self {
            AccountKey::Account(id) | AccountKey::Anonymous(id) => id,
        }
    }

    pub fn is_anonymous(&self) -> bool {
        matches!(self, AccountKey::Anonymous(_))
    }

    pub fn snapshot_key(&self) -> String {
        format!("{}:{}", ANONYMOUS_SNAPSHOT_KEY, self.id())
    }

    pub fn theme_key(&self) -> String {
        format!("{}:{}", THEME_KEY, self)
    }
}

impl fmt::Display for AccountKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AccountKey::Account(id) => write!(f, "account:{}", id),
            AccountKey::Anonymous(id) => write!(f, "anonymous:{}", id),
        }
    }
}

/// Profile fields used when a document has to be created from the template.
#[derive(Debug, Clone)]
pub struct ProgressSeed {
    pub username: String,
    pub email: Option<String>,
}

impl ProgressSeed {
    pub fn anonymous() -> Self {
        Self {
            username: ANONYMOUS_USERNAME.to_string(),
            email: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadState {
    Loading,
    Ready,
}

/// Result of one mutation.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MutationReport {
    pub mutation_id: Uuid,
    /// False when the write failed and the mutation sits in the outbox.
    pub persisted: bool,
    pub notifications: Vec<Notification>,
}

/// The progress of one account or anonymous session.
///
/// Every mutation is applied in memory, queued in the outbox and then flushed.
/// A failed flush is logged and retried by the next mutation or `flush` call.
pub struct ProgressStore {
    key: AccountKey,
    progress: UserProgress,
    state: LoadState,
    remote: Arc<dyn DocumentStore>,
    local: Arc<dyn LocalStorage>,
    outbox: Outbox,
}

impl ProgressStore {
    pub fn new(key: AccountKey, remote: Arc<dyn DocumentStore>, local: Arc<dyn LocalStorage>) -> Self {
        let progress = UserProgress::template(key.id().to_string(), ANONYMOUS_USERNAME.to_string(), None);
        Self {
            key,
            progress,
            state: LoadState::Loading,
            remote,
            local,
            outbox: Outbox::new(),
        }
    }

    pub fn key(&self) -> &AccountKey {
        &self.key
    }

    pub fn is_loading(&self) -> bool {
        self.state == LoadState::Loading
    }

    pub fn progress(&self) -> &UserProgress {
        &self.progress
    }

    pub fn pending_writes(&self) -> &[PendingWrite] {
        self.outbox.items()
    }

    /// Resolves the progress for this key.
    ///
    /// Accounts read the remote document and create it from the template when absent.
    /// Anonymous sessions read the local snapshot; a missing or unreadable snapshot
    /// starts over from the template. Remote read failures are returned.
    pub async fn load(&mut self, seed: ProgressSeed) -> Result<(), StoreError> {
        match self.key.clone() {
            AccountKey::Account(id) => match self.remote.get(&id).await? {
                Some(mut doc) => {
                    doc.stats.recompute_level();
                    self.progress = doc;
                }
                None => {
                    tracing::info!("Creating progress document for {}", self.key);
                    self.progress = UserProgress::template(id, seed.username, seed.email);
                    self.commit(Mutation::Initialize, Vec::new()).await;
                }
            },
            AccountKey::Anonymous(id) => {
                let (mut doc, mut dirty) = match read_snapshot(&*self.local, &self.key).await {
                    Some(doc) if doc.merged_into.is_none() => (doc, false),
                    Some(handed) => {
                        tracing::info!(
                            "{} was handed to account {:?}; starting over",
                            self.key,
                            handed.merged_into
                        );
                        // The handed-over snapshot stays until this session first writes.
                        let mut fresh = UserProgress::template(id, seed.username, None);
                        fresh.merge_token = Some(Uuid::new_v4());
                        (fresh, false)
                    }
                    None => (UserProgress::template(id, seed.username, None), true),
                };
                if doc.merge_token.is_none() {
                    doc.merge_token = Some(Uuid::new_v4());
                    dirty = true;
                }
                doc.stats.recompute_level();
                self.progress = doc;
                if dirty {
                    self.commit(Mutation::Initialize, Vec::new()).await;
                }
            }
        }

        self.state = LoadState::Ready;
        Ok(())
    }

    /// Writes the whole document if anything is pending. Returns whether storage is up to date.
    pub async fn flush(&mut self) -> bool {
        let Some(head) = self.outbox.head() else {
            return true;
        };
        self.progress.last_mutation_id = Some(head);

        let result = match &self.key {
            AccountKey::Account(id) => self.remote.put(id, &self.progress).await,
            AccountKey::Anonymous(_) => write_snapshot(&*self.local, &self.key, &self.progress).await,
        };

        match result {
            Ok(()) => {
                self.outbox.settle(head);
                true
            }
            Err(e) => {
                self.outbox.mark_failed(&e.to_string());
                tracing::warn!(
                    "Failed to persist progress for {} ({} pending): {}",
                    self.key,
                    self.outbox.len(),
                    e
                );
                false
            }
        }
    }

    async fn commit(&mut self, mutation: Mutation, notifications: Vec<Notification>) -> MutationReport {
        let mutation_id = self.outbox.enqueue(mutation);
        let persisted = self.flush().await;
        MutationReport {
            mutation_id,
            persisted,
            notifications,
        }
    }

    /// Appends an attempt to its quiz set's history. Stats are left alone.
    pub async fn record_attempt(&mut self, attempt: Attempt) -> MutationReport {
        let quiz_set_id = attempt.quiz_set_id.clone();
        self.progress
            .attempts
            .entry(quiz_set_id.clone())
            .or_default()
            .push(attempt);

        self.commit(Mutation::RecordAttempt { quiz_set_id }, Vec::new()).await
    }

    /// Adds a grant to the counters and re-derives the level.
    /// Emits one `LevelUp` when the level rises.
    pub async fn grant_rewards(&mut self, grant: &RewardGrant) -> MutationReport {
        let previous = self.progress.stats.apply(grant);
        let level = self.progress.stats.level;

        let mut notifications = Vec::new();
        if level > previous {
            tracing::info!("{} reached level {}", self.key, level);
            notifications.push(Notification::LevelUp { level });
        }

        self.commit(Mutation::GrantRewards, notifications).await
    }

    /// Flips bookmark membership. Returns whether the question is now bookmarked.
    pub async fn toggle_bookmark(&mut self, question_id: &str) -> (bool, MutationReport) {
        let bookmarks = &mut self.progress.bookmarks;
        let bookmarked = match bookmarks.iter().position(|id| id == question_id) {
            Some(pos) => {
                bookmarks.remove(pos);
                false
            }
            None => {
                bookmarks.push(question_id.to_string());
                true
            }
        };

        let question_id = question_id.to_string();
        let notification = if bookmarked {
            Notification::BookmarkAdded { question_id: question_id.clone() }
        } else {
            Notification::BookmarkRemoved { question_id: question_id.clone() }
        };

        let report = self
            .commit(Mutation::ToggleBookmark { question_id }, vec![notification])
            .await;
        (bookmarked, report)
    }

    /// Adds a completed quiz set. `None` when it was already there.
    pub async fn mark_completed(&mut self, quiz_set_id: &str) -> Option<MutationReport> {
        if self.is_completed(quiz_set_id) {
            return None;
        }
        self.progress.completed_sets.push(quiz_set_id.to_string());

        Some(
            self.commit(
                Mutation::MarkCompleted {
                    quiz_set_id: quiz_set_id.to_string(),
                },
                Vec::new(),
            )
            .await,
        )
    }

    /// Hands this anonymous session's progress over to a merge into `account_id`.
    ///
    /// The snapshot is rewritten with its merge token and a `mergedInto` marker
    /// before anything is merged: a retry is recognised by the token, and a
    /// reopened anonymous session starts over instead of extending progress an
    /// account already holds. This session restarts from an empty template.
    pub async fn hand_over(&mut self, account_id: &str) -> Result<UserProgress, AppError> {
        if !self.key.is_anonymous() {
            return Err(AppError::BadRequest(
                "Only anonymous progress can be handed to an account".to_string(),
            ));
        }

        let head = self.outbox.head();
        let mut snapshot = self.progress.clone();
        snapshot.merge_token.get_or_insert_with(Uuid::new_v4);
        snapshot.merged_into = Some(account_id.to_string());
        if head.is_some() {
            snapshot.last_mutation_id = head;
        }
        write_snapshot(&*self.local, &self.key, &snapshot).await?;

        // The whole document just reached local storage.
        if let Some(head) = head {
            self.outbox.settle(head);
        }

        let mut fresh = UserProgress::template(
            self.key.id().to_string(),
            self.progress.username.clone(),
            None,
        );
        fresh.merge_token = Some(Uuid::new_v4());
        self.progress = fresh;

        tracing::debug!("{} handed over to account {}", self.key, account_id);
        Ok(snapshot)
    }

    /// Folds a handed-over anonymous snapshot into this account.
    ///
    /// The snapshot is discarded from local storage once the merged document
    /// has been written. While the write is pending it stays, and its merge
    /// token keeps a retry from counting it twice.
    pub async fn merge_anonymous_into_account(
        &mut self,
        anonymous_id: &str,
        snapshot: &UserProgress,
    ) -> Result<MergeReport, AppError> {
        if self.key.is_anonymous() {
            return Err(AppError::BadRequest(
                "Anonymous progress can only be merged into an account".to_string(),
            ));
        }
        let token = snapshot.merge_token.ok_or_else(|| {
            AppError::BadRequest("Anonymous progress carries no merge token".to_string())
        })?;

        let outcome = merge_anonymous(&mut self.progress, snapshot, token);
        let persisted = match outcome {
            MergeOutcome::Merged => {
                tracing::info!("Merged anonymous session {} into {}", anonymous_id, self.key);
                self.commit(Mutation::MergeAnonymous { token }, Vec::new())
                    .await
                    .persisted
            }
            MergeOutcome::AlreadyMerged => {
                tracing::info!(
                    "Anonymous session {} was already merged into {}",
                    anonymous_id,
                    self.key
                );
                self.flush().await
            }
        };

        if persisted {
            self.discard_snapshot(&AccountKey::Anonymous(anonymous_id.to_string()), token)
                .await;
        }

        Ok(MergeReport { outcome, persisted })
    }

    /// Removes the local snapshot if it is still the one carrying `token`.
    async fn discard_snapshot(&self, anonymous: &AccountKey, token: Uuid) {
        let current = read_snapshot(&*self.local, anonymous).await;
        if current.is_some_and(|doc| doc.merge_token != Some(token)) {
            tracing::debug!("{} has moved on since the merge; keeping its snapshot", anonymous);
            return;
        }
        if let Err(e) = self.local.remove_item(&anonymous.snapshot_key()).await {
            tracing::warn!("Failed to discard snapshot of {}: {}", anonymous, e);
        }
    }

    pub fn is_bookmarked(&self, question_id: &str) -> bool {
        self.progress.bookmarks.iter().any(|id| id == question_id)
    }

    pub fn is_completed(&self, quiz_set_id: &str) -> bool {
        self.progress.completed_sets.iter().any(|id| id == quiz_set_id)
    }

    pub fn bookmarks(&self) -> &[String] {
        &self.progress.bookmarks
    }

    pub fn best_score(&self, quiz_set_id: &str) -> Option<u32> {
        self.progress
            .attempts
            .get(quiz_set_id)?
            .iter()
            .map(|a| a.score)
            .max()
    }

    pub fn attempt_count(&self, quiz_set_id: &str) -> usize {
        self.progress.attempts.get(quiz_set_id).map_or(0, Vec::len)
    }

    /// Attempt with the latest timestamp; on a tie the one recorded last.
    pub fn last_attempt(&self, quiz_set_id: &str) -> Option<&Attempt> {
        self.progress
            .attempts
            .get(quiz_set_id)?
            .iter()
            .fold(None, |latest: Option<&Attempt>, a| match latest {
                Some(l) if l.timestamp > a.timestamp => Some(l),
                _ => Some(a),
            })
    }

    pub fn quiz_set_progress(&self, quiz_set_id: &str) -> QuizSetProgress {
        QuizSetProgress {
            quiz_set_id: quiz_set_id.to_string(),
            best_score: self.best_score(quiz_set_id),
            attempts_count: self.attempt_count(quiz_set_id),
            last_attempt: self.last_attempt(quiz_set_id).cloned(),
            completed: self.is_completed(quiz_set_id),
        }
    }

    /// Stored theme preference; unreadable or missing values fall back to `system`.
    pub async fn theme(&self) -> Theme {
        match self.local.get_item(&self.key.theme_key()).await {
            Ok(Some(raw)) => Theme::parse(&raw).unwrap_or_default(),
            Ok(None) => Theme::default(),
            Err(e) => {
                tracing::warn!("Failed to read theme for {}: {}", self.key, e);
                Theme::default()
            }
        }
    }

    pub async fn set_theme(&self, theme: Theme) -> Result<(), StoreError> {
        self.local
            .set_item(&self.key.theme_key(), theme.as_str())
            .await
    }

    /// Teardown: a final flush before the store is dropped.
    pub async fn close(mut self) -> bool {
        let flushed = self.flush().await;
        if !flushed {
            tracing::warn!(
                "Closing {} with {} unsaved mutation(s)",
                self.key,
                self.outbox.len()
            );
        }
        flushed
    }
}

/// Reads an anonymous snapshot. Missing and unreadable snapshots are `None`.
pub(crate) async fn read_snapshot(local: &dyn LocalStorage, key: &AccountKey) -> Option<UserProgress> {
    let raw = match local.get_item(&key.snapshot_key()).await {
        Ok(raw) => raw?,
        Err(e) => {
            tracing::warn!("Failed to read local snapshot for {}: {}", key, e);
            return None;
        }
    };

    match serde_json::from_str(&raw) {
        Ok(doc) => Some(doc),
        Err(e) => {
            tracing::warn!("Discarding unreadable local snapshot for {}: {}", key, e);
            None
        }
    }
}

pub(crate) async fn write_snapshot(
    local: &dyn LocalStorage,
    key: &AccountKey,
    doc: &UserProgress,
) -> Result<(), StoreError> {
    let raw = serde_json::to_string(doc)?;
    local.set_item(&key.snapshot_key(), &raw).await
}
