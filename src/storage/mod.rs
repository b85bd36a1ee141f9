// src/storage/mod.rs

//! Persistence seams: the remote per-account document store, the account
//! directory used for sign-in, and the local key-value storage that holds
//! anonymous snapshots and preferences.

pub mod local;
pub mod memory;
pub mod postgres;

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{
    account::{Account, NewAccount},
    leaderboard::{LeaderboardEntry, LeaderboardPeriod},
    progress::UserProgress,
};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed document: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("{0}")]
    Conflict(String),

    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("timed out after {0:?}")]
    Timeout(Duration),
}

/// One JSON document per account, keyed by account id. Writes replace the whole document.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn get(&self, account_id: &str) -> Result<Option<UserProgress>, StoreError>;

    async fn put(&self, account_id: &str, document: &UserProgress) -> Result<(), StoreError>;

    /// Accounts ordered by the period's points counter, highest first.
    async fn top(
        &self,
        period: LeaderboardPeriod,
        limit: i64,
    ) -> Result<Vec<LeaderboardEntry>, StoreError>;
}

#[async_trait]
pub trait AccountStore: Send + Sync {
    /// Fails with `StoreError::Conflict` when the email is taken.
    async fn create(&self, account: NewAccount) -> Result<Account, StoreError>;

    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, StoreError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Account>, StoreError>;
}

/// String key-value storage with browser local-storage semantics.
#[async_trait]
pub trait LocalStorage: Send + Sync {
    async fn get_item(&self, key: &str) -> Result<Option<String>, StoreError>;

    async fn set_item(&self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Removing a missing key is not an error.
    async fn remove_item(&self, key: &str) -> Result<(), StoreError>;
}

pub(crate) fn duplicate_email(email: &str) -> StoreError {
    StoreError::Conflict(format!("An account with email '{}' already exists", email))
}

/// Assigns ranks in order.
pub(crate) fn rank(entries: impl IntoIterator<Item = LeaderboardEntry>) -> Vec<LeaderboardEntry> {
    entries
        .into_iter()
        .enumerate()
        .map(|(i, mut e)| {
            e.rank = i + 1;
            e
        })
        .collect()
}
