// src/storage/postgres.rs

use async_trait::async_trait;
use sqlx::{PgPool, types::Json};
use uuid::Uuid;

use super::{AccountStore, DocumentStore, StoreError, duplicate_email, rank};
use crate::models::{
    account::{Account, NewAccount},
    leaderboard::{LeaderboardEntry, LeaderboardPeriod},
    progress::UserProgress,
};

/// Progress documents in the `user_progress` JSONB table.
#[derive(Clone)]
pub struct PgDocumentStore {
    pool: PgPool,
}

impl PgDocumentStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DocumentStore for PgDocumentStore {
    async fn get(&self, account_id: &str) -> Result<Option<UserProgress>, StoreError> {
        let row: Option<(Json<UserProgress>,)> =
            sqlx::query_as("SELECT document FROM user_progress WHERE account_id = $1")
                .bind(account_id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(row.map(|(Json(doc),)| doc))
    }

    async fn put(&self, account_id: &str, document: &UserProgress) -> Result<(), StoreError> {
        // Whole-document upsert: last write wins.
        sqlx::query(
            r#"
            INSERT INTO user_progress (account_id, document, updated_at)
            VALUES ($1, $2, CURRENT_TIMESTAMP)
            ON CONFLICT (account_id) DO UPDATE SET
                document = EXCLUDED.document,
                updated_at = CURRENT_TIMESTAMP
            "#,
        )
        .bind(account_id)
        .bind(Json(document))
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn top(
        &self,
        period: LeaderboardPeriod,
        limit: i64,
    ) -> Result<Vec<LeaderboardEntry>, StoreError> {
        let sql = top_query(period);

        let rows: Vec<(String, Json<UserProgress>)> = sqlx::query_as(&sql)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        Ok(rank(rows.into_iter().map(|(account_id, Json(doc))| {
            LeaderboardEntry {
                rank: 0,
                account_id,
                points: period.points_of(&doc.stats),
                level: doc.stats.level,
                username: doc.username,
            }
        })))
    }
}

/// Ranking query for `period`. Ties go to the lower account id, as in the memory store.
fn top_query(period: LeaderboardPeriod) -> String {
    // The field name comes from a fixed match, never from user input.
    format!(
        r#"
        SELECT account_id, document
        FROM user_progress
        ORDER BY COALESCE((document->'stats'->>'{field}')::BIGINT, 0) DESC, account_id ASC
        LIMIT $1
        "#,
        field = period.stats_field()
    )
}

/// Accounts in the `accounts` table.
#[derive(Clone)]
pub struct PgAccountStore {
    pool: PgPool,
}

impl PgAccountStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AccountStore for PgAccountStore {
    async fn create(&self, account: NewAccount) -> Result<Account, StoreError> {
        sqlx::query_as::<_, Account>(
            r#"
            INSERT INTO accounts (id, username, email, password_hash)
            VALUES ($1, $2, $3, $4)
            RETURNING id, username, email, password_hash, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&account.username)
        .bind(&account.email)
        .bind(&account.password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db) if db.is_unique_violation() => duplicate_email(&account.email),
            _ => StoreError::from(e),
        })
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, StoreError> {
        let account = sqlx::query_as::<_, Account>(
            r#"
            SELECT id, username, email, password_hash, created_at
            FROM accounts
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(account)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Account>, StoreError> {
        let account = sqlx::query_as::<_, Account>(
            r#"
            SELECT id, username, email, password_hash, created_at
            FROM accounts
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(account)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ranking_breaks_ties_by_account_id() {
        let sql = top_query(LeaderboardPeriod::Weekly);
        assert!(sql.contains("'weeklyPoints'"));
        assert!(sql.contains("DESC, account_id ASC"));
        assert!(!sql.contains("updated_at"));
    }
}
