// src/models/account.rs

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

/// Letters, digits, spaces and a few separators.
static USERNAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[\p{L}\p{N} _.\-]+$").expect("username pattern compiles"));

/// Represents the 'accounts' table in the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub id: Uuid,

    /// Display name shown on the leaderboard. Not unique.
    pub username: String,

    /// Unique sign-in email.
    pub email: String,

    /// Argon2 password hash.
    /// Skipped during serialization to prevent leaking sensitive data.
    #[serde(skip)]
    pub password_hash: String,

    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// Input for `AccountStore::create`.
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub username: String,
    pub email: String,
    pub password_hash: String,
}

/// DTO for email/password sign-up.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SignupRequest {
    #[validate(
        length(min = 3, max = 20, message = "Username must be between 3 and 20 characters."),
        regex(path = *USERNAME_RE, message = "Username contains unsupported characters.")
    )]
    pub username: String,
    #[validate(email(message = "Please enter a valid email."))]
    pub email: String,
    #[validate(length(min = 6, max = 128, message = "Password must be at least 6 characters."))]
    pub password: String,

    /// Token of the anonymous session whose progress should move into the new account.
    pub anonymous_token: Option<String>,
}

/// DTO for email/password sign-in.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1, max = 128))]
    pub password: String,
    pub anonymous_token: Option<String>,
}

/// Returned by sign-in endpoints.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    pub token: String,
    #[serde(rename = "type")]
    pub token_type: &'static str,
    pub anonymous: bool,
    pub account: Option<Account>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub merge: Option<crate::progress::merge::MergeReport>,
}
