// src/handlers/mod.rs

pub mod advisor;
pub mod auth;
pub mod bookmarks;
pub mod content;
pub mod leaderboard;
pub mod profile;
pub mod progress;
pub mod quiz;

use uuid::Uuid;

use crate::{
    error::AppError,
    progress::{
        notification::{Notification, Toast},
        registry::SessionHandle,
        store::ProgressSeed,
    },
    state::AppState,
    utils::jwt::{Claims, SessionKind},
};

/// Resolves the live session behind a verified token, loading it on first use.
pub(crate) async fn open_session(state: &AppState, claims: &Claims) -> Result<SessionHandle, AppError> {
    let key = claims.account_key();
    if let Some(handle) = state.sessions.get(&key).await {
        return Ok(handle);
    }

    let seed = match claims.kind {
        SessionKind::Anonymous => ProgressSeed::anonymous(),
        SessionKind::Account => {
            let id = Uuid::parse_str(&claims.sub)
                .map_err(|_| AppError::AuthError("Invalid token".to_string()))?;
            let account = state
                .accounts
                .find_by_id(id)
                .await?
                .ok_or(AppError::AuthError("Account no longer exists".to_string()))?;
            ProgressSeed {
                username: account.username,
                email: Some(account.email),
            }
        }
    };

    state.sessions.open(key, seed).await
}

pub(crate) fn toasts(notifications: Vec<Notification>) -> Vec<Toast> {
    notifications.into_iter().map(Toast::from).collect()
}
