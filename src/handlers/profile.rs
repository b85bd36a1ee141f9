use axum::{Extension, Json, extract::State, response::IntoResponse};
use serde::Serialize;
use serde_json::json;

use super::open_session;
use crate::{
    config::LEVEL_THRESHOLDS,
    error::AppError,
    models::progress::{Stats, ThemeRequest},
    progress::level::{LevelProgress, level_progress},
    state::AppState,
    utils::jwt::Claims,
};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileResponse {
    pub id: String,
    pub username: String,
    pub email: Option<String>,
    pub anonymous: bool,
    pub stats: Stats,
    pub level_progress: LevelProgress,
    pub completed_sets_count: usize,
    pub total_attempts: usize,
    pub bookmarks_count: usize,
}

/// Get the current session's profile and statistics.
pub async fn get_profile(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let handle = open_session(&state, &claims).await?;
    let session = handle.lock().await;
    let progress = session.store.progress();

    Ok(Json(ProfileResponse {
        id: progress.id.clone(),
        username: progress.username.clone(),
        email: progress.email.clone(),
        anonymous: session.store.key().is_anonymous(),
        stats: progress.stats.clone(),
        level_progress: level_progress(progress.stats.xp, LEVEL_THRESHOLDS),
        completed_sets_count: progress.completed_sets.len(),
        total_attempts: progress.total_attempts(),
        bookmarks_count: progress.bookmarks.len(),
    }))
}

pub async fn get_theme(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let handle = open_session(&state, &claims).await?;
    let session = handle.lock().await;
    let theme = session.store.theme().await;

    Ok(Json(json!({ "theme": theme })))
}

/// Stores the theme preference in local storage.
pub async fn set_theme(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<ThemeRequest>,
) -> Result<impl IntoResponse, AppError> {
    let handle = open_session(&state, &claims).await?;
    let session = handle.lock().await;
    session.store.set_theme(payload.theme).await?;

    Ok(Json(json!({ "theme": payload.theme })))
}
