use axum::{
    Extension, Json,
    extract::{Path, State},
    response::IntoResponse,
};
use serde_json::json;

use super::open_session;
use crate::{error::AppError, state::AppState, utils::jwt::Claims};

/// Full progress document plus load and outbox state.
pub async fn get_progress(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let handle = open_session(&state, &claims).await?;
    let session = handle.lock().await;
    let store = &session.store;

    Ok(Json(json!({
        "progress": store.progress(),
        "loading": store.is_loading(),
        "pendingWrites": store.pending_writes(),
    })))
}

/// Best score, attempt count, last attempt and completion for one quiz set.
pub async fn get_quiz_set_progress(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(quiz_set_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    if state.catalog.quiz_set_by_id(&quiz_set_id).is_none() {
        return Err(AppError::NotFound(format!(
            "Quiz set '{}' not found",
            quiz_set_id
        )));
    }

    let handle = open_session(&state, &claims).await?;
    let session = handle.lock().await;

    Ok(Json(session.store.quiz_set_progress(&quiz_set_id)))
}
