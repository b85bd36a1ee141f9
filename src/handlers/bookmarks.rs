use axum::{
    Extension, Json,
    extract::{Path, State},
    response::IntoResponse,
};
use serde_json::json;

use super::{open_session, toasts};
use crate::{
    error::AppError, models::content::BookmarkedQuestion, state::AppState, utils::jwt::Claims,
};

/// Bookmarked questions with answers and explanations, in bookmark order.
///
/// Ids no longer present in the catalog are skipped.
pub async fn list_bookmarks(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let handle = open_session(&state, &claims).await?;
    let session = handle.lock().await;

    let bookmarks: Vec<BookmarkedQuestion> = session
        .store
        .bookmarks()
        .iter()
        .filter_map(|id| state.catalog.question_by_id(id))
        .map(|(question, quiz_set)| BookmarkedQuestion {
            quiz_set_id: quiz_set.id.clone(),
            quiz_set_title: quiz_set.title.clone(),
            question: question.clone(),
        })
        .collect();

    Ok(Json(bookmarks))
}

/// Toggles a bookmark on a question.
pub async fn toggle_bookmark(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(question_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    if state.catalog.question_by_id(&question_id).is_none() {
        return Err(AppError::NotFound(format!(
            "Question '{}' not found",
            question_id
        )));
    }

    let handle = open_session(&state, &claims).await?;
    let mut session = handle.lock().await;
    let (bookmarked, report) = session.store.toggle_bookmark(&question_id).await;

    Ok(Json(json!({
        "questionId": question_id,
        "bookmarked": bookmarked,
        "mutationId": report.mutation_id,
        "persisted": report.persisted,
        "notifications": toasts(report.notifications),
    })))
}
