use std::sync::Arc;

use axum::{
    Json,
    extract::{Query, State},
    response::IntoResponse,
};

use crate::{
    config::{LEADERBOARD_DEFAULT_LIMIT, LEADERBOARD_MAX_LIMIT},
    error::AppError,
    models::leaderboard::LeaderboardParams,
    storage::DocumentStore,
};

/// Get the leaderboard for a points period.
/// Only accounts appear; anonymous progress never reaches the document store.
pub async fn get_leaderboard(
    State(documents): State<Arc<dyn DocumentStore>>,
    Query(params): Query<LeaderboardParams>,
) -> Result<impl IntoResponse, AppError> {
    let limit = params
        .limit
        .unwrap_or(LEADERBOARD_DEFAULT_LIMIT)
        .clamp(1, LEADERBOARD_MAX_LIMIT);
    let period = params.period.unwrap_or_default();

    let entries = documents.top(period, limit).await?;

    Ok(Json(entries))
}
