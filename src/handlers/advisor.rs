use std::sync::Arc;

use axum::{Json, extract::State, response::IntoResponse};
use validator::Validate;

use crate::{
    advisor::{AdjustDifficultyRequest, DifficultyAdvisor},
    error::AppError,
};

/// Suggests the difficulty of the next quiz set from the last performance.
pub async fn adjust_difficulty(
    State(advisor): State<Arc<dyn DifficultyAdvisor>>,
    Json(payload): Json<AdjustDifficultyRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let response = advisor.adjust(&payload).await?;
    tracing::debug!(
        "Difficulty {} at {:.0}% -> {}",
        payload.current_difficulty,
        payload.user_performance,
        response.adjusted_difficulty
    );

    Ok(Json(response))
}
