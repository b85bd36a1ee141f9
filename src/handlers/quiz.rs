// src/handlers/quiz.rs

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use super::{open_session, toasts};
use crate::{
    error::AppError,
    models::progress::RewardGrant,
    progress::{notification::Toast, registry::Session},
    quiz::session::{QuizOutcome, QuizSession},
    state::AppState,
    utils::jwt::Claims,
};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerRequest {
    pub option_index: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitResponse {
    pub quiz_set_id: String,
    pub score: u32,
    pub total_questions: usize,
    pub accuracy: f64,
    pub time_taken: u64,
    pub perfect: bool,
    pub rewards: RewardGrant,
    /// False when at least one write is waiting in the outbox.
    pub persisted: bool,
    pub notifications: Vec<Toast>,
    /// Query string for `GET /api/quiz-sets/{id}/results`.
    pub results_query: String,
}

fn session_payload(session: &Session) -> Result<Value, AppError> {
    let quiz = session
        .quiz
        .as_ref()
        .ok_or(AppError::NotFound("No quiz in progress".to_string()))?;
    let view = quiz.view();
    let bookmarked = session.store.is_bookmarked(&view.question.id);

    Ok(json!({
        "session": view,
        "bookmarked": bookmarked,
    }))
}

/// Starts a quiz on the given set, replacing any unfinished one.
pub async fn start_quiz(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(quiz_set_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let quiz_set = state
        .catalog
        .quiz_set_by_id(&quiz_set_id)
        .ok_or(AppError::NotFound(format!("Quiz set '{}' not found", quiz_set_id)))?
        .clone();

    let handle = open_session(&state, &claims).await?;
    let mut session = handle.lock().await;

    if session.quiz.as_ref().is_some_and(|q| !q.is_submitted()) {
        tracing::debug!("Discarding unfinished quiz for {}", claims.account_key());
    }
    session.quiz = Some(QuizSession::start(quiz_set, Utc::now())?);

    Ok((StatusCode::CREATED, Json(session_payload(&session)?)))
}

pub async fn current_quiz(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let handle = open_session(&state, &claims).await?;
    let session = handle.lock().await;
    Ok(Json(session_payload(&session)?))
}

/// Selects an option for the current question. Reselecting overwrites.
pub async fn answer(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<AnswerRequest>,
) -> Result<impl IntoResponse, AppError> {
    let handle = open_session(&state, &claims).await?;
    let mut session = handle.lock().await;

    session
        .quiz
        .as_mut()
        .ok_or(AppError::NotFound("No quiz in progress".to_string()))?
        .select(payload.option_index)?;

    Ok(Json(session_payload(&session)?))
}

pub async fn next_question(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let handle = open_session(&state, &claims).await?;
    let mut session = handle.lock().await;

    session
        .quiz
        .as_mut()
        .ok_or(AppError::NotFound("No quiz in progress".to_string()))?
        .next()?;

    Ok(Json(session_payload(&session)?))
}

/// Scores the quiz and records it. The submitted quiz stays in the session,
/// so a repeated submit is rejected instead of counted twice.
///
/// The attempt is recorded, rewards granted and, on a perfect score, the set
/// marked completed. Each write is independent: a failure leaves it in the
/// outbox and the submission still succeeds.
pub async fn submit(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let handle = open_session(&state, &claims).await?;
    let mut session = handle.lock().await;

    let outcome = session
        .quiz
        .as_mut()
        .ok_or(AppError::NotFound("No quiz in progress".to_string()))?
        .submit(Utc::now())?;

    let QuizOutcome {
        attempt,
        rewards,
        total_questions,
        perfect,
    } = outcome;

    let results_query = results_query(
        attempt.score,
        total_questions,
        attempt.time_taken,
        &attempt.user_answers,
    )?;
    let quiz_set_id = attempt.quiz_set_id.clone();
    let score = attempt.score;
    let accuracy = attempt.accuracy;
    let time_taken = attempt.time_taken;

    let mut persisted = true;
    let mut notifications = Vec::new();

    let report = session.store.record_attempt(attempt).await;
    persisted &= report.persisted;
    notifications.extend(report.notifications);

    let report = session.store.grant_rewards(&rewards).await;
    persisted &= report.persisted;
    notifications.extend(report.notifications);

    if perfect {
        if let Some(report) = session.store.mark_completed(&quiz_set_id).await {
            persisted &= report.persisted;
            notifications.extend(report.notifications);
        }
    }

    tracing::info!(
        "{} scored {}/{} on {}",
        claims.account_key(),
        score,
        total_questions,
        quiz_set_id
    );

    Ok(Json(SubmitResponse {
        quiz_set_id,
        score,
        total_questions,
        accuracy,
        time_taken,
        perfect,
        rewards,
        persisted,
        notifications: toasts(notifications),
        results_query,
    }))
}

fn results_query(
    score: u32,
    total: usize,
    time_taken: u64,
    answers: &[Option<usize>],
) -> Result<String, AppError> {
    let answers = serde_json::to_string(answers)
        .map_err(|e| AppError::InternalServerError(format!("Failed to encode answers: {}", e)))?;

    Ok(url::form_urlencoded::Serializer::new(String::new())
        .append_pair("score", &score.to_string())
        .append_pair("total", &total.to_string())
        .append_pair("time", &time_taken.to_string())
        .append_pair("answers", &answers)
        .finish())
}
