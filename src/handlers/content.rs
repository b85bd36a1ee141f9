// src/handlers/content.rs

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, State},
    response::IntoResponse,
};
use serde_json::json;

use crate::{
    error::AppError,
    models::{
        content::{ChallengeType, PublicQuizSet, QuizSetSummary},
        results::{ResultsParams, ResultsView},
    },
    quiz::catalog::Catalog,
};

/// Lists every subject.
pub async fn list_subjects(State(catalog): State<Arc<Catalog>>) -> impl IntoResponse {
    Json(catalog.subjects().to_vec())
}

/// A subject and its chapters.
pub async fn get_subject(
    State(catalog): State<Arc<Catalog>>,
    Path(slug): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let subject = catalog
        .subject_by_slug(&slug)
        .ok_or(AppError::NotFound(format!("Subject '{}' not found", slug)))?;

    Ok(Json(json!({
        "subject": subject,
        "chapters": catalog.chapters_by_subject(&subject.id),
    })))
}

/// A chapter and the summaries of its quiz sets.
pub async fn get_chapter(
    State(catalog): State<Arc<Catalog>>,
    Path((slug, chapter_slug)): Path<(String, String)>,
) -> Result<impl IntoResponse, AppError> {
    let subject = catalog
        .subject_by_slug(&slug)
        .ok_or(AppError::NotFound(format!("Subject '{}' not found", slug)))?;
    let chapter = catalog
        .chapter_by_slug(&subject.id, &chapter_slug)
        .ok_or(AppError::NotFound(format!("Chapter '{}' not found", chapter_slug)))?;

    let quiz_sets: Vec<QuizSetSummary> = catalog
        .quiz_sets_by_chapter(&chapter.id)
        .into_iter()
        .map(QuizSetSummary::from)
        .collect();

    Ok(Json(json!({
        "subject": subject,
        "chapter": chapter,
        "quizSets": quiz_sets,
    })))
}

/// A quiz set with its questions. Answers and explanations are withheld.
pub async fn get_quiz_set(
    State(catalog): State<Arc<Catalog>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let quiz_set = catalog
        .quiz_set_by_id(&id)
        .ok_or(AppError::NotFound(format!("Quiz set '{}' not found", id)))?;

    Ok(Json(PublicQuizSet::from(quiz_set)))
}

pub async fn get_challenge(
    State(catalog): State<Arc<Catalog>>,
    Path(challenge): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let kind = ChallengeType::parse(&challenge)
        .ok_or(AppError::NotFound(format!("Challenge '{}' not found", challenge)))?;

    Ok(Json(json!({
        "type": kind,
        "title": Catalog::challenge_title(kind),
        "subjects": catalog.subjects(),
    })))
}

/// Per-question review of a finished attempt, rebuilt from the results link.
pub async fn get_results(
    State(catalog): State<Arc<Catalog>>,
    Path(id): Path<String>,
    Query(params): Query<ResultsParams>,
) -> Result<impl IntoResponse, AppError> {
    let quiz_set = catalog
        .quiz_set_by_id(&id)
        .ok_or(AppError::NotFound(format!("Quiz set '{}' not found", id)))?;

    let view = ResultsView::build(quiz_set, &params);
    if matches!(view, ResultsView::Pending) {
        tracing::debug!("Results link for {} is incomplete; serving pending view", id);
    }
    Ok(Json(view))
}
