// src/routes.rs

use axum::{
    Router,
    http::{HeaderValue, Method, header},
    middleware,
    routing::{get, post, put},
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    handlers::{advisor, auth, bookmarks, content, leaderboard, profile, progress, quiz},
    state::AppState,
    utils::jwt::auth_middleware,
};

/// Assembles the main application router.
///
/// * Public routes: sign-in, catalog, results review and leaderboard.
/// * Everything touching a session's progress sits behind `auth_middleware`.
/// * Applies global middleware (Trace, CORS).
pub fn create_router(state: AppState) -> Router {
    let origins = [
        HeaderValue::from_static("http://localhost:3000"),
        HeaderValue::from_static("http://127.0.0.1:3000"),
    ];

    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);

    let auth_routes = Router::new()
        .route("/anonymous", post(auth::anonymous_sign_in))
        .route("/signup", post(auth::signup))
        .route("/login", post(auth::login))
        .merge(
            Router::new()
                .route("/logout", post(auth::logout))
                .route("/me", get(auth::me))
                .layer(middleware::from_fn_with_state(state.clone(), auth_middleware)),
        );

    let catalog_routes = Router::new()
        .route("/subjects", get(content::list_subjects))
        .route("/subjects/{slug}", get(content::get_subject))
        .route("/subjects/{slug}/chapters/{chapter}", get(content::get_chapter))
        .route("/quiz-sets/{id}", get(content::get_quiz_set))
        .route("/quiz-sets/{id}/results", get(content::get_results))
        .route("/challenges/{challenge}", get(content::get_challenge))
        .route("/leaderboard", get(leaderboard::get_leaderboard));

    let session_routes = Router::new()
        .route("/progress", get(progress::get_progress))
        .route("/progress/quiz-sets/{id}", get(progress::get_quiz_set_progress))
        .route("/bookmarks", get(bookmarks::list_bookmarks))
        .route("/bookmarks/{question_id}", post(bookmarks::toggle_bookmark))
        .route("/profile", get(profile::get_profile))
        .route("/profile/theme", get(profile::get_theme).put(profile::set_theme))
        .route("/quiz-sets/{id}/session", post(quiz::start_quiz))
        .route("/quiz/session", get(quiz::current_quiz))
        .route("/quiz/session/answer", put(quiz::answer))
        .route("/quiz/session/next", post(quiz::next_question))
        .route("/quiz/session/submit", post(quiz::submit))
        .route("/difficulty/adjust", post(advisor::adjust_difficulty))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .nest("/api/auth", auth_routes)
        .nest("/api", catalog_routes.merge(session_routes))
        // Global Middleware (applied from outside in)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
