// tests/api_tests.rs

use quizo::{
    advisor::ThresholdAdvisor,
    config::{AdvisorConfig, Config},
    progress::registry::SessionRegistry,
    quiz::catalog::Catalog,
    routes,
    state::AppState,
    storage::memory::{MemoryAccountStore, MemoryDocumentStore, MemoryLocalStorage},
};
use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use serde_json::{Value, json};
use std::{path::PathBuf, sync::Arc, time::Duration};
use tower::ServiceExt;

const GEO_SET: &str = "geo-c1-s1";
const GEO_SET_ANSWERS: [usize; 5] = [0, 3, 1, 1, 0];

struct TestApp {
    address: String,
    documents: Arc<MemoryDocumentStore>,
    client: reqwest::Client,
}

/// Application state backed by in-memory stores, so no database is needed.
fn test_state() -> (AppState, Arc<MemoryDocumentStore>) {
    let config = Config {
        database_url: String::new(),
        jwt_secret: "test_secret_for_integration_tests".to_string(),
        jwt_expiration: 600, // 10 minutes for tests
        rust_log: "error".to_string(),
        bind_addr: "127.0.0.1:0".to_string(),
        local_storage_dir: PathBuf::from("unused"),
        progress_load_timeout: Duration::from_secs(2),
        session_idle_timeout: Duration::from_secs(600),
        advisor: AdvisorConfig::default(),
    };

    let documents = Arc::new(MemoryDocumentStore::new());
    let sessions = SessionRegistry::new(
        documents.clone(),
        Arc::new(MemoryLocalStorage::new()),
        config.progress_load_timeout,
    );

    let state = AppState {
        config,
        catalog: Arc::new(Catalog::builtin().expect("built-in catalog is valid")),
        sessions: Arc::new(sessions),
        accounts: Arc::new(MemoryAccountStore::new()),
        documents: documents.clone(),
        advisor: Arc::new(ThresholdAdvisor),
    };

    (state, documents)
}

/// Helper function to spawn the app on a random port for testing.
async fn spawn_app() -> TestApp {
    let (state, documents) = test_state();
    let app = routes::create_router(state);

    // Bind to port 0 to get a random available port
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    TestApp {
        address: format!("http://127.0.0.1:{}", port),
        documents,
        client: reqwest::Client::new(),
    }
}

impl TestApp {
    fn url(&self, path: &str) -> String {
        format!("{}{}", self.address, path)
    }

    async fn get(&self, path: &str, token: &str) -> reqwest::Response {
        self.client
            .get(self.url(path))
            .bearer_auth(token)
            .send()
            .await
            .expect("Failed to execute request")
    }

    async fn post(&self, path: &str, token: &str, body: Value) -> reqwest::Response {
        self.client
            .post(self.url(path))
            .bearer_auth(token)
            .json(&body)
            .send()
            .await
            .expect("Failed to execute request")
    }

    async fn anonymous(&self) -> String {
        let res = self
            .client
            .post(self.url("/api/auth/anonymous"))
            .send()
            .await
            .expect("Failed to execute request");
        assert_eq!(res.status().as_u16(), 201);
        let body: Value = res.json().await.unwrap();
        assert_eq!(body["anonymous"], true);
        body["token"].as_str().unwrap().to_string()
    }

    async fn signup(&self, email: &str, anonymous_token: Option<&str>) -> reqwest::Response {
        let unique_name = format!("u_{}", &uuid::Uuid::new_v4().to_string()[..8]);
        let mut body = json!({
            "username": unique_name,
            "email": email,
            "password": "password123",
        });
        if let Some(token) = anonymous_token {
            body["anonymousToken"] = json!(token);
        }
        self.client
            .post(self.url("/api/auth/signup"))
            .json(&body)
            .send()
            .await
            .expect("Failed to execute request")
    }

    /// Plays a whole quiz set with the given selections and submits it.
    async fn play(&self, token: &str, quiz_set_id: &str, answers: &[usize]) -> Value {
        let res = self
            .post(&format!("/api/quiz-sets/{}/session", quiz_set_id), token, json!({}))
            .await;
        assert_eq!(res.status().as_u16(), 201);

        for (i, option) in answers.iter().enumerate() {
            let res = self
                .client
                .put(self.url("/api/quiz/session/answer"))
                .bearer_auth(token)
                .json(&json!({ "optionIndex": option }))
                .send()
                .await
                .unwrap();
            assert_eq!(res.status().as_u16(), 200);

            if i + 1 < answers.len() {
                let res = self.post("/api/quiz/session/next", token, json!({})).await;
                assert_eq!(res.status().as_u16(), 200);
            }
        }

        let res = self.post("/api/quiz/session/submit", token, json!({})).await;
        assert_eq!(res.status().as_u16(), 200);
        res.json().await.unwrap()
    }
}

#[tokio::test]
async fn health_check_404() {
    let app = spawn_app().await;

    let response = app
        .client
        .get(app.url("/random_path_that_does_not_exist"))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
async fn router_rejects_missing_token() {
    let (state, _) = test_state();
    let app = routes::create_router(state);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/quiz/session")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn protected_routes_require_a_token() {
    let app = spawn_app().await;

    let response = app.client.get(app.url("/api/progress")).send().await.unwrap();
    assert_eq!(response.status().as_u16(), 401);

    let response = app.get("/api/progress", "not-a-jwt").await;
    assert_eq!(response.status().as_u16(), 401);
}

#[tokio::test]
async fn catalog_hides_answers() {
    let app = spawn_app().await;

    let subjects: Value = app
        .client
        .get(app.url("/api/subjects"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(subjects.as_array().unwrap().len(), 2);

    let chapter: Value = app
        .client
        .get(app.url("/api/subjects/geography/chapters/world-climatic-regions"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(chapter["chapter"]["id"], "geo-c2");
    assert_eq!(chapter["quizSets"].as_array().unwrap().len(), 2);

    let set: Value = app
        .client
        .get(app.url(&format!("/api/quiz-sets/{}", GEO_SET)))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let first = &set["questions"][0];
    assert!(first.get("correctOptionIndex").is_none());
    assert!(first.get("explanation").is_none());

    let missing = app.client.get(app.url("/api/subjects/history")).send().await.unwrap();
    assert_eq!(missing.status().as_u16(), 404);

    let challenge: Value = app
        .client
        .get(app.url("/api/challenges/daily"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(challenge["type"], "daily");
}

#[tokio::test]
async fn perfect_quiz_grants_rewards_and_completes_set() {
    let app = spawn_app().await;
    let token = app.anonymous().await;

    let result = app.play(&token, GEO_SET, &GEO_SET_ANSWERS).await;
    assert_eq!(result["score"], 5);
    assert_eq!(result["accuracy"], 100.0);
    assert_eq!(result["perfect"], true);
    assert_eq!(result["rewards"]["points"], 50);
    assert_eq!(result["rewards"]["coins"], 15);
    assert_eq!(result["rewards"]["xp"], 25);
    assert_eq!(result["persisted"], true);

    let body: Value = app.get("/api/progress", &token).await.json().await.unwrap();
    assert_eq!(body["loading"], false);
    assert_eq!(body["pendingWrites"].as_array().unwrap().len(), 0);
    assert_eq!(body["progress"]["stats"]["points"], 50);
    assert_eq!(body["progress"]["stats"]["dailyPoints"], 50);
    assert_eq!(body["progress"]["stats"]["level"], 1);
    assert_eq!(body["progress"]["completedSets"], json!([GEO_SET]));

    let set: Value = app
        .get(&format!("/api/progress/quiz-sets/{}", GEO_SET), &token)
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(set["bestScore"], 5);
    assert_eq!(set["attemptsCount"], 1);
    assert_eq!(set["completed"], true);
    assert_eq!(set["lastAttempt"]["userAnswers"], json!(GEO_SET_ANSWERS));

    // Anonymous progress stays out of the remote store.
    assert_eq!(app.documents.len().await, 0);

    let again = app.post("/api/quiz/session/submit", &token, json!({})).await;
    assert_eq!(again.status().as_u16(), 400);
    let view: Value = app.get("/api/quiz/session", &token).await.json().await.unwrap();
    assert_eq!(view["session"]["submitted"], true);
}

#[tokio::test]
async fn four_of_five_scores_eighty_percent() {
    let app = spawn_app().await;
    let token = app.anonymous().await;

    let result = app.play(&token, GEO_SET, &[0, 3, 1, 1, 2]).await;
    assert_eq!(result["score"], 4);
    assert_eq!(result["accuracy"], 80.0);
    assert_eq!(result["perfect"], false);
    assert_eq!(result["rewards"]["xp"], 15);

    let set: Value = app
        .get(&format!("/api/progress/quiz-sets/{}", GEO_SET), &token)
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(set["completed"], false);
}

#[tokio::test]
async fn next_requires_a_selection() {
    let app = spawn_app().await;
    let token = app.anonymous().await;

    app.post(&format!("/api/quiz-sets/{}/session", GEO_SET), &token, json!({}))
        .await;

    let res = app.post("/api/quiz/session/next", &token, json!({})).await;
    assert_eq!(res.status().as_u16(), 400);

    let res = app
        .client
        .put(app.url("/api/quiz/session/answer"))
        .bearer_auth(&token)
        .json(&json!({ "optionIndex": 9 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status().as_u16(), 400);

    let view: Value = app.get("/api/quiz/session", &token).await.json().await.unwrap();
    assert_eq!(view["session"]["questionIndex"], 0);
    assert_eq!(view["session"]["canAdvance"], false);
}

#[tokio::test]
async fn results_link_rebuilds_review() {
    let app = spawn_app().await;
    let token = app.anonymous().await;

    let result = app.play(&token, GEO_SET, &[0, 3, 1, 1, 2]).await;
    let query = result["resultsQuery"].as_str().unwrap();

    let review: Value = app
        .client
        .get(app.url(&format!("/api/quiz-sets/{}/results?{}", GEO_SET, query)))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(review["status"], "ready");
    assert_eq!(review["score"], 4);
    let items = review["review"].as_array().unwrap();
    assert_eq!(items.len(), 5);
    assert_eq!(items[4]["isCorrect"], false);
    assert_eq!(items[4]["selectedOption"], 2);
    assert_eq!(items[4]["correctOptionIndex"], 0);
}

#[tokio::test]
async fn malformed_results_link_is_pending() {
    let app = spawn_app().await;

    for query in ["", "score=abc&total=5&time=10&answers=[]", "score=1&total=5&time=10&answers=oops"] {
        let res = app
            .client
            .get(app.url(&format!("/api/quiz-sets/{}/results?{}", GEO_SET, query)))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status().as_u16(), 200);
        let body: Value = res.json().await.unwrap();
        assert_eq!(body, json!({ "status": "pending" }));
    }
}

#[tokio::test]
async fn bookmark_toggled_twice_is_removed() {
    let app = spawn_app().await;
    let token = app.anonymous().await;
    let question = "geo-c1-s1-q1";

    let first: Value = app
        .post(&format!("/api/bookmarks/{}", question), &token, json!({}))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(first["bookmarked"], true);
    assert_eq!(first["notifications"][0]["title"], "Bookmarked!");
    assert_eq!(first["notifications"][0]["kind"], "bookmarkAdded");

    let list: Value = app.get("/api/bookmarks", &token).await.json().await.unwrap();
    assert_eq!(list.as_array().unwrap().len(), 1);
    assert_eq!(list[0]["quizSetId"], GEO_SET);
    assert_eq!(list[0]["question"]["correctOptionIndex"], 0);

    let second: Value = app
        .post(&format!("/api/bookmarks/{}", question), &token, json!({}))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(second["bookmarked"], false);
    assert_eq!(second["notifications"][0]["title"], "Bookmark Removed");

    let list: Value = app.get("/api/bookmarks", &token).await.json().await.unwrap();
    assert!(list.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn bookmarking_unknown_question_is_404() {
    let app = spawn_app().await;
    let token = app.anonymous().await;

    let res = app.post("/api/bookmarks/nope", &token, json!({})).await;
    assert_eq!(res.status().as_u16(), 404);
}

#[tokio::test]
async fn signup_merges_anonymous_progress_once() {
    let app = spawn_app().await;
    let anonymous = app.anonymous().await;

    app.play(&anonymous, GEO_SET, &GEO_SET_ANSWERS).await;
    app.post("/api/bookmarks/geo-c1-s1-q2", &anonymous, json!({})).await;

    let email = format!("{}@example.com", &uuid::Uuid::new_v4().to_string()[..8]);
    let res = app.signup(&email, Some(&anonymous)).await;
    assert_eq!(res.status().as_u16(), 201);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["merge"]["outcome"], "merged");
    assert_eq!(body["merge"]["persisted"], true);
    let token = body["token"].as_str().unwrap().to_string();

    let progress: Value = app.get("/api/progress", &token).await.json().await.unwrap();
    assert_eq!(progress["progress"]["stats"]["points"], 50);
    assert_eq!(progress["progress"]["bookmarks"], json!(["geo-c1-s1-q2"]));
    assert_eq!(progress["progress"]["completedSets"], json!([GEO_SET]));
    assert_eq!(app.documents.len().await, 1);

    // Logging in again with the same anonymous token finds nothing left to merge.
    let res = app
        .client
        .post(app.url("/api/auth/login"))
        .json(&json!({
            "email": email,
            "password": "password123",
            "anonymousToken": anonymous,
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status().as_u16(), 200);
    let body: Value = res.json().await.unwrap();
    assert!(body.get("merge").is_none());

    let progress: Value = app.get("/api/progress", &token).await.json().await.unwrap();
    assert_eq!(progress["progress"]["stats"]["points"], 50);

    let leaderboard: Value = app
        .client
        .get(app.url("/api/leaderboard?period=daily&limit=1000"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(leaderboard[0]["rank"], 1);
    assert_eq!(leaderboard[0]["points"], 50);
}

#[tokio::test]
async fn signup_rejects_duplicates_and_bad_input() {
    let app = spawn_app().await;
    let email = format!("{}@example.com", &uuid::Uuid::new_v4().to_string()[..8]);

    assert_eq!(app.signup(&email, None).await.status().as_u16(), 201);
    assert_eq!(app.signup(&email, None).await.status().as_u16(), 409);

    let res = app
        .client
        .post(app.url("/api/auth/signup"))
        .json(&json!({ "username": "yo", "email": "yo@example.com", "password": "password123" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status().as_u16(), 400);

    let res = app
        .client
        .post(app.url("/api/auth/login"))
        .json(&json!({ "email": email, "password": "wrong-password" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status().as_u16(), 401);
}

#[tokio::test]
async fn failed_writes_wait_in_outbox_until_next_flush() {
    let app = spawn_app().await;
    let email = format!("{}@example.com", &uuid::Uuid::new_v4().to_string()[..8]);
    let body: Value = app.signup(&email, None).await.json().await.unwrap();
    let token = body["token"].as_str().unwrap().to_string();

    app.documents.set_fail_writes(true);
    let res: Value = app
        .post("/api/bookmarks/geo-c1-s1-q1", &token, json!({}))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(res["bookmarked"], true);
    assert_eq!(res["persisted"], false);

    let progress: Value = app.get("/api/progress", &token).await.json().await.unwrap();
    let pending = progress["pendingWrites"].as_array().unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0]["mutation"]["type"], "toggleBookmark");
    assert_eq!(pending[0]["retries"], 1);

    app.documents.set_fail_writes(false);
    let res: Value = app
        .post("/api/bookmarks/geo-c1-s1-q2", &token, json!({}))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(res["persisted"], true);

    let progress: Value = app.get("/api/progress", &token).await.json().await.unwrap();
    assert!(progress["pendingWrites"].as_array().unwrap().is_empty());
    assert_eq!(
        progress["progress"]["lastMutationId"],
        res["mutationId"]
    );
}

#[tokio::test]
async fn unreadable_document_is_503_then_recovers() {
    let app = spawn_app().await;
    let email = format!("{}@example.com", &uuid::Uuid::new_v4().to_string()[..8]);
    let body: Value = app.signup(&email, None).await.json().await.unwrap();
    let token = body["token"].as_str().unwrap().to_string();

    app.post("/api/bookmarks/geo-c1-s1-q1", &token, json!({})).await;
    let res = app.post("/api/auth/logout", &token, json!({})).await;
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["persisted"], true);

    app.documents.set_fail_reads(true);
    let res = app.get("/api/progress", &token).await;
    assert_eq!(res.status().as_u16(), 503);

    app.documents.set_fail_reads(false);
    let progress: Value = app.get("/api/progress", &token).await.json().await.unwrap();
    assert_eq!(progress["progress"]["bookmarks"], json!(["geo-c1-s1-q1"]));
}

#[tokio::test]
async fn theme_preference_round_trips() {
    let app = spawn_app().await;
    let token = app.anonymous().await;

    let body: Value = app.get("/api/profile/theme", &token).await.json().await.unwrap();
    assert_eq!(body["theme"], "system");

    let res = app
        .client
        .put(app.url("/api/profile/theme"))
        .bearer_auth(&token)
        .json(&json!({ "theme": "dark" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status().as_u16(), 200);

    let body: Value = app.get("/api/profile/theme", &token).await.json().await.unwrap();
    assert_eq!(body["theme"], "dark");
}

#[tokio::test]
async fn profile_reports_level_progress() {
    let app = spawn_app().await;
    let token = app.anonymous().await;
    app.play(&token, GEO_SET, &GEO_SET_ANSWERS).await;

    let profile: Value = app.get("/api/profile", &token).await.json().await.unwrap();
    assert_eq!(profile["anonymous"], true);
    assert_eq!(profile["levelProgress"]["level"], 1);
    assert_eq!(profile["levelProgress"]["xp"], 25);
    assert_eq!(profile["levelProgress"]["nextLevelAt"], 100);
    assert_eq!(profile["completedSetsCount"], 1);
    assert_eq!(profile["totalAttempts"], 1);
}

#[tokio::test]
async fn difficulty_adjusts_by_performance() {
    let app = spawn_app().await;
    let token = app.anonymous().await;

    let body: Value = app
        .post(
            "/api/difficulty/adjust",
            &token,
            json!({ "userPerformance": 95.0, "currentDifficulty": "Easy" }),
        )
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(body["adjustedDifficulty"], "Medium");

    let res = app
        .post(
            "/api/difficulty/adjust",
            &token,
            json!({ "userPerformance": 150.0, "currentDifficulty": "Easy" }),
        )
        .await;
    assert_eq!(res.status().as_u16(), 400);
}
