// src/main.rs

use dotenvy::dotenv;
use quizo::advisor::{DifficultyAdvisor, ThresholdAdvisor, llm::LlmAdvisor};
use quizo::config::Config;
use quizo::progress::registry::SessionRegistry;
use quizo::quiz::catalog::Catalog;
use quizo::routes;
use quizo::state::AppState;
use quizo::storage::{
    local::FileLocalStorage,
    postgres::{PgAccountStore, PgDocumentStore},
};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    // Load .env file (if present)
    dotenv().ok();

    // Load configuration from environment
    let config = Config::from_env();

    let file_appender = tracing_appender::rolling::daily("logs", "app.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);
    let env_filter = EnvFilter::new(&config.rust_log);
    let stdout_layer = fmt::layer().with_writer(std::io::stdout).with_target(false);
    let file_layer = fmt::layer().with_writer(non_blocking).with_ansi(false);

    // Initialize Tracing (Logging)
    tracing_subscriber::registry()
        .with(env_filter)
        .with(stdout_layer)
        .with(file_layer)
        .init();

    // A broken question bank is a deploy error; refuse to start.
    let catalog = Catalog::builtin().expect("Built-in question bank is invalid");
    tracing::info!(
        "Catalog loaded: {} subjects",
        catalog.subjects().len()
    );

    // Initialize Database Pool with Retry
    let mut retry_count = 0;
    let pool = loop {
        match PgPoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(3))
            .connect(&config.database_url)
            .await
        {
            Ok(pool) => break pool,
            Err(e) => {
                retry_count += 1;
                if retry_count > 5 {
                    panic!("Failed to connect to database after 5 retries: {}", e);
                }
                tracing::warn!("Database not ready, retrying in 2s... (Attempt {})", retry_count);
                tokio::time::sleep(Duration::from_secs(2)).await;
            }
        }
    };

    tracing::info!("Database connected...");

    // Run Migrations Automatically
    tracing::info!("Running migrations...");
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to run database migrations");
    tracing::info!("Migrations applied successfully.");

    let local = FileLocalStorage::open(&config.local_storage_dir)
        .await
        .expect("Failed to open local storage directory");

    let documents = Arc::new(PgDocumentStore::new(pool.clone()));
    let accounts = Arc::new(PgAccountStore::new(pool));

    let advisor: Arc<dyn DifficultyAdvisor> = match &config.advisor.api_key {
        Some(api_key) => {
            tracing::info!("Difficulty advisor: {}", config.advisor.model);
            let client = LlmAdvisor::client(config.advisor.timeout)
                .expect("Failed to build advisor HTTP client");
            Arc::new(LlmAdvisor::new(
                client,
                config.advisor.base_url.clone(),
                api_key.clone(),
                config.advisor.model.clone(),
            ))
        }
        None => {
            tracing::info!("No ADVISOR_API_KEY set; using threshold advisor");
            Arc::new(ThresholdAdvisor)
        }
    };

    let sessions = Arc::new(SessionRegistry::new(
        documents.clone(),
        Arc::new(local),
        config.progress_load_timeout,
    ));

    // Flush and drop sessions nobody has touched for a while.
    let sweep_period = (config.session_idle_timeout / 4).max(Duration::from_secs(1));
    sessions
        .clone()
        .spawn_sweeper(sweep_period, config.session_idle_timeout);

    // Create AppState
    let state = AppState {
        config: config.clone(),
        catalog: Arc::new(catalog),
        sessions,
        accounts,
        documents,
        advisor,
    };

    // Create the Axum application router
    let app = routes::create_router(state);

    tracing::info!("Listening on {}", config.bind_addr);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .expect("Failed to bind listen address");

    // Start the server
    axum::serve(listener, app).await.expect("Server error");
}
