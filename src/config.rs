// src/config.rs

use std::{env, path::PathBuf, time::Duration};

use dotenvy::dotenv;
use url::Url;

/// Points awarded for each correct answer in a submitted set.
pub const POINTS_PER_CORRECT_ANSWER: u64 = 10;

/// Coins awarded for each correct answer in a submitted set.
pub const COINS_PER_CORRECT_ANSWER: u64 = 2;

/// Extra coins when a set is finished inside the timely window.
pub const BONUS_COINS_FOR_TIMELY_COMPLETION: u64 = 5;

/// Seconds allowed per question for the timely-completion bonus.
pub const TIMELY_SECONDS_PER_QUESTION: u64 = 30;

pub const XP_PER_COMPLETED_SET: u64 = 15;
pub const XP_BONUS_FOR_PERFECT_SCORE: u64 = 10;

/// Ascending XP thresholds; level N starts at `LEVEL_THRESHOLDS[N - 1]`.
pub const LEVEL_THRESHOLDS: &[u64] = &[0, 100, 250, 500, 1000, 2000, 4000, 8000, 16000, 32000];

pub const LEADERBOARD_DEFAULT_LIMIT: i64 = 50;
pub const LEADERBOARD_MAX_LIMIT: i64 = 100;

/// Local storage key prefix for anonymous progress snapshots.
pub const ANONYMOUS_SNAPSHOT_KEY: &str = "quizo_userData";

/// Local storage key prefix for the theme preference.
pub const THEME_KEY: &str = "quizo_theme";

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    /// Token lifetime in seconds.
    pub jwt_expiration: u64,
    pub rust_log: String,
    pub bind_addr: String,
    pub local_storage_dir: PathBuf,
    pub progress_load_timeout: Duration,
    /// Sessions untouched for this long are flushed and dropped.
    pub session_idle_timeout: Duration,
    pub advisor: AdvisorConfig,
}

/// Connection settings for the hosted difficulty advisor.
/// Without an API key the local threshold advisor is used.
#[derive(Debug, Clone)]
pub struct AdvisorConfig {
    pub base_url: Url,
    pub api_key: Option<String>,
    pub model: String,
    pub timeout: Duration,
}

impl Default for AdvisorConfig {
    fn default() -> Self {
        Self {
            base_url: Url::parse("https://api.openai.com/v1").expect("static url is valid"),
            api_key: None,
            model: "gpt-4o-mini".to_string(),
            timeout: Duration::from_secs(20),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        dotenv().ok();

        let database_url = env::var("DATABASE_URL")
            .expect("DATABASE_URL must be set");

        let jwt_secret = env::var("JWT_SECRET")
            .expect("JWT_SECRET must be set");

        let jwt_expiration = env::var("JWT_EXPIRATION")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(86_400);

        let rust_log = env::var("RUST_LOG")
            .unwrap_or_else(|_| "info".to_string());

        let bind_addr = env::var("BIND_ADDR")
            .unwrap_or_else(|_| "0.0.0.0:3000".to_string());

        let local_storage_dir = env::var("LOCAL_STORAGE_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("data/local"));

        let progress_load_timeout = env::var("PROGRESS_LOAD_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .map(Duration::from_secs)
            .unwrap_or(Duration::from_secs(5));

        let session_idle_timeout = env::var("SESSION_IDLE_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .map(Duration::from_secs)
            .unwrap_or(Duration::from_secs(30 * 60));

        let mut advisor = AdvisorConfig::default();
        if let Ok(raw) = env::var("ADVISOR_BASE_URL") {
            advisor.base_url = Url::parse(&raw).expect("ADVISOR_BASE_URL must be a valid URL");
        }
        advisor.api_key = env::var("ADVISOR_API_KEY").ok().filter(|k| !k.is_empty());
        if let Ok(model) = env::var("ADVISOR_MODEL") {
            advisor.model = model;
        }
        if let Some(secs) = env::var("ADVISOR_TIMEOUT_SECS").ok().and_then(|v| v.parse().ok()) {
            advisor.timeout = Duration::from_secs(secs);
        }

        Self {
            database_url,
            jwt_secret,
            jwt_expiration,
            rust_log,
            bind_addr,
            local_storage_dir,
            progress_load_timeout,
            session_idle_timeout,
            advisor,
        }
    }
}
