// src/models/progress.rs

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{config::LEVEL_THRESHOLDS, progress::level::level_for_xp};

/// Display name given to progress that does not belong to an account yet.
pub const ANONYMOUS_USERNAME: &str = "Anonymous";

/// The per-account progress document.
/// Stored verbatim (camelCase JSON) in `user_progress.document` and in local snapshots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserProgress {
    pub id: String,
    pub username: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub stats: Stats,

    /// Attempts per quiz set, in the order they were recorded.
    pub attempts: BTreeMap<String, Vec<Attempt>>,

    /// Bookmarked question ids. Unique, insertion ordered.
    pub bookmarks: Vec<String>,

    /// Quiz sets finished with a perfect score. Unique, insertion ordered.
    pub completed_sets: Vec<String>,

    /// One-time token carried by anonymous snapshots so a merge can be detected twice.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub merge_token: Option<Uuid>,

    /// Set on an anonymous snapshot once it has been handed to an account merge.
    /// A session reopening such a snapshot starts over instead of extending it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub merged_into: Option<String>,

    /// Tokens of anonymous snapshots already merged into this account.
    pub merged_tokens: Vec<Uuid>,

    /// Idempotency key of the last mutation written to storage.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_mutation_id: Option<Uuid>,
}

impl Default for UserProgress {
    fn default() -> Self {
        Self::template(String::new(), ANONYMOUS_USERNAME.to_string(), None)
    }
}

impl UserProgress {
    /// Fresh progress for a newly seen account or anonymous session.
    pub fn template(id: String, username: String, email: Option<String>) -> Self {
        Self {
            id,
            username,
            email,
            stats: Stats::default(),
            attempts: BTreeMap::new(),
            bookmarks: Vec::new(),
            completed_sets: Vec::new(),
            merge_token: None,
            merged_into: None,
            merged_tokens: Vec::new(),
            last_mutation_id: None,
        }
    }

    pub fn total_attempts(&self) -> usize {
        self.attempts.values().map(Vec::len).sum()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Stats {
    pub points: u64,
    pub daily_points: u64,
    pub weekly_points: u64,
    pub monthly_points: u64,
    pub coins: u64,
    pub xp: u64,
    /// Cached `level_for_xp(xp)`; recomputed on every XP change.
    pub level: u32,
}

impl Default for Stats {
    fn default() -> Self {
        Self {
            points: 0,
            daily_points: 0,
            weekly_points: 0,
            monthly_points: 0,
            coins: 0,
            xp: 0,
            level: 1,
        }
    }
}

impl Stats {
    /// Adds a grant to the cumulative counters and the rolling point windows,
    /// then re-derives the level. Returns the level before the grant.
    pub fn apply(&mut self, grant: &RewardGrant) -> u32 {
        let previous = self.level;
        let points = grant.points.unwrap_or(0);

        self.points = self.points.saturating_add(points);
        self.daily_points = self.daily_points.saturating_add(points);
        self.weekly_points = self.weekly_points.saturating_add(points);
        self.monthly_points = self.monthly_points.saturating_add(points);
        self.coins = self.coins.saturating_add(grant.coins.unwrap_or(0));
        self.xp = self.xp.saturating_add(grant.xp.unwrap_or(0));
        self.recompute_level();

        previous
    }

    pub fn recompute_level(&mut self) {
        self.level = level_for_xp(self.xp, LEVEL_THRESHOLDS);
    }
}

/// One finished quiz-set attempt. Never mutated after it is recorded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attempt {
    pub quiz_set_id: String,
    pub score: u32,
    /// Seconds between session start and submission.
    pub time_taken: u64,
    /// Percentage of correct answers, 0-100.
    pub accuracy: f64,
    /// Unix timestamp in milliseconds.
    pub timestamp: i64,
    #[serde(default)]
    pub user_answers: Vec<Option<usize>>,
}

/// Externally granted rewards; absent fields count as zero.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RewardGrant {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub points: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coins: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub xp: Option<u64>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Light,
    Dark,
    #[default]
    System,
}

impl Theme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
            Theme::System => "system",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            "light" => Some(Theme::Light),
            "dark" => Some(Theme::Dark),
            "system" => Some(Theme::System),
            _ => None,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ThemeRequest {
    pub theme: Theme,
}

/// Per-quiz-set summary derived from the attempt history.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizSetProgress {
    pub quiz_set_id: String,
    pub best_score: Option<u32>,
    pub attempts_count: usize,
    pub last_attempt: Option<Attempt>,
    pub completed: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_fall_back_to_template() {
        let doc: UserProgress =
            serde_json::from_str(r#"{"id":"abc","username":"Ana","stats":{"points":5}}"#).unwrap();
        assert_eq!(doc.stats.points, 5);
        assert_eq!(doc.stats.level, 1);
        assert!(doc.attempts.is_empty());
        assert!(doc.merged_tokens.is_empty());
    }

    #[test]
    fn apply_feeds_every_points_window() {
        let mut stats = Stats::default();
        stats.apply(&RewardGrant { points: Some(40), coins: Some(3), xp: None });
        assert_eq!(stats.points, 40);
        assert_eq!(stats.daily_points, 40);
        assert_eq!(stats.weekly_points, 40);
        assert_eq!(stats.monthly_points, 40);
        assert_eq!(stats.coins, 3);
        assert_eq!(stats.xp, 0);
    }

    #[test]
    fn theme_parses_known_labels_only() {
        assert_eq!(Theme::parse("dark"), Some(Theme::Dark));
        assert_eq!(Theme::parse("neon"), None);
    }
}
