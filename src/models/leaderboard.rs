// src/models/leaderboard.rs

use serde::{Deserialize, Serialize};

/// Which points counter ranks the leaderboard.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LeaderboardPeriod {
    #[default]
    All,
    Daily,
    Weekly,
    Monthly,
}

impl LeaderboardPeriod {
    /// JSON field inside `stats` holding the counter for this period.
    pub fn stats_field(&self) -> &'static str {
        match self {
            LeaderboardPeriod::All => "points",
            LeaderboardPeriod::Daily => "dailyPoints",
            LeaderboardPeriod::Weekly => "weeklyPoints",
            LeaderboardPeriod::Monthly => "monthlyPoints",
        }
    }

    pub fn points_of(&self, stats: &crate::models::progress::Stats) -> u64 {
        match self {
            LeaderboardPeriod::All => stats.points,
            LeaderboardPeriod::Daily => stats.daily_points,
            LeaderboardPeriod::Weekly => stats.weekly_points,
            LeaderboardPeriod::Monthly => stats.monthly_points,
        }
    }
}

/// Query parameters for the leaderboard.
#[derive(Debug, Deserialize)]
pub struct LeaderboardParams {
    pub period: Option<LeaderboardPeriod>,

    /// Number of entries to return (default: 50, max: 100).
    pub limit: Option<i64>,
}

/// One ranked row of the leaderboard.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntry {
    pub rank: usize,
    pub account_id: String,
    pub username: String,
    pub points: u64,
    pub level: u32,
}
