// src/progress/level.rs

use serde::Serialize;

/// Number of thresholds not exceeding `xp`, never below 1.
///
/// `thresholds` must be ascending and start at 0.
pub fn level_for_xp(xp: u64, thresholds: &[u64]) -> u32 {
    let reached = thresholds.iter().take_while(|&&t| xp >= t).count();
    reached.max(1) as u32
}

/// Where an XP total sits between two levels.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LevelProgress {
    pub level: u32,
    pub xp: u64,
    /// XP at which the current level started.
    pub level_floor: u64,
    /// XP needed for the next level; `None` at the top level.
    pub next_level_at: Option<u64>,
}

pub fn level_progress(xp: u64, thresholds: &[u64]) -> LevelProgress {
    let level = level_for_xp(xp, thresholds);
    let idx = level as usize - 1;

    LevelProgress {
        level,
        xp,
        level_floor: thresholds.get(idx).copied().unwrap_or(0),
        next_level_at: thresholds.get(idx + 1).copied(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LEVEL_THRESHOLDS;

    #[test]
    fn small_table_boundaries() {
        let t = [0, 100, 250];
        assert_eq!(level_for_xp(0, &t), 1);
        assert_eq!(level_for_xp(99, &t), 1);
        assert_eq!(level_for_xp(100, &t), 2);
        assert_eq!(level_for_xp(249, &t), 2);
        assert_eq!(level_for_xp(250, &t), 3);
        assert_eq!(level_for_xp(u64::MAX, &t), 3);
    }

    #[test]
    fn never_below_one() {
        assert_eq!(level_for_xp(0, &[]), 1);
        assert_eq!(level_for_xp(5, &[10, 20]), 1);
    }

    #[test]
    fn non_decreasing_over_xp() {
        let mut last = 0;
        for xp in (0..40_000).step_by(7) {
            let level = level_for_xp(xp, LEVEL_THRESHOLDS);
            assert!(level >= last, "level dropped at xp {}", xp);
            assert!(level >= 1);
            last = level;
        }
        assert_eq!(last as usize, LEVEL_THRESHOLDS.len());
    }

    #[test]
    fn progress_reports_next_threshold() {
        let p = level_progress(120, LEVEL_THRESHOLDS);
        assert_eq!(p.level, 2);
        assert_eq!(p.level_floor, 100);
        assert_eq!(p.next_level_at, Some(250));

        let top = level_progress(50_000, LEVEL_THRESHOLDS);
        assert_eq!(top.level, 10);
        assert_eq!(top.next_level_at, None);
    }
}
