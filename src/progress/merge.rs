// src/progress/merge.rs

use serde::Serialize;
use uuid::Uuid;

use crate::models::progress::UserProgress;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum MergeOutcome {
    Merged,
    /// The snapshot's merge token was already recorded on the account.
    AlreadyMerged,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MergeReport {
    pub outcome: MergeOutcome,
    /// Whether the merged document reached the remote store.
    pub persisted: bool,
}

/// Folds an anonymous snapshot into an account's progress.
///
/// Counters are summed, bookmarks and completed sets are unioned with the
/// account's entries first, and attempts are appended after the account's
/// attempts for the same quiz set. The level is re-derived from the summed XP.
/// `token` identifies the snapshot; one already in `merged_tokens` changes nothing.
pub fn merge_anonymous(cloud: &mut UserProgress, anonymous: &UserProgress, token: Uuid) -> MergeOutcome {
    if cloud.merged_tokens.contains(&token) {
        return MergeOutcome::AlreadyMerged;
    }
    cloud.merged_tokens.push(token);

    let (c, a) = (&mut cloud.stats, &anonymous.stats);
    c.points = c.points.saturating_add(a.points);
    c.daily_points = c.daily_points.saturating_add(a.daily_points);
    c.weekly_points = c.weekly_points.saturating_add(a.weekly_points);
    c.monthly_points = c.monthly_points.saturating_add(a.monthly_points);
    c.coins = c.coins.saturating_add(a.coins);
    c.xp = c.xp.saturating_add(a.xp);
    c.recompute_level();

    union_into(&mut cloud.bookmarks, &anonymous.bookmarks);
    union_into(&mut cloud.completed_sets, &anonymous.completed_sets);

    for (quiz_set_id, attempts) in &anonymous.attempts {
        cloud
            .attempts
            .entry(quiz_set_id.clone())
            .or_default()
            .extend(attempts.iter().cloned());
    }

    MergeOutcome::Merged
}

fn union_into(target: &mut Vec<String>, extra: &[String]) {
    for id in extra {
        if !target.contains(id) {
            target.push(id.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::progress::{Attempt, RewardGrant};

    fn attempt(set: &str, score: u32, timestamp: i64) -> Attempt {
        Attempt {
            quiz_set_id: set.to_string(),
            score,
            time_taken: 30,
            accuracy: score as f64 * 20.0,
            timestamp,
            user_answers: vec![],
        }
    }

    fn anonymous() -> UserProgress {
        let mut anon = UserProgress::template("anon".into(), "Anonymous".into(), None);
        anon.merge_token = Some(Uuid::new_v4());
        anon
    }

    fn token(anon: &UserProgress) -> Uuid {
        anon.merge_token.unwrap()
    }

    #[test]
    fn sums_counters_and_recomputes_level() {
        let mut cloud = UserProgress::template("acc".into(), "Ana".into(), None);
        cloud.stats.apply(&RewardGrant { points: Some(50), coins: Some(4), xp: Some(90) });

        let mut anon = anonymous();
        anon.stats.apply(&RewardGrant { points: Some(30), coins: Some(1), xp: Some(20) });

        assert_eq!(merge_anonymous(&mut cloud, &anon, token(&anon)), MergeOutcome::Merged);
        assert_eq!(cloud.stats.points, 80);
        assert_eq!(cloud.stats.daily_points, 80);
        assert_eq!(cloud.stats.coins, 5);
        assert_eq!(cloud.stats.xp, 110);
        assert_eq!(cloud.stats.level, 2);
    }

    #[test]
    fn unions_sets_and_concatenates_attempts() {
        let mut cloud = UserProgress::template("acc".into(), "Ana".into(), None);
        cloud.bookmarks = vec!["q1".into(), "q2".into()];
        cloud.completed_sets = vec!["s1".into()];
        cloud.attempts.insert("s1".into(), vec![attempt("s1", 3, 10)]);

        let mut anon = anonymous();
        anon.bookmarks = vec!["q2".into(), "q3".into()];
        anon.completed_sets = vec!["s1".into(), "s2".into()];
        anon.attempts.insert("s1".into(), vec![attempt("s1", 5, 5)]);
        anon.attempts.insert("s2".into(), vec![attempt("s2", 1, 7)]);

        merge_anonymous(&mut cloud, &anon, token(&anon));

        assert_eq!(cloud.bookmarks, vec!["q1", "q2", "q3"]);
        assert_eq!(cloud.completed_sets, vec!["s1", "s2"]);
        let s1: Vec<u32> = cloud.attempts["s1"].iter().map(|a| a.score).collect();
        assert_eq!(s1, vec![3, 5]);
        assert_eq!(cloud.attempts["s2"].len(), 1);
    }

    #[test]
    fn zero_snapshot_leaves_stats_alone() {
        let mut cloud = UserProgress::template("acc".into(), "Ana".into(), None);
        cloud.stats.apply(&RewardGrant { points: Some(120), coins: Some(9), xp: Some(260) });
        let before = cloud.stats.clone();

        let anon = anonymous();
        merge_anonymous(&mut cloud, &anon, token(&anon));
        assert_eq!(cloud.stats, before);
    }

    #[test]
    fn second_merge_of_same_snapshot_is_noop() {
        let mut cloud = UserProgress::template("acc".into(), "Ana".into(), None);
        let mut anon = anonymous();
        anon.stats.apply(&RewardGrant { points: Some(10), coins: None, xp: Some(15) });
        anon.attempts.insert("s1".into(), vec![attempt("s1", 1, 1)]);

        assert_eq!(merge_anonymous(&mut cloud, &anon, token(&anon)), MergeOutcome::Merged);
        let once = cloud.clone();
        assert_eq!(merge_anonymous(&mut cloud, &anon, token(&anon)), MergeOutcome::AlreadyMerged);
        assert_eq!(cloud, once);
    }
}
