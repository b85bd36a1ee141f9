// src/quiz/rewards.rs

use crate::{
    config::{
        BONUS_COINS_FOR_TIMELY_COMPLETION, COINS_PER_CORRECT_ANSWER, POINTS_PER_CORRECT_ANSWER,
        TIMELY_SECONDS_PER_QUESTION, XP_BONUS_FOR_PERFECT_SCORE, XP_PER_COMPLETED_SET,
    },
    models::progress::RewardGrant,
};

/// Rewards earned by one submitted set.
///
/// Points and coins scale with correct answers; coins get a bonus when the set
/// was finished inside the timely window with at least one correct answer.
/// XP is flat per set plus a perfect-score bonus.
pub fn rewards_for(score: u32, total_questions: usize, time_taken: u64) -> RewardGrant {
    let score = score as u64;
    let total = total_questions as u64;
    let perfect = total > 0 && score == total;
    let timely = score > 0 && time_taken <= total * TIMELY_SECONDS_PER_QUESTION;

    let mut coins = score * COINS_PER_CORRECT_ANSWER;
    if timely {
        coins += BONUS_COINS_FOR_TIMELY_COMPLETION;
    }

    let mut xp = XP_PER_COMPLETED_SET;
    if perfect {
        xp += XP_BONUS_FOR_PERFECT_SCORE;
    }

    RewardGrant {
        points: Some(score * POINTS_PER_CORRECT_ANSWER),
        coins: Some(coins),
        xp: Some(xp),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn perfect_and_timely() {
        let grant = rewards_for(5, 5, 40);
        assert_eq!(grant.points, Some(50));
        assert_eq!(grant.coins, Some(15));
        assert_eq!(grant.xp, Some(25));
    }

    #[test]
    fn slow_partial_set() {
        let grant = rewards_for(4, 5, 600);
        assert_eq!(grant.points, Some(40));
        assert_eq!(grant.coins, Some(8));
        assert_eq!(grant.xp, Some(15));
    }

    #[test]
    fn zero_score_gets_no_timely_bonus() {
        let grant = rewards_for(0, 5, 1);
        assert_eq!(grant.points, Some(0));
        assert_eq!(grant.coins, Some(0));
        assert_eq!(grant.xp, Some(15));
    }
}
