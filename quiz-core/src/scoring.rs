use quiz_types::{GameConfig, ScoringPolicy};

pub struct ScoringEngine;

impl ScoringEngine {
    /// Points for revealing a new letter
    pub fn letter_reward(config: &GameConfig) -> i32 {
        match config.scoring_policy {
            ScoringPolicy::Fixed => config.per_letter_reward,
            ScoringPolicy::TimeDecayed { .. } => 0,
        }
    }

    /// Points added when the last missing letter is revealed, given the
    /// score accumulated so far. Returns the final score of the round.
    pub fn settle_win(
        config: &GameConfig,
        accumulated: i32,
        attempts_used: u32,
        elapsed_seconds: u32,
    ) -> i32 {
        match config.scoring_policy {
            ScoringPolicy::Fixed => accumulated + config.completion_bonus,
            ScoringPolicy::TimeDecayed { .. } => {
                Self::time_decayed(config.scoring_policy, attempts_used, elapsed_seconds)
            }
        }
    }

    /// Final score of a lost round
    pub fn settle_loss(config: &GameConfig, accumulated: i32) -> i32 {
        match config.scoring_policy {
            ScoringPolicy::Fixed => accumulated,
            ScoringPolicy::TimeDecayed { .. } => 0,
        }
    }

    /// What a win would be worth right now
    pub fn projected(
        config: &GameConfig,
        accumulated: i32,
        attempts_used: u32,
        elapsed_seconds: u32,
    ) -> i32 {
        Self::settle_win(config, accumulated, attempts_used, elapsed_seconds)
    }

    /// `base - penalty * attempts + max(0, bonus - decay * elapsed)`, floored at zero.
    /// Non-increasing in both `attempts_used` and `elapsed_seconds`.
    pub fn time_decayed(policy: ScoringPolicy, attempts_used: u32, elapsed_seconds: u32) -> i32 {
        let ScoringPolicy::TimeDecayed {
            base_score,
            wrong_guess_penalty,
            time_bonus,
            bonus_decay_per_second,
        } = policy
        else {
            return 0;
        };

        let attempts = i64::from(attempts_used);
        let elapsed = i64::from(elapsed_seconds);
        let deduction = i64::from(wrong_guess_penalty.max(0)) * attempts;
        let bonus = (i64::from(time_bonus) - i64::from(bonus_decay_per_second.max(0)) * elapsed).max(0);
        let score = (i64::from(base_score) - deduction + bonus).max(0);

        i32::try_from(score).unwrap_or(i32::MAX)
    }
}
