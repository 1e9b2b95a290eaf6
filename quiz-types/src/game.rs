use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::Timestamp;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum SessionStatus {
    Active, // Round in progress
    Won,    // Every letter revealed
    Lost,   // Out of attempts or out of time
}

impl SessionStatus {
    pub fn is_terminal(self) -> bool {
        !matches!(self, SessionStatus::Active)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum LossReason {
    OutOfAttempts,
    TimeExpired,
}

/// How a session turns guesses into points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum ScoringPolicy {
    /// Per-letter reward plus a completion bonus, accumulated as the round goes.
    Fixed,
    /// Settled once on a win: base score minus a deduction per wrong guess,
    /// plus a bonus that shrinks every elapsed second. Never below zero.
    TimeDecayed {
        base_score: i32,
        wrong_guess_penalty: i32,
        time_bonus: i32,
        bonus_decay_per_second: i32,
    },
}

impl ScoringPolicy {
    pub fn time_decayed() -> Self {
        ScoringPolicy::TimeDecayed {
            base_score: 100,
            wrong_guess_penalty: 10,
            time_bonus: 60,
            bonus_decay_per_second: 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct GameConfig {
    pub max_wrong_guesses: u32,
    pub per_letter_reward: i32,
    pub completion_bonus: i32,
    pub time_limit_seconds: u32,
    pub scoring_policy: ScoringPolicy,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            max_wrong_guesses: 3,
            per_letter_reward: 10,
            completion_bonus: 50,
            time_limit_seconds: 60,
            scoring_policy: ScoringPolicy::Fixed,
        }
    }
}

/// One position of the masked word
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum DisplayCell {
    Letter(char),
    Blank,
    Gap, // word separator, never hidden
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum GuessFeedback {
    Hit,
    Miss,
    Repeated,
    Inactive, // round already over
}

/// Client-facing snapshot of a round. The answer is only included once the
/// round is over.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SessionView {
    pub display: Vec<DisplayCell>,
    pub display_text: String,
    pub hint: String,
    pub category: Option<String>,
    pub guessed_letters: Vec<char>,
    pub attempts_used: u32,
    pub lives_remaining: u32,
    pub time_remaining_seconds: u32,
    pub score: i32,
    pub projected_score: i32,
    pub status: SessionStatus,
    pub loss_reason: Option<LossReason>,
    pub answer: Option<String>,
    pub started_at: Timestamp,
}
