use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::{GuessFeedback, LeaderboardChange, SessionView, UserId, UserStats};

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct GuessRequest {
    pub letter: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct OutcomeSummary {
    pub stats: UserStats,
    pub leaderboard: LeaderboardChange,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct GuessResponse {
    pub feedback: GuessFeedback,
    pub session: SessionView,
    /// Present on the guess that ended the round, once it has been recorded
    pub recorded: Option<OutcomeSummary>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct UserStatsResponse {
    pub user_id: UserId,
    pub stats: UserStats,
    pub rank: Option<u32>,
}
