use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::{Timestamp, UserId};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct UserStats {
    pub total_score: i64,
    pub games_played: u32,
    pub highest_score: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct UserProfile {
    pub id: UserId,
    pub username: String,
    pub stats: UserStats,
    pub created_at: Timestamp,
}

/// A finished round in a player's history
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct GameRecord {
    pub id: String,
    pub user_id: UserId,
    pub score: i32,
    pub won: bool,
    pub word: String,
    pub timestamp: Timestamp,
}

/// A player's best recorded score. One per user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct LeaderboardEntry {
    pub id: String,
    pub user_id: UserId,
    pub username: String,
    pub score: i32,
    pub timestamp: Timestamp,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct RankedEntry {
    pub rank: u32,
    pub entry: LeaderboardEntry,
}

/// What recording an outcome did to the player's leaderboard entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum LeaderboardChange {
    Created,
    Raised { previous: i32 },
    Unchanged,
    Skipped, // zero score, nothing to rank
}
