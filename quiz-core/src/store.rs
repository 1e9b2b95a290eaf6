//! Interfaces of the stores the game relies on.
//!
//! Implementations live outside the core: an in-memory store for tests and
//! development, and the SQL repositories in `quiz-persistence`. Methods
//! return `anyhow::Result`; callers attach the failed step.

use anyhow::Result;
use async_trait::async_trait;
use quiz_types::{
    GameRecord, LeaderboardChange, LeaderboardEntry, NewQuestion, Question, QuestionPatch,
    Timestamp, UserId, UserProfile, UserStats,
};

#[async_trait]
pub trait QuestionStore: Send + Sync {
    async fn list_all(&self) -> Result<Vec<Question>>;

    async fn get(&self, id: &str) -> Result<Option<Question>>;

    /// Store a validated question under a freshly generated id
    async fn add(&self, question: NewQuestion) -> Result<Question>;

    /// Store several validated questions as one unit: all of them or none
    async fn add_all(&self, questions: Vec<NewQuestion>) -> Result<Vec<Question>>;

    /// Apply a validated patch. `None` if the id is unknown.
    async fn update(&self, id: &str, patch: QuestionPatch) -> Result<Option<Question>>;

    /// Returns false if nothing was removed
    async fn remove(&self, id: &str) -> Result<bool>;
}

/// A score that should appear on the leaderboard unless the user already
/// holds an equal or better one by the time it is written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeaderboardCandidate {
    pub score: i32,
    pub timestamp: Timestamp,
}

/// Everything a finished round changes, written as one unit
#[derive(Debug, Clone)]
pub struct OutcomeCommit {
    pub user_id: UserId,
    pub username: String,
    pub stats: UserStats,
    pub record: GameRecord,
    pub leaderboard: Option<LeaderboardCandidate>,
}

#[async_trait]
pub trait ScoreStore: Send + Sync {
    async fn user_profile(&self, user_id: &str) -> Result<Option<UserProfile>>;

    async fn user_stats(&self, user_id: &str) -> Result<Option<UserStats>> {
        Ok(self.user_profile(user_id).await?.map(|profile| profile.stats))
    }

    async fn leaderboard_entry(&self, user_id: &str) -> Result<Option<LeaderboardEntry>>;

    /// Write stats, history and the leaderboard candidate atomically.
    ///
    /// The candidate creates the user's entry when none exists. Otherwise it
    /// replaces score and timestamp only if its score is strictly greater
    /// than the stored one, checked at write time. Returns `Unchanged` when
    /// there is no candidate or it lost that check.
    async fn commit_outcome(&self, commit: OutcomeCommit) -> Result<LeaderboardChange>;

    /// Best entries: score descending, earliest timestamp first on ties
    async fn top_scores(&self, limit: usize) -> Result<Vec<LeaderboardEntry>>;

    /// Number of entries ranked strictly ahead of `entry`
    async fn count_ahead(&self, entry: &LeaderboardEntry) -> Result<u64>;

    /// Newest first
    async fn recent_games(&self, user_id: &str, limit: usize) -> Result<Vec<GameRecord>>;
}
