use quiz_types::{GameRecord, LeaderboardChange, UserStats};
use std::sync::Arc;
use tracing::{error, info};
use uuid::Uuid;

use crate::store::{LeaderboardCandidate, OutcomeCommit, ScoreStore};
use crate::{PersistenceStep, QuizError, Result, SessionOutcome};

/// Fold one finished round into a player's aggregate stats
pub fn fold_score(stats: UserStats, score: i32) -> UserStats {
    UserStats {
        total_score: stats.total_score + i64::from(score),
        games_played: stats.games_played + 1,
        highest_score: stats.highest_score.max(score),
    }
}

#[derive(Debug, Clone)]
pub struct RecordedOutcome {
    pub stats: UserStats,
    pub leaderboard: LeaderboardChange,
    pub record: GameRecord,
}

/// Persists finished rounds into user stats, history and the leaderboard
#[derive(Clone)]
pub struct ScoreKeeper {
    store: Arc<dyn ScoreStore>,
}

impl ScoreKeeper {
    pub fn new(store: Arc<dyn ScoreStore>) -> Self {
        Self { store }
    }

    /// Stats of a user, zero for one who never finished a round
    pub async fn stats(&self, user_id: &str) -> Result<UserStats> {
        Ok(self
            .store
            .user_stats(user_id)
            .await
            .map_err(QuizError::persistence(Some(user_id), PersistenceStep::ReadStats))?
            .unwrap_or_default())
    }

    pub async fn recent_games(&self, user_id: &str, limit: usize) -> Result<Vec<GameRecord>> {
        self.store
            .recent_games(user_id, limit)
            .await
            .map_err(QuizError::persistence(Some(user_id), PersistenceStep::ReadHistory))
    }

    pub async fn record_outcome(
        &self,
        user_id: &str,
        username: &str,
        outcome: &SessionOutcome,
    ) -> Result<RecordedOutcome> {
        let score = outcome.score();

        let stats = fold_score(self.stats(user_id).await?, score);

        // Zero scores never reach the leaderboard
        let candidate = if score > 0 {
            let existing = self
                .store
                .leaderboard_entry(user_id)
                .await
                .map_err(QuizError::persistence(
                    Some(user_id),
                    PersistenceStep::ReadLeaderboard,
                ))?;

            match existing {
                Some(entry) if entry.score >= score => None,
                _ => Some(LeaderboardCandidate {
                    score,
                    timestamp: outcome.ended_at(),
                }),
            }
        } else {
            None
        };
        let has_candidate = candidate.is_some();

        let record = GameRecord {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            score,
            won: outcome.won(),
            word: outcome.word().to_string(),
            timestamp: outcome.ended_at(),
        };

        let commit = OutcomeCommit {
            user_id: user_id.to_string(),
            username: username.to_string(),
            stats,
            record: record.clone(),
            leaderboard: candidate,
        };

        let change = self.store.commit_outcome(commit).await.map_err(|err| {
            error!("Failed to record outcome for {}: {}", user_id, err);
            QuizError::Persistence {
                user_id: Some(user_id.to_string()),
                step: PersistenceStep::CommitOutcome,
                source: err,
            }
        })?;

        let leaderboard = match (has_candidate, score > 0) {
            (true, _) => change,
            (false, true) => LeaderboardChange::Unchanged,
            (false, false) => LeaderboardChange::Skipped,
        };

        info!(
            "Recorded {} points for {} (games: {}, best: {}, leaderboard: {:?})",
            score, user_id, stats.games_played, stats.highest_score, leaderboard
        );

        Ok(RecordedOutcome {
            stats,
            leaderboard,
            record,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::GameSession;
    use crate::memory::InMemoryStore;
    use quiz_types::GameConfig;

    /// A won "CAT" round worth `3 * reward + bonus`
    fn won_outcome(reward: i32, bonus: i32) -> SessionOutcome {
        let config = GameConfig {
            per_letter_reward: reward,
            completion_bonus: bonus,
            ..GameConfig::default()
        };
        let mut session = GameSession::start_with_config("cat", "hint", None, config).unwrap();
        for letter in ['c', 'a', 't'] {
            session.guess(letter).unwrap();
        }
        session.outcome().unwrap()
    }

    fn lost_outcome() -> SessionOutcome {
        let mut session = GameSession::start("cat", "hint", 1, 60).unwrap();
        session.guess('z').unwrap();
        session.outcome().unwrap()
    }

    fn keeper() -> (Arc<InMemoryStore>, ScoreKeeper) {
        let store = Arc::new(InMemoryStore::new());
        (store.clone(), ScoreKeeper::new(store))
    }

    #[test]
    fn test_fold_score() {
        let stats = fold_score(UserStats::default(), 150);
        assert_eq!(
            stats,
            UserStats {
                total_score: 150,
                games_played: 1,
                highest_score: 150
            }
        );

        let stats = fold_score(stats, 90);
        assert_eq!(stats.total_score, 240);
        assert_eq!(stats.games_played, 2);
        assert_eq!(stats.highest_score, 150);
    }

    #[tokio::test]
    async fn test_first_then_lower_score() {
        let (store, keeper) = keeper();

        let first = keeper
            .record_outcome("u1", "alice", &won_outcome(20, 90))
            .await
            .unwrap();
        assert_eq!(
            first.stats,
            UserStats {
                total_score: 150,
                games_played: 1,
                highest_score: 150
            }
        );
        assert_eq!(first.leaderboard, LeaderboardChange::Created);

        let entry = store.leaderboard_entry("u1").await.unwrap().unwrap();
        assert_eq!(entry.score, 150);
        assert_eq!(entry.username, "alice");

        let second = keeper
            .record_outcome("u1", "alice", &won_outcome(10, 60))
            .await
            .unwrap();
        assert_eq!(second.stats.total_score, 240);
        assert_eq!(second.stats.games_played, 2);
        assert_eq!(second.stats.highest_score, 150);
        assert_eq!(second.leaderboard, LeaderboardChange::Unchanged);

        let after = store.leaderboard_entry("u1").await.unwrap().unwrap();
        assert_eq!(after, entry);
        assert_eq!(store.top_scores(10).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_higher_score_raises_entry() {
        let (store, keeper) = keeper();

        keeper
            .record_outcome("u1", "alice", &won_outcome(10, 60))
            .await
            .unwrap();
        let before = store.leaderboard_entry("u1").await.unwrap().unwrap();

        let raised = keeper
            .record_outcome("u1", "alice", &won_outcome(20, 90))
            .await
            .unwrap();
        assert_eq!(raised.leaderboard, LeaderboardChange::Raised { previous: 90 });

        let after = store.leaderboard_entry("u1").await.unwrap().unwrap();
        assert_eq!(after.id, before.id);
        assert_eq!(after.score, 150);
        assert!(after.timestamp >= before.timestamp);
    }

    #[tokio::test]
    async fn test_equal_score_leaves_entry() {
        let (store, keeper) = keeper();
        keeper
            .record_outcome("u1", "alice", &won_outcome(10, 60))
            .await
            .unwrap();
        let before = store.leaderboard_entry("u1").await.unwrap().unwrap();

        let again = keeper
            .record_outcome("u1", "alice", &won_outcome(10, 60))
            .await
            .unwrap();
        assert_eq!(again.leaderboard, LeaderboardChange::Unchanged);
        assert_eq!(store.leaderboard_entry("u1").await.unwrap().unwrap(), before);
    }

    #[tokio::test]
    async fn test_zero_score_counts_game_but_skips_leaderboard() {
        let (store, keeper) = keeper();

        let recorded = keeper
            .record_outcome("u1", "alice", &lost_outcome())
            .await
            .unwrap();
        assert_eq!(recorded.leaderboard, LeaderboardChange::Skipped);
        assert_eq!(recorded.stats.games_played, 1);
        assert_eq!(recorded.stats.total_score, 0);
        assert!(!recorded.record.won);
        assert!(store.leaderboard_entry("u1").await.unwrap().is_none());
        assert_eq!(store.recent_games("u1", 5).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_commit_failure_is_reported_and_nothing_applied() {
        let (store, keeper) = keeper();
        store.fail_commits(true);

        let result = keeper
            .record_outcome("u1", "alice", &won_outcome(20, 90))
            .await;
        match result {
            Err(QuizError::Persistence { user_id, step, .. }) => {
                assert_eq!(user_id.as_deref(), Some("u1"));
                assert_eq!(step, PersistenceStep::CommitOutcome);
            }
            other => panic!("Expected persistence error, got {:?}", other),
        }

        assert!(store.user_stats("u1").await.unwrap().is_none());
        assert!(store.leaderboard_entry("u1").await.unwrap().is_none());
        assert!(store.recent_games("u1", 5).await.unwrap().is_empty());

        // retry once the store recovers
        store.fail_commits(false);
        let recorded = keeper
            .record_outcome("u1", "alice", &won_outcome(20, 90))
            .await
            .unwrap();
        assert_eq!(recorded.stats.games_played, 1);
    }

    #[tokio::test]
    async fn test_stale_candidate_does_not_overwrite_higher_score() {
        let (store, keeper) = keeper();

        keeper
            .record_outcome("u1", "alice", &won_outcome(10, 60))
            .await
            .unwrap();

        // Another device raises the entry to 150 after this keeper read 90
        let stale = OutcomeCommit {
            user_id: "u1".to_string(),
            username: "alice".to_string(),
            stats: UserStats::default(),
            record: GameRecord {
                id: "late".to_string(),
                user_id: "u1".to_string(),
                score: 120,
                won: true,
                word: "CAT".to_string(),
                timestamp: 1,
            },
            leaderboard: Some(LeaderboardCandidate {
                score: 120,
                timestamp: 1,
            }),
        };
        keeper
            .record_outcome("u1", "alice", &won_outcome(20, 90))
            .await
            .unwrap();

        let change = store.commit_outcome(stale).await.unwrap();
        assert_eq!(change, LeaderboardChange::Unchanged);
        assert_eq!(store.leaderboard_entry("u1").await.unwrap().unwrap().score, 150);
    }
}
