use quiz_types::{LeaderboardEntry, RankedEntry};
use std::cmp::Reverse;
use std::sync::Arc;

use crate::store::ScoreStore;
use crate::{PersistenceStep, QuizError, Result};

/// Read-only ranked projection of the leaderboard store
#[derive(Clone)]
pub struct LeaderboardView {
    store: Arc<dyn ScoreStore>,
}

impl LeaderboardView {
    pub fn new(store: Arc<dyn ScoreStore>) -> Self {
        Self { store }
    }

    /// At most `n` entries, best score first, earlier timestamp first on ties
    pub async fn top_n(&self, n: usize) -> Result<Vec<LeaderboardEntry>> {
        if n == 0 {
            return Ok(Vec::new());
        }

        let mut entries = self
            .store
            .top_scores(n)
            .await
            .map_err(QuizError::persistence(None, PersistenceStep::ReadLeaderboard))?;

        // Stores only promise the best `n`; the order is enforced here
        entries.sort_by_key(|entry| (Reverse(entry.score), entry.timestamp));
        entries.truncate(n);
        Ok(entries)
    }

    pub async fn top_ranked(&self, n: usize) -> Result<Vec<RankedEntry>> {
        Ok(self
            .top_n(n)
            .await?
            .into_iter()
            .enumerate()
            .map(|(index, entry)| RankedEntry {
                rank: (index + 1) as u32,
                entry,
            })
            .collect())
    }

    /// 1-based position of the user's entry, `None` without one
    pub async fn rank_of(&self, user_id: &str) -> Result<Option<u32>> {
        let entry = self
            .store
            .leaderboard_entry(user_id)
            .await
            .map_err(QuizError::persistence(
                Some(user_id),
                PersistenceStep::ReadLeaderboard,
            ))?;

        let Some(entry) = entry else {
            return Ok(None);
        };

        let ahead = self
            .store
            .count_ahead(&entry)
            .await
            .map_err(QuizError::persistence(
                Some(user_id),
                PersistenceStep::ReadLeaderboard,
            ))?;

        Ok(Some(ahead as u32 + 1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemoryStore;
    use crate::store::{LeaderboardCandidate, OutcomeCommit};
    use quiz_types::{GameRecord, UserStats};

    async fn seed(store: &InMemoryStore, user_id: &str, score: i32, timestamp: i64) {
        store
            .commit_outcome(OutcomeCommit {
                user_id: user_id.to_string(),
                username: user_id.to_uppercase(),
                stats: UserStats::default(),
                record: GameRecord {
                    id: format!("game-{}", user_id),
                    user_id: user_id.to_string(),
                    score,
                    won: true,
                    word: "CAT".to_string(),
                    timestamp,
                },
                leaderboard: Some(LeaderboardCandidate { score, timestamp }),
            })
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_empty_store() {
        let view = LeaderboardView::new(Arc::new(InMemoryStore::new()));
        assert!(view.top_n(10).await.unwrap().is_empty());
        assert_eq!(view.rank_of("nobody").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_top_n_zero() {
        let store = Arc::new(InMemoryStore::new());
        seed(&store, "a", 10, 1).await;
        let view = LeaderboardView::new(store);
        assert!(view.top_n(0).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_ranks_and_ties() {
        let store = Arc::new(InMemoryStore::new());
        seed(&store, "late", 100, 50).await;
        seed(&store, "early", 100, 10).await;
        seed(&store, "low", 20, 1).await;
        let view = LeaderboardView::new(store);

        let ranked = view.top_ranked(10).await.unwrap();
        let order: Vec<_> = ranked
            .iter()
            .map(|r| (r.rank, r.entry.user_id.as_str()))
            .collect();
        assert_eq!(order, vec![(1, "early"), (2, "late"), (3, "low")]);

        assert_eq!(view.rank_of("early").await.unwrap(), Some(1));
        assert_eq!(view.rank_of("late").await.unwrap(), Some(2));
        assert_eq!(view.rank_of("low").await.unwrap(), Some(3));
    }
}
