use anyhow::Result;
use async_trait::async_trait;
use sea_orm::sea_query::{Expr, OnConflict};
use sea_orm::{
    ActiveValue, ColumnTrait, Condition, ConnectionTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, TransactionTrait,
};
use tracing::debug;
use uuid::Uuid;

use crate::entities::{game_records, leaderboard, prelude::*, users};
use quiz_core::{LeaderboardCandidate, OutcomeCommit, ScoreStore, now_millis};
use quiz_types::{GameRecord, LeaderboardChange, LeaderboardEntry, UserProfile, UserStats};

#[derive(Clone)]
pub struct ScoreRepository {
    db: DatabaseConnection,
}

impl ScoreRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    fn model_to_profile(model: users::Model) -> UserProfile {
        UserProfile {
            id: model.id,
            username: model.username,
            stats: UserStats {
                total_score: model.total_score,
                games_played: u32::try_from(model.games_played).unwrap_or_default(),
                highest_score: model.highest_score,
            },
            created_at: model.created_at,
        }
    }

    fn model_to_entry(model: leaderboard::Model) -> LeaderboardEntry {
        LeaderboardEntry {
            id: model.id,
            user_id: model.user_id,
            username: model.username,
            score: model.score,
            timestamp: model.timestamp,
        }
    }

    fn model_to_record(model: game_records::Model) -> GameRecord {
        GameRecord {
            id: model.id,
            user_id: model.user_id,
            score: model.score,
            won: model.won,
            word: model.word,
            timestamp: model.timestamp,
        }
    }

    async fn save_stats<C: ConnectionTrait>(conn: &C, commit: &OutcomeCommit) -> Result<()> {
        let now = now_millis();
        let stats = commit.stats;
        let games_played = i32::try_from(stats.games_played).unwrap_or(i32::MAX);

        match Users::find_by_id(commit.user_id.as_str()).one(conn).await? {
            Some(user) => {
                let updated_user = users::ActiveModel {
                    id: ActiveValue::Unchanged(user.id),
                    username: ActiveValue::Set(commit.username.clone()),
                    total_score: ActiveValue::Set(stats.total_score),
                    games_played: ActiveValue::Set(games_played),
                    highest_score: ActiveValue::Set(stats.highest_score),
                    created_at: ActiveValue::Unchanged(user.created_at),
                    updated_at: ActiveValue::Set(now),
                };
                Users::update(updated_user).exec(conn).await?;
            }
            None => {
                let user_model = users::ActiveModel {
                    id: ActiveValue::Set(commit.user_id.clone()),
                    username: ActiveValue::Set(commit.username.clone()),
                    total_score: ActiveValue::Set(stats.total_score),
                    games_played: ActiveValue::Set(games_played),
                    highest_score: ActiveValue::Set(stats.highest_score),
                    created_at: ActiveValue::Set(now),
                    updated_at: ActiveValue::Set(now),
                };
                Users::insert(user_model).exec_without_returning(conn).await?;
            }
        }
        Ok(())
    }

    /// Raise the user's entry only if the stored score is strictly lower.
    /// Returns the number of rows changed.
    async fn raise_entry<C: ConnectionTrait>(
        conn: &C,
        user_id: &str,
        username: &str,
        candidate: &LeaderboardCandidate,
    ) -> Result<u64> {
        let result = Leaderboard::update_many()
            .col_expr(leaderboard::Column::Score, Expr::value(candidate.score))
            .col_expr(
                leaderboard::Column::Timestamp,
                Expr::value(candidate.timestamp),
            )
            .col_expr(leaderboard::Column::Username, Expr::value(username))
            .filter(leaderboard::Column::UserId.eq(user_id))
            .filter(leaderboard::Column::Score.lt(candidate.score))
            .exec(conn)
            .await?;

        Ok(result.rows_affected)
    }

    async fn apply_candidate<C: ConnectionTrait>(
        conn: &C,
        commit: &OutcomeCommit,
        candidate: &LeaderboardCandidate,
    ) -> Result<LeaderboardChange> {
        let existing = Leaderboard::find()
            .filter(leaderboard::Column::UserId.eq(commit.user_id.as_str()))
            .one(conn)
            .await?;

        if let Some(entry) = existing {
            return Self::raise_existing(conn, commit, candidate, entry.score).await;
        }

        let entry_model = leaderboard::ActiveModel {
            id: ActiveValue::Set(Uuid::new_v4().to_string()),
            user_id: ActiveValue::Set(commit.user_id.clone()),
            username: ActiveValue::Set(commit.username.clone()),
            score: ActiveValue::Set(candidate.score),
            timestamp: ActiveValue::Set(candidate.timestamp),
        };

        // The unique user_id index keeps a concurrent first insert from duplicating
        let inserted = Leaderboard::insert(entry_model)
            .on_conflict(
                OnConflict::column(leaderboard::Column::UserId)
                    .do_nothing()
                    .to_owned(),
            )
            .exec_without_returning(conn)
            .await?;

        if inserted > 0 {
            return Ok(LeaderboardChange::Created);
        }

        debug!("Leaderboard entry for {} appeared concurrently", commit.user_id);
        let entry = Leaderboard::find()
            .filter(leaderboard::Column::UserId.eq(commit.user_id.as_str()))
            .one(conn)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Leaderboard entry for {} vanished", commit.user_id))?;
        Self::raise_existing(conn, commit, candidate, entry.score).await
    }

    async fn raise_existing<C: ConnectionTrait>(
        conn: &C,
        commit: &OutcomeCommit,
        candidate: &LeaderboardCandidate,
        previous: i32,
    ) -> Result<LeaderboardChange> {
        let raised = Self::raise_entry(conn, &commit.user_id, &commit.username, candidate).await?;
        Ok(if raised > 0 {
            LeaderboardChange::Raised { previous }
        } else {
            LeaderboardChange::Unchanged
        })
    }
}

#[async_trait]
impl ScoreStore for ScoreRepository {
    async fn user_profile(&self, user_id: &str) -> Result<Option<UserProfile>> {
        let user_model = Users::find_by_id(user_id).one(&self.db).await?;
        Ok(user_model.map(Self::model_to_profile))
    }

    async fn leaderboard_entry(&self, user_id: &str) -> Result<Option<LeaderboardEntry>> {
        let entry = Leaderboard::find()
            .filter(leaderboard::Column::UserId.eq(user_id))
            .one(&self.db)
            .await?;
        Ok(entry.map(Self::model_to_entry))
    }

    async fn commit_outcome(&self, commit: OutcomeCommit) -> Result<LeaderboardChange> {
        let txn = self.db.begin().await?;

        Self::save_stats(&txn, &commit).await?;

        let record = &commit.record;
        let record_model = game_records::ActiveModel {
            id: ActiveValue::Set(record.id.clone()),
            user_id: ActiveValue::Set(record.user_id.clone()),
            score: ActiveValue::Set(record.score),
            won: ActiveValue::Set(record.won),
            word: ActiveValue::Set(record.word.clone()),
            timestamp: ActiveValue::Set(record.timestamp),
        };
        GameRecords::insert(record_model)
            .exec_without_returning(&txn)
            .await?;

        let change = match &commit.leaderboard {
            Some(candidate) => Self::apply_candidate(&txn, &commit, candidate).await?,
            None => LeaderboardChange::Unchanged,
        };

        // Dropping the transaction on an earlier error rolls everything back
        txn.commit().await?;
        Ok(change)
    }

    async fn top_scores(&self, limit: usize) -> Result<Vec<LeaderboardEntry>> {
        let entries = Leaderboard::find()
            .order_by_desc(leaderboard::Column::Score)
            .order_by_asc(leaderboard::Column::Timestamp)
            .limit(limit as u64)
            .all(&self.db)
            .await?;

        Ok(entries.into_iter().map(Self::model_to_entry).collect())
    }

    async fn count_ahead(&self, entry: &LeaderboardEntry) -> Result<u64> {
        let ahead = Leaderboard::find()
            .filter(
                Condition::any()
                    .add(leaderboard::Column::Score.gt(entry.score))
                    .add(
                        Condition::all()
                            .add(leaderboard::Column::Score.eq(entry.score))
                            .add(leaderboard::Column::Timestamp.lt(entry.timestamp)),
                    ),
            )
            .count(&self.db)
            .await?;

        Ok(ahead)
    }

    async fn recent_games(&self, user_id: &str, limit: usize) -> Result<Vec<GameRecord>> {
        let records = GameRecords::find()
            .filter(game_records::Column::UserId.eq(user_id))
            .order_by_desc(game_records::Column::Timestamp)
            .limit(limit as u64)
            .all(&self.db)
            .await?;

        Ok(records.into_iter().map(Self::model_to_record).collect())
    }
}
