use anyhow::{Result, anyhow};
use async_trait::async_trait;
use quiz_types::{
    GameRecord, LeaderboardChange, LeaderboardEntry, NewQuestion, Question, QuestionId,
    QuestionPatch, UserId, UserProfile, UserStats,
};
use std::cmp::Reverse;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::now_millis;
use crate::store::{OutcomeCommit, QuestionStore, ScoreStore};
use crate::word_bank::apply_patch;

#[derive(Default)]
struct State {
    questions: BTreeMap<QuestionId, Question>,
    users: HashMap<UserId, UserProfile>,
    leaderboard: HashMap<UserId, LeaderboardEntry>,
    games: Vec<GameRecord>,
}

/// Store backed by process memory, for tests and local experiments
#[derive(Default)]
pub struct InMemoryStore {
    state: RwLock<State>,
    fail_commits: AtomicBool,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn with_questions(questions: Vec<NewQuestion>) -> Self {
        let store = Self::new();
        {
            let mut state = store.state.write().await;
            for question in questions {
                let question = new_question(question);
                state.questions.insert(question.id.clone(), question);
            }
        }
        store
    }

    /// Make every following `commit_outcome` fail without applying anything
    pub fn fail_commits(&self, fail: bool) {
        self.fail_commits.store(fail, Ordering::SeqCst);
    }
}

fn new_question(question: NewQuestion) -> Question {
    Question {
        id: Uuid::new_v4().to_string(),
        word: question.word,
        hint: question.hint,
        category: question.category,
        created_at: now_millis(),
    }
}

fn ranks_ahead(candidate: &LeaderboardEntry, entry: &LeaderboardEntry) -> bool {
    candidate.score > entry.score
        || (candidate.score == entry.score && candidate.timestamp < entry.timestamp)
}

#[async_trait]
impl QuestionStore for InMemoryStore {
    async fn list_all(&self) -> Result<Vec<Question>> {
        Ok(self.state.read().await.questions.values().cloned().collect())
    }

    async fn get(&self, id: &str) -> Result<Option<Question>> {
        Ok(self.state.read().await.questions.get(id).cloned())
    }

    async fn add(&self, question: NewQuestion) -> Result<Question> {
        let question = new_question(question);
        self.state
            .write()
            .await
            .questions
            .insert(question.id.clone(), question.clone());
        Ok(question)
    }

    async fn add_all(&self, questions: Vec<NewQuestion>) -> Result<Vec<Question>> {
        let mut state = self.state.write().await;
        let added: Vec<Question> = questions.into_iter().map(new_question).collect();
        for question in &added {
            state.questions.insert(question.id.clone(), question.clone());
        }
        Ok(added)
    }

    async fn update(&self, id: &str, patch: QuestionPatch) -> Result<Option<Question>> {
        let mut state = self.state.write().await;
        Ok(state.questions.get_mut(id).map(|question| {
            apply_patch(question, patch);
            question.clone()
        }))
    }

    async fn remove(&self, id: &str) -> Result<bool> {
        Ok(self.state.write().await.questions.remove(id).is_some())
    }
}

#[async_trait]
impl ScoreStore for InMemoryStore {
    async fn user_profile(&self, user_id: &str) -> Result<Option<UserProfile>> {
        Ok(self.state.read().await.users.get(user_id).cloned())
    }

    async fn leaderboard_entry(&self, user_id: &str) -> Result<Option<LeaderboardEntry>> {
        Ok(self.state.read().await.leaderboard.get(user_id).cloned())
    }

    async fn commit_outcome(&self, commit: OutcomeCommit) -> Result<LeaderboardChange> {
        if self.fail_commits.load(Ordering::SeqCst) {
            return Err(anyhow!("store unavailable"));
        }

        // One write guard covers all three updates
        let mut guard = self.state.write().await;
        let state = &mut *guard;

        let now = now_millis();
        let profile = state
            .users
            .entry(commit.user_id.clone())
            .or_insert_with(|| UserProfile {
                id: commit.user_id.clone(),
                username: commit.username.clone(),
                stats: UserStats::default(),
                created_at: now,
            });
        profile.username = commit.username.clone();
        profile.stats = commit.stats;

        state.games.push(commit.record);

        let Some(candidate) = commit.leaderboard else {
            return Ok(LeaderboardChange::Unchanged);
        };

        let change = match state.leaderboard.get_mut(&commit.user_id) {
            Some(entry) if candidate.score > entry.score => {
                let previous = entry.score;
                entry.score = candidate.score;
                entry.timestamp = candidate.timestamp;
                entry.username = commit.username;
                LeaderboardChange::Raised { previous }
            }
            Some(_) => LeaderboardChange::Unchanged,
            None => {
                state.leaderboard.insert(
                    commit.user_id.clone(),
                    LeaderboardEntry {
                        id: Uuid::new_v4().to_string(),
                        user_id: commit.user_id,
                        username: commit.username,
                        score: candidate.score,
                        timestamp: candidate.timestamp,
                    },
                );
                LeaderboardChange::Created
            }
        };

        Ok(change)
    }

    async fn top_scores(&self, limit: usize) -> Result<Vec<LeaderboardEntry>> {
        let state = self.state.read().await;
        let mut entries: Vec<_> = state.leaderboard.values().cloned().collect();
        entries.sort_by_key(|e| (Reverse(e.score), e.timestamp));
        entries.truncate(limit);
        Ok(entries)
    }

    async fn count_ahead(&self, entry: &LeaderboardEntry) -> Result<u64> {
        let state = self.state.read().await;
        Ok(state
            .leaderboard
            .values()
            .filter(|other| ranks_ahead(other, entry))
            .count() as u64)
    }

    async fn recent_games(&self, user_id: &str, limit: usize) -> Result<Vec<GameRecord>> {
        let state = self.state.read().await;
        let mut games: Vec<_> = state
            .games
            .iter()
            .filter(|game| game.user_id == user_id)
            .cloned()
            .collect();
        // stable sort keeps insertion order for equal timestamps
        games.reverse();
        games.sort_by_key(|game| Reverse(game.timestamp));
        games.truncate(limit);
        Ok(games)
    }
}
