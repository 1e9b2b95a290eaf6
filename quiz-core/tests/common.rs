#![allow(dead_code)]

use quiz_core::{
    GameSession, InMemoryStore, LeaderboardCandidate, OutcomeCommit, ScoreStore, SessionEvent,
    SessionEventHandler, SessionOutcome, WordBank,
};
use quiz_types::{GameConfig, GameRecord, Question, UserStats};
use std::sync::{Arc, Mutex};

/// Creates a question with a fixed id
pub fn create_question(id: &str, word: &str) -> Question {
    Question {
        id: id.to_string(),
        word: word.to_string(),
        hint: format!("Hint for {}", word.to_lowercase()),
        category: None,
        created_at: 0,
    }
}

/// Creates a bank that always deals the given word
pub fn create_single_word_bank(word: &str) -> WordBank {
    WordBank::from_questions(vec![create_question("q-1", word)])
}

/// Config where a solved word is worth `letters * reward + bonus`
pub fn create_fixed_config(reward: i32, bonus: i32) -> GameConfig {
    GameConfig {
        per_letter_reward: reward,
        completion_bonus: bonus,
        ..GameConfig::default()
    }
}

/// Plays every letter in order and returns the finished outcome
pub fn play_to_outcome(word: &str, config: GameConfig, letters: &str) -> SessionOutcome {
    let mut session = GameSession::start_with_config(word, "hint", None, config).unwrap();
    for letter in letters.chars() {
        session.guess(letter).unwrap();
    }
    session
        .outcome()
        .expect("Letters should have finished the round")
}

/// A won "CAT" round worth `3 * reward + bonus`
pub fn won_cat(reward: i32, bonus: i32) -> SessionOutcome {
    play_to_outcome("cat", create_fixed_config(reward, bonus), "cat")
}

/// Writes a leaderboard entry straight into the store
pub async fn seed_leaderboard_entry(
    store: &InMemoryStore,
    user_id: &str,
    score: i32,
    timestamp: i64,
) {
    store
        .commit_outcome(OutcomeCommit {
            user_id: user_id.to_string(),
            username: format!("Player {}", user_id),
            stats: UserStats {
                total_score: i64::from(score),
                games_played: 1,
                highest_score: score,
            },
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

pub fn create_store() -> Arc<InMemoryStore> {
    Arc::new(InMemoryStore::new())
}

/// Event collector for testing event emissions
#[derive(Clone)]
pub struct EventCollector {
    events: Arc<Mutex<Vec<SessionEvent>>>,
}

impl EventCollector {
    pub fn new() -> Self {
        Self {
            events: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn get_events(&self) -> Vec<SessionEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn last_event(&self) -> Option<SessionEvent> {
        self.events.lock().unwrap().last().cloned()
    }

    pub fn has_event_type(&self, check_fn: impl Fn(&SessionEvent) -> bool) -> bool {
        self.events.lock().unwrap().iter().any(check_fn)
    }
}

impl SessionEventHandler for EventCollector {
    fn handle_event(&mut self, event: SessionEvent) {
        self.events.lock().unwrap().push(event);
    }
}
