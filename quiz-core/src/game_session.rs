use quiz_types::{
    DisplayCell, GameConfig, GuessFeedback, LossReason, Question, SessionStatus, SessionView,
    Timestamp,
};
use std::collections::BTreeSet;

use crate::word_bank::{normalize_letter, normalize_word};
use crate::{QuizError, Result, ScoringEngine, now_millis};

/// Result of a round that has reached Won or Lost. Only a terminal
/// [`GameSession`] can produce one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionOutcome {
    word: String,
    score: i32,
    status: SessionStatus,
    attempts_used: u32,
    elapsed_seconds: u32,
    ended_at: Timestamp,
}

impl SessionOutcome {
    pub fn word(&self) -> &str {
        &self.word
    }

    pub fn score(&self) -> i32 {
        self.score
    }

    pub fn won(&self) -> bool {
        self.status == SessionStatus::Won
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn attempts_used(&self) -> u32 {
        self.attempts_used
    }

    pub fn elapsed_seconds(&self) -> u32 {
        self.elapsed_seconds
    }

    pub fn ended_at(&self) -> Timestamp {
        self.ended_at
    }
}

/// One round of play. Won and Lost are absorbing: nothing mutates a
/// session after it ends.
#[derive(Debug, Clone)]
pub struct GameSession {
    question_id: Option<String>,
    target_word: String,
    hint: String,
    category: Option<String>,
    config: GameConfig,
    target_letters: BTreeSet<char>,
    guessed_letters: BTreeSet<char>,
    correct_letters: BTreeSet<char>,
    attempts_used: u32,
    elapsed_seconds: u32,
    score: i32,
    status: SessionStatus,
    loss_reason: Option<LossReason>,
    started_at: Timestamp,
    ended_at: Option<Timestamp>,
}

impl GameSession {
    /// Start a round with the default rewards and a fixed scoring policy
    pub fn start(
        word: &str,
        hint: &str,
        max_wrong_guesses: u32,
        time_limit_seconds: u32,
    ) -> Result<Self> {
        let config = GameConfig {
            max_wrong_guesses,
            time_limit_seconds,
            ..GameConfig::default()
        };
        Self::start_with_config(word, hint, None, config)
    }

    pub fn from_question(question: &Question, config: &GameConfig) -> Result<Self> {
        let mut session = Self::start_with_config(
            &question.word,
            &question.hint,
            question.category.clone(),
            config.clone(),
        )?;
        session.question_id = Some(question.id.clone());
        Ok(session)
    }

    /// `time_limit_seconds == 0` disables the clock; only an explicit
    /// [`expire`](Self::expire) can then time the round out.
    pub fn start_with_config(
        word: &str,
        hint: &str,
        category: Option<String>,
        config: GameConfig,
    ) -> Result<Self> {
        let target_word = normalize_word(word)?;
        if config.max_wrong_guesses == 0 {
            return Err(QuizError::InvalidInput(
                "max_wrong_guesses must be at least 1".to_string(),
            ));
        }

        let target_letters = target_word.chars().filter(|c| *c != ' ').collect();

        Ok(Self {
            question_id: None,
            target_word,
            hint: hint.to_string(),
            category,
            config,
            target_letters,
            guessed_letters: BTreeSet::new(),
            correct_letters: BTreeSet::new(),
            attempts_used: 0,
            elapsed_seconds: 0,
            score: 0,
            status: SessionStatus::Active,
            loss_reason: None,
            started_at: now_millis(),
            ended_at: None,
        })
    }

    /// Try a letter. Invalid letters are rejected without touching the
    /// session; repeats and guesses after the round ended are no-ops.
    pub fn guess(&mut self, letter: char) -> Result<GuessFeedback> {
        let letter = normalize_letter(letter)?;

        if self.status.is_terminal() {
            return Ok(GuessFeedback::Inactive);
        }
        if !self.guessed_letters.insert(letter) {
            return Ok(GuessFeedback::Repeated);
        }

        let feedback = if self.target_letters.contains(&letter) {
            self.correct_letters.insert(letter);
            self.score += ScoringEngine::letter_reward(&self.config);

            if self.correct_letters.len() == self.target_letters.len() {
                self.finish_won();
            }
            GuessFeedback::Hit
        } else {
            self.attempts_used += 1;

            if self.attempts_used >= self.config.max_wrong_guesses {
                self.finish_lost(LossReason::OutOfAttempts);
            }
            GuessFeedback::Miss
        };

        debug_assert!(self.correct_letters.is_subset(&self.guessed_letters));
        Ok(feedback)
    }

    /// Advance the clock by one second. Returns the status after the tick.
    pub fn tick(&mut self) -> SessionStatus {
        if self.status == SessionStatus::Active {
            self.elapsed_seconds = self.elapsed_seconds.saturating_add(1);

            let limit = self.config.time_limit_seconds;
            if limit > 0 && self.elapsed_seconds >= limit {
                self.finish_lost(LossReason::TimeExpired);
            }
        }
        self.status
    }

    /// External timer reported expiry. Returns true if this ended the round.
    pub fn expire(&mut self) -> bool {
        if self.status != SessionStatus::Active {
            return false;
        }
        self.finish_lost(LossReason::TimeExpired);
        true
    }

    fn finish_won(&mut self) {
        self.score = ScoringEngine::settle_win(
            &self.config,
            self.score,
            self.attempts_used,
            self.elapsed_seconds,
        );
        self.status = SessionStatus::Won;
        self.ended_at = Some(now_millis());
    }

    fn finish_lost(&mut self, reason: LossReason) {
        self.score = ScoringEngine::settle_loss(&self.config, self.score);
        self.status = SessionStatus::Lost;
        self.loss_reason = Some(reason);
        self.ended_at = Some(now_millis());
    }

    /// Masked word, recomputed from the correct letters on every call
    pub fn current_display(&self) -> Vec<DisplayCell> {
        self.target_word
            .chars()
            .map(|c| {
                if c == ' ' {
                    DisplayCell::Gap
                } else if self.correct_letters.contains(&c) {
                    DisplayCell::Letter(c)
                } else {
                    DisplayCell::Blank
                }
            })
            .collect()
    }

    /// Display rendered as text: "C _ T"
    pub fn display_text(&self) -> String {
        self.current_display()
            .iter()
            .map(|cell| match cell {
                DisplayCell::Letter(c) => c.to_string(),
                DisplayCell::Blank => "_".to_string(),
                DisplayCell::Gap => " ".to_string(),
            })
            .collect::<Vec<_>>()
            .join(" ")
    }

    pub fn score(&self) -> i32 {
        self.score
    }

    /// Score a win would settle at right now. Equals `score()` once the
    /// round is over.
    pub fn projected_score(&self) -> i32 {
        if self.status.is_terminal() {
            return self.score;
        }
        ScoringEngine::projected(
            &self.config,
            self.score,
            self.attempts_used,
            self.elapsed_seconds,
        )
    }

    pub fn outcome(&self) -> Option<SessionOutcome> {
        let ended_at = self.ended_at?;
        Some(SessionOutcome {
            word: self.target_word.clone(),
            score: self.score,
            status: self.status,
            attempts_used: self.attempts_used,
            elapsed_seconds: self.elapsed_seconds,
            ended_at,
        })
    }

    pub fn view(&self) -> SessionView {
        SessionView {
            display: self.current_display(),
            display_text: self.display_text(),
            hint: self.hint.clone(),
            category: self.category.clone(),
            guessed_letters: self.guessed_letters.iter().copied().collect(),
            attempts_used: self.attempts_used,
            lives_remaining: self.lives_remaining(),
            time_remaining_seconds: self.time_remaining_seconds(),
            score: self.score,
            projected_score: self.projected_score(),
            status: self.status,
            loss_reason: self.loss_reason,
            answer: self
                .status
                .is_terminal()
                .then(|| self.target_word.clone()),
            started_at: self.started_at,
        }
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn is_active(&self) -> bool {
        self.status == SessionStatus::Active
    }

    pub fn loss_reason(&self) -> Option<LossReason> {
        self.loss_reason
    }

    pub fn target_word(&self) -> &str {
        &self.target_word
    }

    pub fn hint(&self) -> &str {
        &self.hint
    }

    pub fn question_id(&self) -> Option<&str> {
        self.question_id.as_deref()
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn guessed_letters(&self) -> &BTreeSet<char> {
        &self.guessed_letters
    }

    pub fn correct_letters(&self) -> &BTreeSet<char> {
        &self.correct_letters
    }

    pub fn attempts_used(&self) -> u32 {
        self.attempts_used
    }

    pub fn lives_remaining(&self) -> u32 {
        self.config
            .max_wrong_guesses
            .saturating_sub(self.attempts_used)
    }

    pub fn elapsed_seconds(&self) -> u32 {
        self.elapsed_seconds
    }

    pub fn time_remaining_seconds(&self) -> u32 {
        self.config
            .time_limit_seconds
            .saturating_sub(self.elapsed_seconds)
    }

    pub fn started_at(&self) -> Timestamp {
        self.started_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quiz_types::ScoringPolicy;

    fn session(word: &str, max_wrong: u32) -> GameSession {
        GameSession::start(word, "a hint", max_wrong, 60).unwrap()
    }

    fn guess_all(session: &mut GameSession, letters: &str) {
        for letter in letters.chars() {
            session.guess(letter).unwrap();
        }
    }

    #[test]
    fn test_start_fresh_session() {
        let session = session("cat", 6);

        assert_eq!(session.status(), SessionStatus::Active);
        assert_eq!(session.target_word(), "CAT");
        assert!(session.guessed_letters().is_empty());
        assert!(session.correct_letters().is_empty());
        assert_eq!(session.attempts_used(), 0);
        assert_eq!(session.lives_remaining(), 6);
        assert_eq!(session.score(), 0);
        assert!(session.started_at() > 0);
        assert!(session.outcome().is_none());
    }

    #[test]
    fn test_start_rejects_bad_words() {
        assert!(matches!(
            GameSession::start("", "hint", 6, 60),
            Err(QuizError::InvalidInput(_))
        ));
        assert!(matches!(
            GameSession::start("c4t", "hint", 6, 60),
            Err(QuizError::InvalidInput(_))
        ));
        assert!(matches!(
            GameSession::start("cat", "hint", 0, 60),
            Err(QuizError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_cat_won_with_interleaved_misses() {
        let mut session = session("CAT", 6);

        assert_eq!(session.guess('x').unwrap(), GuessFeedback::Miss);
        assert_eq!(session.guess('t').unwrap(), GuessFeedback::Hit);
        assert_eq!(session.guess('q').unwrap(), GuessFeedback::Miss);
        assert_eq!(session.display_text(), "_ _ T");
        assert_eq!(session.guess('C').unwrap(), GuessFeedback::Hit);
        assert_eq!(session.guess('a').unwrap(), GuessFeedback::Hit);

        assert_eq!(session.status(), SessionStatus::Won);
        assert_eq!(session.display_text(), "C A T");
        assert!(
            session
                .current_display()
                .iter()
                .all(|cell| matches!(cell, DisplayCell::Letter(_)))
        );
        // 3 letters * 10 + 50 completion bonus
        assert_eq!(session.score(), 80);
        assert_eq!(session.attempts_used(), 2);
    }

    #[test]
    fn test_repeated_letter_reveals_all_positions() {
        let mut session = session("banana", 3);

        session.guess('a').unwrap();
        assert_eq!(session.display_text(), "_ A _ A _ A");
        assert_eq!(session.score(), 10);

        session.guess('n').unwrap();
        assert_eq!(session.display_text(), "_ A N A N A");
        session.guess('b').unwrap();
        assert_eq!(session.status(), SessionStatus::Won);
        assert_eq!(session.score(), 30 + 50);
    }

    #[test]
    fn test_repeat_guess_is_idempotent() {
        let mut session = session("cat", 6);

        session.guess('c').unwrap();
        let score = session.score();
        assert_eq!(session.guess('c').unwrap(), GuessFeedback::Repeated);
        assert_eq!(session.guess('C').unwrap(), GuessFeedback::Repeated);
        assert_eq!(session.score(), score);

        session.guess('z').unwrap();
        assert_eq!(session.guess('z').unwrap(), GuessFeedback::Repeated);
        assert_eq!(session.attempts_used(), 1);
    }

    #[test]
    fn test_six_misses_lose_and_seventh_is_noop() {
        let mut session = session("cat", 6);
        guess_all(&mut session, "bdefg");
        assert_eq!(session.status(), SessionStatus::Active);

        session.guess('h').unwrap();
        assert_eq!(session.status(), SessionStatus::Lost);
        assert_eq!(session.loss_reason(), Some(LossReason::OutOfAttempts));
        assert_eq!(session.lives_remaining(), 0);

        let guessed = session.guessed_letters().clone();
        assert_eq!(session.guess('c').unwrap(), GuessFeedback::Inactive);
        assert_eq!(session.guessed_letters(), &guessed);
        assert_eq!(session.attempts_used(), 6);
        assert_eq!(session.status(), SessionStatus::Lost);
    }

    #[test]
    fn test_terminal_states_are_absorbing() {
        let mut won = session("ox", 3);
        guess_all(&mut won, "ox");
        assert_eq!(won.status(), SessionStatus::Won);
        let score = won.score();

        assert_eq!(won.guess('z').unwrap(), GuessFeedback::Inactive);
        assert!(!won.expire());
        assert_eq!(won.tick(), SessionStatus::Won);
        assert_eq!(won.score(), score);
        assert_eq!(won.attempts_used(), 0);
        assert_eq!(won.elapsed_seconds(), 0);
        assert!(!won.guessed_letters().contains(&'Z'));
    }

    #[test]
    fn test_invalid_letter_does_not_mutate() {
        let mut session = session("cat", 6);
        session.guess('c').unwrap();

        assert!(matches!(session.guess('1'), Err(QuizError::InvalidInput(_))));
        assert!(matches!(session.guess(' '), Err(QuizError::InvalidInput(_))));
        assert!(matches!(session.guess('ß'), Err(QuizError::InvalidInput(_))));
        assert_eq!(session.guessed_letters().len(), 1);
        assert_eq!(session.attempts_used(), 0);
        assert_eq!(session.score(), 10);
    }

    #[test]
    fn test_timer_expiry_loses_round() {
        let mut session = GameSession::start("cat", "hint", 6, 3).unwrap();
        session.guess('c').unwrap();

        assert_eq!(session.tick(), SessionStatus::Active);
        assert_eq!(session.tick(), SessionStatus::Active);
        assert_eq!(session.time_remaining_seconds(), 1);
        assert_eq!(session.tick(), SessionStatus::Lost);
        assert_eq!(session.loss_reason(), Some(LossReason::TimeExpired));

        // letters already earned are kept, nothing more is scored
        assert_eq!(session.score(), 10);
        assert_eq!(session.guess('a').unwrap(), GuessFeedback::Inactive);
        assert_eq!(session.score(), 10);
    }

    #[test]
    fn test_expire_ignores_remaining_attempts() {
        let mut session = session("cat", 6);
        assert!(session.expire());
        assert_eq!(session.status(), SessionStatus::Lost);
        assert_eq!(session.lives_remaining(), 6);
        assert!(!session.expire());
    }

    #[test]
    fn test_untimed_session_never_expires_by_tick() {
        let mut session = GameSession::start("cat", "hint", 6, 0).unwrap();
        for _ in 0..1000 {
            session.tick();
        }
        assert_eq!(session.status(), SessionStatus::Active);
    }

    #[test]
    fn test_spaces_are_not_guessed() {
        let mut session = session("ice cream", 3);
        assert_eq!(session.display_text(), "_ _ _   _ _ _ _ _");
        assert!(matches!(session.current_display()[3], DisplayCell::Gap));

        guess_all(&mut session, "icerma");
        assert_eq!(session.status(), SessionStatus::Won);
        assert_eq!(session.display_text(), "I C E   C R E A M");
    }

    #[test]
    fn test_time_decayed_score_settles_on_win() {
        let config = GameConfig {
            max_wrong_guesses: 5,
            time_limit_seconds: 120,
            scoring_policy: ScoringPolicy::time_decayed(),
            ..GameConfig::default()
        };
        let mut session = GameSession::start_with_config("cat", "hint", None, config).unwrap();

        session.guess('x').unwrap();
        for _ in 0..10 {
            session.tick();
        }
        session.guess('c').unwrap();
        session.guess('a').unwrap();
        assert_eq!(session.score(), 0);
        // 100 - 10 * 1 + (60 - 10)
        assert_eq!(session.projected_score(), 140);

        session.guess('t').unwrap();
        assert_eq!(session.status(), SessionStatus::Won);
        assert_eq!(session.score(), 140);
        assert_eq!(session.projected_score(), 140);
    }

    #[test]
    fn test_time_decayed_loss_scores_zero() {
        let config = GameConfig {
            max_wrong_guesses: 1,
            scoring_policy: ScoringPolicy::time_decayed(),
            ..GameConfig::default()
        };
        let mut session = GameSession::start_with_config("cat", "hint", None, config).unwrap();
        session.guess('c').unwrap();
        session.guess('z').unwrap();

        assert_eq!(session.status(), SessionStatus::Lost);
        assert_eq!(session.score(), 0);
    }

    #[test]
    fn test_outcome_only_for_terminal_sessions() {
        let mut session = session("ox", 3);
        assert!(session.outcome().is_none());

        guess_all(&mut session, "ox");
        let outcome = session.outcome().unwrap();
        assert!(outcome.won());
        assert_eq!(outcome.word(), "OX");
        assert_eq!(outcome.score(), 70);
        assert!(outcome.ended_at() >= session.started_at());
    }

    #[test]
    fn test_view_hides_answer_until_over() {
        let mut session = session("ox", 1);
        assert_eq!(session.view().answer, None);
        assert_eq!(session.view().display_text, "_ _");

        session.guess('z').unwrap();
        let view = session.view();
        assert_eq!(view.status, SessionStatus::Lost);
        assert_eq!(view.answer.as_deref(), Some("OX"));
        assert_eq!(view.guessed_letters, vec!['Z']);
    }

    #[test]
    fn test_correct_letters_subset_of_guessed() {
        let mut session = session("mississippi", 26);
        for letter in "zmqsxipa".chars() {
            session.guess(letter).unwrap();
            assert!(session.correct_letters().is_subset(session.guessed_letters()));
            assert!(
                session
                    .correct_letters()
                    .iter()
                    .all(|c| session.target_word().contains(*c))
            );
        }
    }
}
