use quiz_types::{GameConfig, GuessFeedback, SessionStatus, SessionView};
use rand::Rng;
use tracing::debug;

use crate::game_events::{SessionEvent, SessionEventBus, SessionEventHandler};
use crate::{GameSession, QuizError, Result, SessionOutcome, WordBank};

/// Owns a player's current round together with the bank it is drawn from.
///
/// A finished round stays in place until the next one starts so its
/// outcome can be recorded, and recording is tracked so that it happens
/// at most once.
pub struct RoundController {
    config: GameConfig,
    bank: WordBank,
    current: Option<GameSession>,
    recorded: bool,
    events: SessionEventBus,
}

impl RoundController {
    pub fn new(config: GameConfig, bank: WordBank) -> Self {
        Self {
            config,
            bank,
            current: None,
            recorded: false,
            events: SessionEventBus::new(),
        }
    }

    pub fn add_event_handler(&mut self, handler: Box<dyn SessionEventHandler>) {
        self.events.add_handler(handler);
    }

    /// Swap in a freshly loaded bank. The running round keeps its word.
    pub fn replace_bank(&mut self, bank: WordBank) {
        self.bank = bank;
    }

    pub fn bank(&self) -> &WordBank {
        &self.bank
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn start_next(&mut self) -> Result<&GameSession> {
        self.start_next_with(&mut rand::thread_rng())
    }

    /// Draw a question and start a new round, abandoning any active one.
    pub fn start_next_with<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<&GameSession> {
        let question = self.bank.pick_random_with(rng)?;
        let session = GameSession::from_question(question, &self.config)?;

        self.abandon();

        self.events.publish(SessionEvent::RoundStarted {
            question_id: session.question_id().map(str::to_string),
            word_length: session.target_word().len(),
        });
        self.recorded = false;
        Ok(&*self.current.insert(session))
    }

    pub fn guess(&mut self, letter: char) -> Result<GuessFeedback> {
        let session = self.current.as_mut().ok_or(QuizError::NotStarted)?;
        let feedback = session.guess(letter)?;

        let letter = letter.to_ascii_uppercase();
        self.events
            .publish(SessionEvent::LetterGuessed { letter, feedback });

        if matches!(feedback, GuessFeedback::Hit | GuessFeedback::Miss) {
            self.publish_if_ended();
        }
        Ok(feedback)
    }

    /// One second of the round clock. `None` without a round.
    pub fn tick(&mut self) -> Option<SessionStatus> {
        let session = self.current.as_mut()?;
        if !session.is_active() {
            return Some(session.status());
        }

        let status = session.tick();
        if status.is_terminal() {
            self.publish_if_ended();
        }
        Some(status)
    }

    /// Force the active round to time out. Returns true if it ended here.
    pub fn expire(&mut self) -> bool {
        let expired = self.current.as_mut().is_some_and(GameSession::expire);
        if expired {
            self.publish_if_ended();
        }
        expired
    }

    /// Drop the current round without recording it. Returns true if an
    /// active round was abandoned.
    pub fn abandon(&mut self) -> bool {
        let Some(session) = self.current.take() else {
            return false;
        };

        if session.is_active() {
            self.events.publish(SessionEvent::RoundAbandoned {
                word: session.target_word().to_string(),
            });
            return true;
        }

        if !self.recorded {
            debug!("Discarding unrecorded outcome for {}", session.target_word());
        }
        false
    }

    pub fn session(&self) -> Option<&GameSession> {
        self.current.as_ref()
    }

    pub fn view(&self) -> Result<SessionView> {
        self.current
            .as_ref()
            .map(GameSession::view)
            .ok_or(QuizError::NotStarted)
    }

    pub fn has_active_round(&self) -> bool {
        self.current.as_ref().is_some_and(GameSession::is_active)
    }

    /// Outcome of a finished round that has not been recorded yet
    pub fn pending_outcome(&self) -> Option<SessionOutcome> {
        if self.recorded {
            return None;
        }
        self.current.as_ref().and_then(GameSession::outcome)
    }

    pub fn mark_recorded(&mut self) {
        if self.current.as_ref().is_some_and(|s| s.status().is_terminal()) {
            self.recorded = true;
        }
    }

    fn publish_if_ended(&mut self) {
        let Some(session) = self.current.as_ref() else {
            return;
        };

        let word = session.target_word().to_string();
        let score = session.score();
        let event = match (session.status(), session.loss_reason()) {
            (SessionStatus::Won, _) => SessionEvent::RoundWon { word, score },
            (SessionStatus::Lost, Some(reason)) => SessionEvent::RoundLost {
                word,
                score,
                reason,
            },
            _ => return,
        };
        self.events.publish(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quiz_types::{LossReason, Question};
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use std::sync::{Arc, Mutex};

    struct Recorder(Arc<Mutex<Vec<SessionEvent>>>);

    impl SessionEventHandler for Recorder {
        fn handle_event(&mut self, event: SessionEvent) {
            self.0.lock().unwrap().push(event);
        }
    }

    fn cat_bank() -> WordBank {
        WordBank::from_questions(vec![Question {
            id: "q-cat".to_string(),
            word: "cat".to_string(),
            hint: "meows".to_string(),
            category: Some("Animals".to_string()),
            created_at: 0,
        }])
    }

    fn controller() -> (RoundController, Arc<Mutex<Vec<SessionEvent>>>) {
        let events = Arc::new(Mutex::new(Vec::new()));
        let mut controller = RoundController::new(GameConfig::default(), cat_bank());
        controller.add_event_handler(Box::new(Recorder(events.clone())));
        (controller, events)
    }

    #[test]
    fn test_guess_before_start() {
        let (mut controller, _) = controller();
        assert!(matches!(controller.guess('a'), Err(QuizError::NotStarted)));
        assert!(matches!(controller.view(), Err(QuizError::NotStarted)));
        assert_eq!(controller.tick(), None);
        assert!(!controller.expire());
    }

    #[test]
    fn test_empty_bank() {
        let mut controller = RoundController::new(GameConfig::default(), WordBank::default());
        assert!(matches!(controller.start_next(), Err(QuizError::EmptyBank)));
        assert!(controller.session().is_none());
    }

    #[test]
    fn test_full_round_and_single_record() {
        let (mut controller, events) = controller();
        let mut rng = StdRng::seed_from_u64(1);
        let session = controller.start_next_with(&mut rng).unwrap();
        assert_eq!(session.question_id(), Some("q-cat"));

        for letter in ['c', 'x', 'a', 't'] {
            controller.guess(letter).unwrap();
        }

        let outcome = controller.pending_outcome().unwrap();
        assert!(outcome.won());
        assert_eq!(outcome.score(), 80);
        assert_eq!(controller.view().unwrap().display_text, "C A T");

        controller.mark_recorded();
        assert!(controller.pending_outcome().is_none());

        // later guesses do nothing and do not re-open the outcome
        assert_eq!(controller.guess('z').unwrap(), GuessFeedback::Inactive);
        assert!(controller.pending_outcome().is_none());

        let events = events.lock().unwrap();
        assert!(matches!(events[0], SessionEvent::RoundStarted { word_length: 3, .. }));
        assert_eq!(events.iter().filter(|e| e.is_terminal()).count(), 1);
    }

    #[test]
    fn test_mark_recorded_ignores_active_round() {
        let (mut controller, _) = controller();
        controller.start_next().unwrap();
        controller.mark_recorded();

        controller.guess('c').unwrap();
        controller.guess('a').unwrap();
        controller.guess('t').unwrap();
        assert!(controller.pending_outcome().is_some());
    }

    #[test]
    fn test_tick_times_out_round() {
        let mut controller = RoundController::new(
            GameConfig {
                time_limit_seconds: 2,
                ..GameConfig::default()
            },
            cat_bank(),
        );
        controller.start_next().unwrap();

        assert_eq!(controller.tick(), Some(SessionStatus::Active));
        assert_eq!(controller.tick(), Some(SessionStatus::Lost));
        assert_eq!(
            controller.session().unwrap().loss_reason(),
            Some(LossReason::TimeExpired)
        );

        // guess after expiry loses the race
        assert_eq!(controller.guess('c').unwrap(), GuessFeedback::Inactive);
        assert_eq!(controller.pending_outcome().unwrap().score(), 0);
    }

    #[test]
    fn test_abandon_is_never_recorded() {
        let (mut controller, events) = controller();
        controller.start_next().unwrap();
        controller.guess('c').unwrap();

        assert!(controller.abandon());
        assert!(controller.pending_outcome().is_none());
        assert!(controller.session().is_none());
        assert!(matches!(
            events.lock().unwrap().last(),
            Some(SessionEvent::RoundAbandoned { .. })
        ));
    }

    #[test]
    fn test_start_next_abandons_active_round() {
        let (mut controller, events) = controller();
        controller.start_next().unwrap();
        controller.guess('c').unwrap();
        controller.start_next().unwrap();

        assert!(controller.session().unwrap().guessed_letters().is_empty());
        let abandoned = events
            .lock()
            .unwrap()
            .iter()
            .filter(|e| matches!(e, SessionEvent::RoundAbandoned { .. }))
            .count();
        assert_eq!(abandoned, 1);
    }
}
