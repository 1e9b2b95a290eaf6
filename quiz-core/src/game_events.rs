use quiz_types::{GuessFeedback, LossReason};

#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    RoundStarted {
        question_id: Option<String>,
        word_length: usize,
    },
    LetterGuessed {
        letter: char,
        feedback: GuessFeedback,
    },
    RoundWon {
        word: String,
        score: i32,
    },
    RoundLost {
        word: String,
        score: i32,
        reason: LossReason,
    },
    RoundAbandoned {
        word: String,
    },
}

impl SessionEvent {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            SessionEvent::RoundWon { .. } | SessionEvent::RoundLost { .. }
        )
    }
}

/// Event handler trait for processing session events
pub trait SessionEventHandler: Send {
    fn handle_event(&mut self, event: SessionEvent);
}

/// Simple event bus for distributing session events
pub struct SessionEventBus {
    handlers: Vec<Box<dyn SessionEventHandler>>,
}

impl SessionEventBus {
    pub fn new() -> Self {
        Self {
            handlers: Vec::new(),
        }
    }

    pub fn add_handler(&mut self, handler: Box<dyn SessionEventHandler>) {
        self.handlers.push(handler);
    }

    pub fn publish(&mut self, event: SessionEvent) {
        for handler in &mut self.handlers {
            handler.handle_event(event.clone());
        }
    }
}

impl Default for SessionEventBus {
    fn default() -> Self {
        Self::new()
    }
}

/// Logs every event through `tracing`
pub struct TracingEventHandler {
    player: String,
}

impl TracingEventHandler {
    pub fn new(player: impl Into<String>) -> Self {
        Self {
            player: player.into(),
        }
    }
}

impl SessionEventHandler for TracingEventHandler {
    fn handle_event(&mut self, event: SessionEvent) {
        match &event {
            SessionEvent::RoundWon { word, score } => {
                tracing::info!("Player {} solved {} for {} points", self.player, word, score);
            }
            SessionEvent::RoundLost {
                word,
                score,
                reason,
            } => {
                tracing::info!(
                    "Player {} lost on {} ({:?}) with {} points",
                    self.player,
                    word,
                    reason,
                    score
                );
            }
            SessionEvent::RoundAbandoned { word } => {
                tracing::info!("Player {} abandoned the round on {}", self.player, word);
            }
            other => tracing::debug!("Player {}: {:?}", self.player, other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    struct TestHandler {
        events: Arc<Mutex<Vec<SessionEvent>>>,
    }

    impl SessionEventHandler for TestHandler {
        fn handle_event(&mut self, event: SessionEvent) {
            self.events.lock().unwrap().push(event);
        }
    }

    #[test]
    fn test_event_bus_fans_out() {
        let mut bus = SessionEventBus::new();
        let first = Arc::new(Mutex::new(Vec::new()));
        let second = Arc::new(Mutex::new(Vec::new()));

        bus.add_handler(Box::new(TestHandler {
            events: first.clone(),
        }));
        bus.add_handler(Box::new(TestHandler {
            events: second.clone(),
        }));

        let event = SessionEvent::RoundWon {
            word: "CAT".to_string(),
            score: 80,
        };
        bus.publish(event.clone());

        assert_eq!(first.lock().unwrap().as_slice(), &[event.clone()]);
        assert_eq!(second.lock().unwrap().as_slice(), &[event]);
    }

    #[test]
    fn test_terminal_events() {
        assert!(
            SessionEvent::RoundLost {
                word: "CAT".to_string(),
                score: 0,
                reason: LossReason::TimeExpired,
            }
            .is_terminal()
        );
        assert!(
            !SessionEvent::LetterGuessed {
                letter: 'C',
                feedback: GuessFeedback::Hit,
            }
            .is_terminal()
        );
    }
}
