use dashmap::DashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinSet;
use tokio::time::MissedTickBehavior;
use tracing::{error, info, warn};

use crate::auth::Identity;
use crate::error::ApiError;
use quiz_core::{
    QuestionCatalog, QuizError, RoundController, ScoreKeeper, TracingEventHandler, WordBank,
};
use quiz_types::{GameConfig, GuessResponse, OutcomeSummary, SessionView, UserId};

type Reply<T> = oneshot::Sender<Result<T, QuizError>>;

enum SessionCommand {
    Start { reply: Reply<SessionView> },
    Guess { letter: char, reply: Reply<GuessResponse> },
    View { reply: Reply<SessionView> },
    Abandon { reply: Reply<bool> },
}

struct SessionHandle {
    sender: mpsc::UnboundedSender<SessionCommand>,
    last_activity: Instant,
}

/// Owns one player's round. Commands and clock ticks are handled one at a
/// time, so a guess and a timeout can never interleave.
struct SessionActor {
    identity: Identity,
    controller: RoundController,
    catalog: QuestionCatalog,
    keeper: ScoreKeeper,
    seed_defaults: bool,
}

impl SessionActor {
    async fn run(mut self, mut commands: mpsc::UnboundedReceiver<SessionCommand>) {
        let mut clock = tokio::time::interval(Duration::from_secs(1));
        clock.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                command = commands.recv() => {
                    let Some(command) = command else {
                        break;
                    };
                    if self.handle(command).await {
                        clock.reset();
                    }
                }
                _ = clock.tick(), if self.controller.has_active_round() => {
                    self.on_tick().await;
                }
            }
        }

        // Finished rounds are still recorded when the player goes away
        if let Err(err) = self.record_pending().await {
            error!("Dropping unrecorded outcome for {}: {}", self.identity.id, err);
        }
        info!("Session for {} closed", self.identity.id);
    }

    /// Returns true when a new round was started
    async fn handle(&mut self, command: SessionCommand) -> bool {
        match command {
            SessionCommand::Start { reply } => {
                let result = self.start_round().await;
                let started = result.is_ok();
                let _ = reply.send(result);
                started
            }
            SessionCommand::Guess { letter, reply } => {
                let _ = reply.send(self.guess(letter).await);
                false
            }
            SessionCommand::View { reply } => {
                let _ = reply.send(self.controller.view());
                false
            }
            SessionCommand::Abandon { reply } => {
                let result = match self.record_pending().await {
                    Ok(_) => Ok(self.controller.abandon()),
                    Err(err) => Err(err),
                };
                let _ = reply.send(result);
                false
            }
        }
    }

    async fn start_round(&mut self) -> Result<SessionView, QuizError> {
        // A finished round must be recorded before it is replaced
        self.record_pending().await?;

        let bank: WordBank = self.catalog.load_bank(self.seed_defaults).await?;
        self.controller.replace_bank(bank);
        let session = self.controller.start_next()?;

        info!(
            "Player {} started a round ({} letters)",
            self.identity.id,
            session.target_word().len()
        );
        Ok(session.view())
    }

    async fn guess(&mut self, letter: char) -> Result<GuessResponse, QuizError> {
        let feedback = self.controller.guess(letter)?;
        let recorded = self.record_pending().await?;

        Ok(GuessResponse {
            feedback,
            session: self.controller.view()?,
            recorded,
        })
    }

    async fn on_tick(&mut self) {
        let Some(status) = self.controller.tick() else {
            return;
        };
        if status.is_terminal() {
            if let Err(err) = self.record_pending().await {
                // kept pending, retried on the next command
                error!("Failed to record timed out round for {}: {}", self.identity.id, err);
            }
        }
    }

    async fn record_pending(&mut self) -> Result<Option<OutcomeSummary>, QuizError> {
        let Some(outcome) = self.controller.pending_outcome() else {
            return Ok(None);
        };

        let recorded = self
            .keeper
            .record_outcome(&self.identity.id, &self.identity.username, &outcome)
            .await?;
        self.controller.mark_recorded();

        Ok(Some(OutcomeSummary {
            stats: recorded.stats,
            leaderboard: recorded.leaderboard,
        }))
    }
}

/// Routes player requests to per-player session actors
pub struct SessionManager {
    sessions: DashMap<UserId, SessionHandle>,
    actors: Mutex<JoinSet<()>>,
    game_config: GameConfig,
    catalog: QuestionCatalog,
    keeper: ScoreKeeper,
    seed_defaults: bool,
}

impl SessionManager {
    pub fn new(
        game_config: GameConfig,
        catalog: QuestionCatalog,
        keeper: ScoreKeeper,
        seed_defaults: bool,
    ) -> Self {
        Self {
            sessions: DashMap::new(),
            actors: Mutex::new(JoinSet::new()),
            game_config,
            catalog,
            keeper,
            seed_defaults,
        }
    }

    fn spawn_actor(&self, identity: &Identity) -> SessionHandle {
        let (sender, receiver) = mpsc::unbounded_channel();

        let mut controller = RoundController::new(self.game_config.clone(), WordBank::default());
        controller.add_event_handler(Box::new(TracingEventHandler::new(identity.id.clone())));

        let actor = SessionActor {
            identity: identity.clone(),
            controller,
            catalog: self.catalog.clone(),
            keeper: self.keeper.clone(),
            seed_defaults: self.seed_defaults,
        };
        self.lock_actors().spawn(actor.run(receiver));
        info!("Opened session for {}", identity.id);

        SessionHandle {
            sender,
            last_activity: Instant::now(),
        }
    }

    fn lock_actors(&self) -> MutexGuard<'_, JoinSet<()>> {
        self.actors.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn send(
        &self,
        user_id: &str,
        command: SessionCommand,
        create: Option<&Identity>,
    ) -> Result<(), ApiError> {
        let mut handle = match (self.sessions.get_mut(user_id), create) {
            (Some(handle), _) => handle,
            (None, Some(identity)) => self
                .sessions
                .entry(user_id.to_string())
                .or_insert_with(|| self.spawn_actor(identity)),
            (None, None) => return Err(QuizError::NotStarted.into()),
        };

        handle.last_activity = Instant::now();
        if handle.sender.send(command).is_err() {
            drop(handle);
            self.sessions.remove(user_id);
            warn!("Session actor for {} stopped unexpectedly", user_id);
            return Err(ApiError::SessionUnavailable {
                user_id: user_id.to_string(),
            });
        }
        Ok(())
    }

    async fn request<T>(
        &self,
        user_id: &str,
        create: Option<&Identity>,
        command: impl FnOnce(Reply<T>) -> SessionCommand,
    ) -> Result<T, ApiError> {
        let (reply, response) = oneshot::channel();
        self.send(user_id, command(reply), create)?;

        let result = response.await.map_err(|_| ApiError::SessionUnavailable {
            user_id: user_id.to_string(),
        })?;
        Ok(result?)
    }

    /// Start a new round, abandoning any active one
    pub async fn start(&self, identity: &Identity) -> Result<SessionView, ApiError> {
        self.request(&identity.id, Some(identity), |reply| {
            SessionCommand::Start { reply }
        })
        .await
    }

    pub async fn guess(&self, identity: &Identity, letter: &str) -> Result<GuessResponse, ApiError> {
        let letter = parse_letter(letter)?;
        self.request(&identity.id, None, |reply| SessionCommand::Guess {
            letter,
            reply,
        })
        .await
    }

    pub async fn view(&self, user_id: &str) -> Result<SessionView, ApiError> {
        self.request(user_id, None, |reply| SessionCommand::View { reply })
            .await
    }

    /// Leave the current round. An unfinished round is never recorded.
    pub async fn abandon(&self, user_id: &str) -> Result<bool, ApiError> {
        if !self.sessions.contains_key(user_id) {
            return Ok(false);
        }
        self.request(user_id, None, |reply| SessionCommand::Abandon { reply })
            .await
    }

    pub fn active_sessions(&self) -> usize {
        self.sessions.len()
    }

    /// Close sessions without activity for longer than `timeout`
    pub fn cleanup_idle_sessions(&self, timeout: Duration) -> usize {
        let before = self.sessions.len();
        self.sessions
            .retain(|_, handle| handle.last_activity.elapsed() <= timeout);

        let removed = before.saturating_sub(self.sessions.len());
        if removed > 0 {
            info!("Removed {} idle sessions", removed);
        }

        let mut actors = self.lock_actors();
        while let Some(result) = actors.try_join_next() {
            if let Err(e) = result {
                error!("Session actor failed: {}", e);
            }
        }
        removed
    }

    /// Close every session and wait for the actors to exit. Finished rounds
    /// that are still unrecorded get one last attempt on the way out.
    pub async fn shutdown(&self) -> usize {
        self.sessions.clear();

        let mut actors = std::mem::take(&mut *self.lock_actors());
        let mut joined = 0;
        while let Some(result) = actors.join_next().await {
            if let Err(e) = result {
                error!("Session actor failed: {}", e);
            }
            joined += 1;
        }

        info!("Closed {} session actors", joined);
        joined
    }
}

fn parse_letter(raw: &str) -> Result<char, QuizError> {
    let mut chars = raw.trim().chars();
    match (chars.next(), chars.next()) {
        (Some(letter), None) => Ok(letter),
        _ => Err(QuizError::InvalidInput(format!(
            "expected a single letter, got '{}'",
            raw
        ))),
    }
}
