use quiz_types::UserId;
use std::fmt;
use thiserror::Error;

/// Which store interaction failed while persisting or loading game data
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PersistenceStep {
    LoadQuestions,
    SaveQuestion,
    RemoveQuestion,
    ReadStats,
    ReadLeaderboard,
    CommitOutcome,
    ReadHistory,
}

impl fmt::Display for PersistenceStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PersistenceStep::LoadQuestions => "load questions",
            PersistenceStep::SaveQuestion => "save question",
            PersistenceStep::RemoveQuestion => "remove question",
            PersistenceStep::ReadStats => "read user stats",
            PersistenceStep::ReadLeaderboard => "read leaderboard",
            PersistenceStep::CommitOutcome => "commit outcome",
            PersistenceStep::ReadHistory => "read game history",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error)]
pub enum QuizError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("No round has been started")]
    NotStarted,

    #[error("No questions available")]
    EmptyBank,

    #[error("Question not found: {id}")]
    QuestionNotFound { id: String },

    #[error("Persistence failure during {step} (user: {})", .user_id.as_deref().unwrap_or("-"))]
    Persistence {
        user_id: Option<UserId>,
        step: PersistenceStep,
        #[source]
        source: anyhow::Error,
    },
}

impl QuizError {
    pub fn persistence(
        user_id: Option<&str>,
        step: PersistenceStep,
    ) -> impl FnOnce(anyhow::Error) -> QuizError + use<> {
        let user_id = user_id.map(str::to_string);
        move |source| QuizError::Persistence {
            user_id,
            step,
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, QuizError>;
