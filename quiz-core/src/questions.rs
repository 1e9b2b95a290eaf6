use quiz_types::{NewQuestion, Question, QuestionPatch};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::store::QuestionStore;
use crate::word_bank::{default_questions, validate_new_question, validate_patch};
use crate::{PersistenceStep, QuizError, Result, WordBank};

/// Validated question administration on top of a [`QuestionStore`]
#[derive(Clone)]
pub struct QuestionCatalog {
    store: Arc<dyn QuestionStore>,
    // shared by clones, one seeding at a time
    seed_lock: Arc<Mutex<()>>,
}

impl QuestionCatalog {
    pub fn new(store: Arc<dyn QuestionStore>) -> Self {
        Self {
            store,
            seed_lock: Arc::new(Mutex::new(())),
        }
    }

    pub async fn list(&self) -> Result<Vec<Question>> {
        self.store
            .list_all()
            .await
            .map_err(QuizError::persistence(None, PersistenceStep::LoadQuestions))
    }

    pub async fn get(&self, id: &str) -> Result<Question> {
        self.store
            .get(id)
            .await
            .map_err(QuizError::persistence(None, PersistenceStep::LoadQuestions))?
            .ok_or_else(|| QuizError::QuestionNotFound { id: id.to_string() })
    }

    pub async fn add(&self, question: NewQuestion) -> Result<Question> {
        let question = validate_new_question(question).inspect_err(|err| {
            warn!("Rejected new question: {}", err);
        })?;

        let stored = self
            .store
            .add(question)
            .await
            .map_err(QuizError::persistence(None, PersistenceStep::SaveQuestion))?;

        info!("Added question {} ({})", stored.id, stored.word);
        Ok(stored)
    }

    pub async fn update(&self, id: &str, patch: QuestionPatch) -> Result<Question> {
        let patch = validate_patch(patch).inspect_err(|err| {
            warn!("Rejected update of question {}: {}", id, err);
        })?;

        let updated = self
            .store
            .update(id, patch)
            .await
            .map_err(QuizError::persistence(None, PersistenceStep::SaveQuestion))?
            .ok_or_else(|| QuizError::QuestionNotFound { id: id.to_string() })?;

        info!("Updated question {}", id);
        Ok(updated)
    }

    pub async fn remove(&self, id: &str) -> Result<()> {
        let removed = self
            .store
            .remove(id)
            .await
            .map_err(QuizError::persistence(None, PersistenceStep::RemoveQuestion))?;

        if !removed {
            return Err(QuizError::QuestionNotFound { id: id.to_string() });
        }
        info!("Removed question {}", id);
        Ok(())
    }

    /// Insert the built-in questions if the store holds none. Returns how
    /// many were added; the set is written as one unit.
    pub async fn seed_defaults(&self) -> Result<usize> {
        let _guard = self.seed_lock.lock().await;

        // Another caller may have seeded while we waited
        if !self.list().await?.is_empty() {
            return Ok(0);
        }

        let defaults = default_questions()
            .into_iter()
            .map(validate_new_question)
            .collect::<Result<Vec<_>>>()?;

        let seeded = self
            .store
            .add_all(defaults)
            .await
            .map_err(QuizError::persistence(None, PersistenceStep::SaveQuestion))?;

        info!("Seeded {} default questions", seeded.len());
        Ok(seeded.len())
    }

    /// Load a fresh bank, seeding the defaults first when the store is empty
    /// and `seed_when_empty` is set.
    pub async fn load_bank(&self, seed_when_empty: bool) -> Result<WordBank> {
        match WordBank::load(self.store.as_ref()).await {
            Err(QuizError::EmptyBank) if seed_when_empty => {
                warn!("Question store is empty, seeding defaults");
                self.seed_defaults().await?;
                WordBank::load(self.store.as_ref()).await
            }
            other => other,
        }
    }
}
