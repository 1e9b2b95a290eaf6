use quiz_types::{NewQuestion, Question, QuestionPatch};
use rand::Rng;
use rand::seq::SliceRandom;
use tracing::info;

use crate::store::QuestionStore;
use crate::{PersistenceStep, QuizError, Result};

/// Canonicalize a playable word: ASCII letters and single spaces, UPPERCASE.
pub fn normalize_word(word: &str) -> Result<String> {
    let canonical = word
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_ascii_uppercase();

    if canonical.is_empty() {
        return Err(QuizError::InvalidInput("word must not be empty".to_string()));
    }
    if let Some(bad) = canonical
        .chars()
        .find(|c| !c.is_ascii_alphabetic() && *c != ' ')
    {
        return Err(QuizError::InvalidInput(format!(
            "word may only contain letters and spaces, found '{}'",
            bad
        )));
    }

    Ok(canonical)
}

/// Normalize a single guessed letter to UPPERCASE A-Z
pub fn normalize_letter(letter: char) -> Result<char> {
    if letter.is_ascii_alphabetic() {
        Ok(letter.to_ascii_uppercase())
    } else {
        Err(QuizError::InvalidInput(format!(
            "'{}' is not a letter of the alphabet",
            letter
        )))
    }
}

fn normalize_hint(hint: &str) -> Result<String> {
    let hint = hint.trim();
    if hint.is_empty() {
        return Err(QuizError::InvalidInput("hint must not be empty".to_string()));
    }
    Ok(hint.to_string())
}

fn normalize_category(category: Option<&str>) -> Option<String> {
    category
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(str::to_string)
}

/// Validate admin input before it is handed to a question store
pub fn validate_new_question(question: NewQuestion) -> Result<NewQuestion> {
    Ok(NewQuestion {
        word: normalize_word(&question.word)?,
        hint: normalize_hint(&question.hint)?,
        category: normalize_category(question.category.as_deref()),
    })
}

/// Validate the fields present in a patch. An empty category stays
/// `Some("")` so the store knows to clear it.
pub fn validate_patch(patch: QuestionPatch) -> Result<QuestionPatch> {
    Ok(QuestionPatch {
        word: patch.word.as_deref().map(normalize_word).transpose()?,
        hint: patch.hint.as_deref().map(normalize_hint).transpose()?,
        category: patch
            .category
            .map(|c| normalize_category(Some(c.as_str())).unwrap_or_default()),
    })
}

/// Apply an already validated patch to a stored question
pub fn apply_patch(question: &mut Question, patch: QuestionPatch) {
    if let Some(word) = patch.word {
        question.word = word;
    }
    if let Some(hint) = patch.hint {
        question.hint = hint;
    }
    if let Some(category) = patch.category {
        question.category = if category.is_empty() {
            None
        } else {
            Some(category)
        };
    }
}

/// Built-in question set used when an empty store is seeded
pub fn default_questions() -> Vec<NewQuestion> {
    [
        ("RUST", "A systems language named after a fungus", "Programming"),
        ("PYTHON", "A large snake, or a popular scripting language", "Programming"),
        ("ELEPHANT", "The largest land animal", "Animals"),
        ("GIRAFFE", "The tallest animal on earth", "Animals"),
        ("JAKARTA", "Capital city of Indonesia", "Geography"),
        ("VOLCANO", "A mountain that can erupt", "Geography"),
        ("KEYBOARD", "You type on it", "Technology"),
        ("ICE CREAM", "A frozen dessert", "Food"),
    ]
    .into_iter()
    .map(|(word, hint, category)| NewQuestion {
        word: word.to_string(),
        hint: hint.to_string(),
        category: Some(category.to_string()),
    })
    .collect()
}

/// Read-only snapshot of playable questions
#[derive(Debug, Clone, Default)]
pub struct WordBank {
    questions: Vec<Question>,
}

impl WordBank {
    /// Build a bank from questions already in memory. Entries whose word
    /// cannot be played are skipped.
    pub fn from_questions(questions: Vec<Question>) -> Self {
        let questions = questions
            .into_iter()
            .filter_map(|mut question| match normalize_word(&question.word) {
                Ok(word) => {
                    question.word = word;
                    Some(question)
                }
                Err(err) => {
                    tracing::warn!("Skipping unplayable question {}: {}", question.id, err);
                    None
                }
            })
            .collect();

        Self { questions }
    }

    /// Snapshot every question in the store
    pub async fn load(store: &dyn QuestionStore) -> Result<Self> {
        let questions = store
            .list_all()
            .await
            .map_err(QuizError::persistence(None, PersistenceStep::LoadQuestions))?;

        let bank = Self::from_questions(questions);
        if bank.is_empty() {
            return Err(QuizError::EmptyBank);
        }

        info!("Loaded word bank with {} questions", bank.len());
        Ok(bank)
    }

    pub fn pick_random(&self) -> Result<&Question> {
        self.pick_random_with(&mut rand::thread_rng())
    }

    pub fn pick_random_with<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<&Question> {
        self.questions.choose(rng).ok_or(QuizError::EmptyBank)
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }
}
