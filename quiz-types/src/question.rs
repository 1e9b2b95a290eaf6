use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::{QuestionId, Timestamp};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Question {
    pub id: QuestionId,
    pub word: String, // canonical UPPERCASE
    pub hint: String,
    pub category: Option<String>,
    pub created_at: Timestamp,
}

/// Admin input for a new question, validated before it reaches a store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewQuestion {
    pub word: String,
    pub hint: String,
    pub category: Option<String>,
}

/// Partial edit. `category: Some("")` clears the category.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct QuestionPatch {
    pub word: Option<String>,
    pub hint: Option<String>,
    pub category: Option<String>,
}
