use anyhow::Result;
use async_trait::async_trait;
use sea_orm::{ActiveValue, DatabaseConnection, EntityTrait, QueryOrder, TransactionTrait};
use uuid::Uuid;

use crate::entities::{prelude::*, questions};
use quiz_core::{QuestionStore, apply_patch, now_millis};
use quiz_types::{NewQuestion, Question, QuestionPatch};

#[derive(Clone)]
pub struct QuestionRepository {
    db: DatabaseConnection,
}

impl QuestionRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    fn model_to_question(model: questions::Model) -> Question {
        Question {
            id: model.id,
            word: model.word,
            hint: model.hint,
            category: model.category,
            created_at: model.created_at,
        }
    }
}

#[async_trait]
impl QuestionStore for QuestionRepository {
    async fn list_all(&self) -> Result<Vec<Question>> {
        let models = Questions::find()
            .order_by_asc(questions::Column::CreatedAt)
            .all(&self.db)
            .await?;

        Ok(models.into_iter().map(Self::model_to_question).collect())
    }

    async fn get(&self, id: &str) -> Result<Option<Question>> {
        let model = Questions::find_by_id(id).one(&self.db).await?;
        Ok(model.map(Self::model_to_question))
    }

    async fn add(&self, question: NewQuestion) -> Result<Question> {
        let question_model = questions::ActiveModel {
            id: ActiveValue::Set(Uuid::new_v4().to_string()),
            word: ActiveValue::Set(question.word),
            hint: ActiveValue::Set(question.hint),
            category: ActiveValue::Set(question.category),
            created_at: ActiveValue::Set(now_millis()),
        };

        let saved_model = Questions::insert(question_model).exec(&self.db).await?;

        // Fetch the created question
        let created = Questions::find_by_id(saved_model.last_insert_id)
            .one(&self.db)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Failed to retrieve created question"))?;

        Ok(Self::model_to_question(created))
    }

    async fn add_all(&self, batch: Vec<NewQuestion>) -> Result<Vec<Question>> {
        let created_at = now_millis();
        let added: Vec<Question> = batch
            .into_iter()
            .map(|question| Question {
                id: Uuid::new_v4().to_string(),
                word: question.word,
                hint: question.hint,
                category: question.category,
                created_at,
            })
            .collect();

        let txn = self.db.begin().await?;
        for question in &added {
            let question_model = questions::ActiveModel {
                id: ActiveValue::Set(question.id.clone()),
                word: ActiveValue::Set(question.word.clone()),
                hint: ActiveValue::Set(question.hint.clone()),
                category: ActiveValue::Set(question.category.clone()),
                created_at: ActiveValue::Set(question.created_at),
            };
            Questions::insert(question_model).exec(&txn).await?;
        }
        txn.commit().await?;

        Ok(added)
    }

    async fn update(&self, id: &str, patch: QuestionPatch) -> Result<Option<Question>> {
        let Some(model) = Questions::find_by_id(id).one(&self.db).await? else {
            return Ok(None);
        };

        let mut question = Self::model_to_question(model);
        apply_patch(&mut question, patch);

        let updated_model = questions::ActiveModel {
            id: ActiveValue::Unchanged(question.id),
            word: ActiveValue::Set(question.word),
            hint: ActiveValue::Set(question.hint),
            category: ActiveValue::Set(question.category),
            created_at: ActiveValue::Unchanged(question.created_at),
        };

        let saved = Questions::update(updated_model).exec(&self.db).await?;
        Ok(Some(Self::model_to_question(saved)))
    }

    async fn remove(&self, id: &str) -> Result<bool> {
        let result = Questions::delete_by_id(id).exec(&self.db).await?;
        Ok(result.rows_affected > 0)
    }
}
