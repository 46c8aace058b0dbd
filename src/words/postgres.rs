use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder, Transaction};

use super::entity::{NewWord, UserId, Word, WordId};
use super::error::StoreError;
use super::field::WordField;
use super::store::{WordStore, WordTransaction};

const WORD_COLUMNS: &str = "id, word, definition, user_id, created_at, \
     is_learned, cards, word_translation, constructor, word_audio";

/// Word store backed by the `words` table
#[derive(Debug, Clone)]
pub struct PgWordStore {
    pool: PgPool,
}

impl PgWordStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl WordStore for PgWordStore {
    async fn find_by_id(&self, word_id: WordId) -> Result<Option<Word>, StoreError> {
        let sql = format!("SELECT {} FROM words WHERE id = $1", WORD_COLUMNS);
        let word = sqlx::query_as::<_, Word>(&sql)
            .bind(word_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(word)
    }

    async fn find_by_owner(&self, user_id: UserId) -> Result<Vec<Word>, StoreError> {
        let sql = format!(
            "SELECT {} FROM words WHERE user_id = $1 ORDER BY created_at DESC, id DESC",
            WORD_COLUMNS
        );
        let words = sqlx::query_as::<_, Word>(&sql)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(words)
    }

    async fn insert(&self, word: NewWord) -> Result<Word, StoreError> {
        let sql = format!(
            "INSERT INTO words (word, definition, user_id) VALUES ($1, $2, $3) RETURNING {}",
            WORD_COLUMNS
        );
        let word = sqlx::query_as::<_, Word>(&sql)
            .bind(&word.word)
            .bind(&word.definition)
            .bind(word.user_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(word)
    }

    async fn begin(&self) -> Result<Box<dyn WordTransaction>, StoreError> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PgWordTransaction { tx }))
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

/// `UPDATE words SET <col> = $n, ... WHERE id = $n` for a non-empty field list
fn update_statement(word_id: WordId, fields: &[WordField]) -> QueryBuilder<'static, Postgres> {
    let mut query = QueryBuilder::<Postgres>::new("UPDATE words SET ");
    let mut assignments = query.separated(", ");
    for field in fields {
        // column names come from the closed WordField set, never from input
        assignments.push(field.name());
        assignments.push_unseparated(" = ");
        match field {
            WordField::Word(text) | WordField::Definition(text) => {
                assignments.push_bind_unseparated(text.clone());
            }
            WordField::Cards(flag)
            | WordField::WordTranslation(flag)
            | WordField::Constructor(flag)
            | WordField::WordAudio(flag) => {
                assignments.push_bind_unseparated(*flag);
            }
        }
    }
    query.push(" WHERE id = ").push_bind(word_id);
    query
}

struct PgWordTransaction {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl WordTransaction for PgWordTransaction {
    async fn find_by_id(&mut self, word_id: WordId) -> Result<Option<Word>, StoreError> {
        let sql = format!("SELECT {} FROM words WHERE id = $1 FOR UPDATE", WORD_COLUMNS);
        let word = sqlx::query_as::<_, Word>(&sql)
            .bind(word_id)
            .fetch_optional(&mut *self.tx)
            .await?;
        Ok(word)
    }

    async fn apply_field_updates(
        &mut self,
        word_id: WordId,
        fields: &[WordField],
    ) -> Result<(), StoreError> {
        if fields.is_empty() {
            return Ok(());
        }

        let mut query = update_statement(word_id, fields);
        let result = query.build().execute(&mut *self.tx).await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn set_learned_status(
        &mut self,
        word_id: WordId,
        is_learned: bool,
    ) -> Result<(), StoreError> {
        let result = sqlx::query("UPDATE words SET is_learned = $1 WHERE id = $2")
            .bind(is_learned)
            .bind(word_id)
            .execute(&mut *self.tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn delete(&mut self, word_id: WordId) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM words WHERE id = $1")
            .bind(word_id)
            .execute(&mut *self.tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        self.tx.commit().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_statement_binds_every_field_in_order() {
        let query = update_statement(
            7,
            &[WordField::Word("perro".to_string()), WordField::Cards(true)],
        );
        assert_eq!(
            query.sql(),
            "UPDATE words SET word = $1, cards = $2 WHERE id = $3"
        );
    }

    #[test]
    fn update_statement_with_one_training_flag() {
        let query = update_statement(1, &[WordField::WordAudio(false)]);
        assert_eq!(query.sql(), "UPDATE words SET word_audio = $1 WHERE id = $2");
    }
}
