use async_trait::async_trait;

use super::entity::{NewWord, UserId, Word, WordId};
use super::error::StoreError;
use super::field::WordField;

/// Persistence collaborator for words.
///
/// Mutations of an existing word go through a [`WordTransaction`] so that
/// the field write and the derived-status write commit together.
#[async_trait]
pub trait WordStore: Send + Sync {
    async fn find_by_id(&self, word_id: WordId) -> Result<Option<Word>, StoreError>;

    /// All words of one owner, newest first
    async fn find_by_owner(&self, user_id: UserId) -> Result<Vec<Word>, StoreError>;

    async fn insert(&self, word: NewWord) -> Result<Word, StoreError>;

    /// Open a transaction. Dropping it without `commit` discards its writes.
    async fn begin(&self) -> Result<Box<dyn WordTransaction>, StoreError>;

    async fn health_check(&self) -> Result<(), StoreError>;
}

/// Unit of work scoped to the words it touches.
///
/// `find_by_id` locks the row until commit or rollback, which serializes
/// concurrent transactions on the same word.
#[async_trait]
pub trait WordTransaction: Send {
    async fn find_by_id(&mut self, word_id: WordId) -> Result<Option<Word>, StoreError>;

    /// Write every field in one statement
    async fn apply_field_updates(
        &mut self,
        word_id: WordId,
        fields: &[WordField],
    ) -> Result<(), StoreError>;

    async fn set_learned_status(&mut self, word_id: WordId, is_learned: bool)
        -> Result<(), StoreError>;

    async fn delete(&mut self, word_id: WordId) -> Result<(), StoreError>;

    async fn commit(self: Box<Self>) -> Result<(), StoreError>;
}
