use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::{Mutex, OwnedMutexGuard};

use super::entity::{NewWord, UserId, Word, WordId};
use super::error::StoreError;
use super::field::WordField;
use super::store::{WordStore, WordTransaction};

#[derive(Debug, Clone, Default)]
struct MemoryState {
    words: BTreeMap<WordId, Word>,
    next_id: WordId,
}

impl MemoryState {
    fn ensure_unique(&self, candidate: &Word) -> Result<(), StoreError> {
        let key = candidate.unique_key();
        let clash = self
            .words
            .values()
            .any(|other| other.id != candidate.id && other.unique_key() == key);

        if clash {
            return Err(StoreError::Conflict(format!(
                "word '{}' already exists for user {}",
                candidate.word, candidate.user_id
            )));
        }
        Ok(())
    }
}

/// Process-local word store.
///
/// Used by the `memory` database backend and by tests. Every transaction
/// holds the single state lock until it commits or is dropped, so
/// transactions are fully serialized.
#[derive(Debug, Clone, Default)]
pub struct MemoryWordStore {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryWordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-populated with existing rows (ids are kept as given)
    pub fn with_words(words: impl IntoIterator<Item = Word>) -> Self {
        let mut state = MemoryState::default();
        for word in words {
            state.next_id = state.next_id.max(word.id);
            state.words.insert(word.id, word);
        }
        Self {
            state: Arc::new(Mutex::new(state)),
        }
    }
}

#[async_trait]
impl WordStore for MemoryWordStore {
    async fn find_by_id(&self, word_id: WordId) -> Result<Option<Word>, StoreError> {
        let state = self.state.lock().await;
        Ok(state.words.get(&word_id).cloned())
    }

    async fn find_by_owner(&self, user_id: UserId) -> Result<Vec<Word>, StoreError> {
        let state = self.state.lock().await;
        let mut words: Vec<Word> = state
            .words
            .values()
            .filter(|word| word.user_id == user_id)
            .cloned()
            .collect();
        words.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(words)
    }

    async fn insert(&self, new_word: NewWord) -> Result<Word, StoreError> {
        let mut state = self.state.lock().await;

        let word = Word {
            id: state.next_id + 1,
            word: new_word.word,
            definition: new_word.definition,
            user_id: new_word.user_id,
            created_at: Utc::now(),
            is_learned: false,
            cards: false,
            word_translation: false,
            constructor: false,
            word_audio: false,
        };
        state.ensure_unique(&word)?;

        state.next_id = word.id;
        state.words.insert(word.id, word.clone());
        Ok(word)
    }

    async fn begin(&self) -> Result<Box<dyn WordTransaction>, StoreError> {
        let guard = self.state.clone().lock_owned().await;
        let staged = guard.clone();
        Ok(Box::new(MemoryTransaction { guard, staged }))
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

/// Writes go to a staged copy that replaces the shared state on commit
struct MemoryTransaction {
    guard: OwnedMutexGuard<MemoryState>,
    staged: MemoryState,
}

impl MemoryTransaction {
    fn word_mut(&mut self, word_id: WordId) -> Result<&mut Word, StoreError> {
        self.staged.words.get_mut(&word_id).ok_or(StoreError::NotFound)
    }
}

#[async_trait]
impl WordTransaction for MemoryTransaction {
    async fn find_by_id(&mut self, word_id: WordId) -> Result<Option<Word>, StoreError> {
        Ok(self.staged.words.get(&word_id).cloned())
    }

    async fn apply_field_updates(
        &mut self,
        word_id: WordId,
        fields: &[WordField],
    ) -> Result<(), StoreError> {
        let mut updated = self.word_mut(word_id)?.clone();
        for field in fields {
            field.apply_to(&mut updated);
        }
        self.staged.ensure_unique(&updated)?;

        self.staged.words.insert(word_id, updated);
        Ok(())
    }

    async fn set_learned_status(
        &mut self,
        word_id: WordId,
        is_learned: bool,
    ) -> Result<(), StoreError> {
        self.word_mut(word_id)?.is_learned = is_learned;
        Ok(())
    }

    async fn delete(&mut self, word_id: WordId) -> Result<(), StoreError> {
        self.staged
            .words
            .remove(&word_id)
            .map(|_| ())
            .ok_or(StoreError::NotFound)
    }

    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        let MemoryTransaction { mut guard, staged } = *self;
        *guard = staged;
        Ok(())
    }
}
