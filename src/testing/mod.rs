use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};

use crate::words::entity::{NewWord, UserId, Word, WordId};
use crate::words::error::StoreError;
use crate::words::field::WordField;
use crate::words::memory::MemoryWordStore;
use crate::words::store::{WordStore, WordTransaction};

/// Untrained word `word{id}` owned by `owner`, with a fixed timestamp
pub fn word_fixture(id: WordId, owner: UserId) -> Word {
    Word {
        id,
        word: format!("word{}", id),
        definition: "greeting".to_string(),
        user_id: owner,
        created_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        is_learned: false,
        cards: false,
        word_translation: false,
        constructor: false,
        word_audio: false,
    }
}

/// Word with the given `[cards, word_translation, constructor, word_audio]`
/// flags and `is_learned` left false
pub fn trained_word(id: WordId, owner: UserId, flags: [bool; 4]) -> Word {
    let [cards, word_translation, constructor, word_audio] = flags;
    Word {
        cards,
        word_translation,
        constructor,
        word_audio,
        ..word_fixture(id, owner)
    }
}

/// Word store wrapper that counts every call and can fail status writes
#[derive(Clone)]
pub struct SpyWordStore {
    inner: MemoryWordStore,
    calls: Arc<AtomicUsize>,
    fail_status: Arc<AtomicBool>,
}

impl SpyWordStore {
    pub fn new(inner: MemoryWordStore) -> Self {
        Self {
            inner,
            calls: Arc::new(AtomicUsize::new(0)),
            fail_status: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Number of store and transaction calls made so far
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn fail_status_writes(&self, fail: bool) {
        self.fail_status.store(fail, Ordering::SeqCst);
    }

    /// Wrapped store, for assertions that should not count as calls
    pub fn inner(&self) -> &MemoryWordStore {
        &self.inner
    }

    fn record(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl WordStore for SpyWordStore {
    async fn find_by_id(&self, word_id: WordId) -> Result<Option<Word>, StoreError> {
        self.record();
        self.inner.find_by_id(word_id).await
    }

    async fn find_by_owner(&self, user_id: UserId) -> Result<Vec<Word>, StoreError> {
        self.record();
        self.inner.find_by_owner(user_id).await
    }

    async fn insert(&self, word: NewWord) -> Result<Word, StoreError> {
        self.record();
        self.inner.insert(word).await
    }

    async fn begin(&self) -> Result<Box<dyn WordTransaction>, StoreError> {
        self.record();
        let inner = self.inner.begin().await?;
        Ok(Box::new(SpyTransaction {
            inner,
            calls: self.calls.clone(),
            fail_status: self.fail_status.clone(),
        }))
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        self.record();
        self.inner.health_check().await
    }
}

struct SpyTransaction {
    inner: Box<dyn WordTransaction>,
    calls: Arc<AtomicUsize>,
    fail_status: Arc<AtomicBool>,
}

impl SpyTransaction {
    fn record(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl WordTransaction for SpyTransaction {
    async fn find_by_id(&mut self, word_id: WordId) -> Result<Option<Word>, StoreError> {
        self.record();
        self.inner.find_by_id(word_id).await
    }

    async fn apply_field_updates(
        &mut self,
        word_id: WordId,
        fields: &[WordField],
    ) -> Result<(), StoreError> {
        self.record();
        self.inner.apply_field_updates(word_id, fields).await
    }

    async fn set_learned_status(
        &mut self,
        word_id: WordId,
        is_learned: bool,
    ) -> Result<(), StoreError> {
        self.record();
        if self.fail_status.load(Ordering::SeqCst) {
            return Err(StoreError::Database("injected status write failure".to_string()));
        }
        self.inner.set_learned_status(word_id, is_learned).await
    }

    async fn delete(&mut self, word_id: WordId) -> Result<(), StoreError> {
        self.record();
        self.inner.delete(word_id).await
    }

    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        self.record();
        self.inner.commit().await
    }
}
