use std::sync::Arc;

use super::entity::{NewWord, UserId, Word, WordId};
use super::error::{StoreError, VocabError};
use super::field::{Training, WordUpdate};
use super::guard;
use super::store::{WordStore, WordTransaction};
use super::validator::{validate_batch, WordPatch};

/// Word operations on behalf of an authenticated user.
///
/// Every mutation of an existing word runs in its own store transaction:
/// ownership check, field write and status recomputation commit together
/// or not at all.
#[derive(Clone)]
pub struct WordService {
    store: Arc<dyn WordStore>,
}

impl WordService {
    pub fn new(store: Arc<dyn WordStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<dyn WordStore> {
        &self.store
    }

    pub async fn create_word(
        &self,
        actor: UserId,
        word: &str,
        definition: &str,
    ) -> Result<Word, VocabError> {
        let new_word = NewWord::new(word, definition, actor)?;
        let word = self.store.insert(new_word).await?;
        tracing::info!("User {} created word {} ('{}')", actor, word.id, word.word);
        Ok(word)
    }

    pub async fn list_words(&self, actor: UserId) -> Result<Vec<Word>, VocabError> {
        Ok(self.store.find_by_owner(actor).await?)
    }

    pub async fn find_word(&self, actor: UserId, word_id: WordId) -> Result<Word, VocabError> {
        match self.store.find_by_id(word_id).await? {
            Some(word) if word.user_id == actor => Ok(word),
            _ => Err(VocabError::Forbidden(word_id)),
        }
    }

    pub async fn delete_word(&self, actor: UserId, word_id: WordId) -> Result<(), VocabError> {
        let mut tx = self.store.begin().await?;
        guard::authorize(tx.as_mut(), actor, word_id).await?;
        tx.delete(word_id).await?;
        tx.commit().await?;

        tracing::info!("User {} deleted word {}", actor, word_id);
        Ok(())
    }

    /// Apply a batch PATCH.
    ///
    /// The whole batch is validated first; nothing is written if any item is
    /// malformed. Items are then applied in order and the first failure stops
    /// the batch. Items committed before the failure stay committed.
    pub async fn apply_batch(
        &self,
        actor: UserId,
        batch: &[WordUpdate],
    ) -> Result<(), VocabError> {
        let patches = validate_batch(batch)?;

        for patch in &patches {
            self.apply_patch(actor, patch).await?;
        }

        tracing::debug!("User {} applied {} word update(s)", actor, patches.len());
        Ok(())
    }

    /// Record the outcome of one training exercise and return the word as
    /// committed by this call
    pub async fn record_training(
        &self,
        actor: UserId,
        word_id: WordId,
        training: Training,
        passed: bool,
    ) -> Result<Word, VocabError> {
        let patch = WordPatch::new(word_id, vec![training.field(passed)]);
        self.apply_patch(actor, &patch).await
    }

    /// Overwrite `is_learned` directly, without consulting the training
    /// flags. Callers of this path own the consistency of the result.
    pub async fn set_status(
        &self,
        actor: UserId,
        word_id: WordId,
        is_learned: bool,
    ) -> Result<(), VocabError> {
        let mut tx = self.store.begin().await?;
        guard::authorize(tx.as_mut(), actor, word_id).await?;

        tx.set_learned_status(word_id, is_learned)
            .await
            .map_err(|source| VocabError::StatusUpdateFailed { word_id, source })?;
        tx.commit()
            .await
            .map_err(|source| VocabError::StatusUpdateFailed { word_id, source })?;

        tracing::info!("User {} set word {} learned status to {}", actor, word_id, is_learned);
        Ok(())
    }

    async fn apply_patch(&self, actor: UserId, patch: &WordPatch) -> Result<Word, VocabError> {
        let word_id = patch.word_id;
        let mut tx = self.store.begin().await?;

        guard::authorize(tx.as_mut(), actor, word_id).await?;

        tx.apply_field_updates(word_id, &patch.fields)
            .await
            .map_err(|source| {
                tracing::error!("Failed to update word {}: {}", word_id, source);
                VocabError::UpdateFailed { word_id, source }
            })?;

        let word = if patch.touches_training() {
            recompute_status(tx.as_mut(), word_id)
                .await
                .map_err(|source| {
                    tracing::error!("Failed to recompute status of word {}: {}", word_id, source);
                    VocabError::StatusUpdateFailed { word_id, source }
                })?
        } else {
            reload(tx.as_mut(), word_id)
                .await
                .map_err(|source| VocabError::UpdateFailed { word_id, source })?
        };

        tx.commit()
            .await
            .map_err(|source| VocabError::UpdateFailed { word_id, source })?;
        Ok(word)
    }
}

async fn reload(tx: &mut dyn WordTransaction, word_id: WordId) -> Result<Word, StoreError> {
    tx.find_by_id(word_id).await?.ok_or(StoreError::NotFound)
}

/// Reload the word and persist `is_learned` if it no longer matches the flags
async fn recompute_status(tx: &mut dyn WordTransaction, word_id: WordId) -> Result<Word, StoreError> {
    let mut word = reload(tx, word_id).await?;

    if word.status_is_stale() {
        let is_learned = word.derived_status();
        tx.set_learned_status(word_id, is_learned).await?;
        word.is_learned = is_learned;
        tracing::info!("Word {} learned status changed to {}", word_id, is_learned);
    }
    Ok(word)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{trained_word, word_fixture, SpyWordStore};
    use crate::words::error::ValidationError;
    use crate::words::field::FieldUpdate;
    use crate::words::memory::MemoryWordStore;

    fn service_with(words: Vec<Word>) -> (WordService, MemoryWordStore) {
        let store = MemoryWordStore::with_words(words);
        (WordService::new(Arc::new(store.clone())), store)
    }

    async fn load(store: &MemoryWordStore, id: WordId) -> Word {
        store.find_by_id(id).await.unwrap().unwrap()
    }

    fn single(word_id: WordId, field: &str, value: impl Into<serde_json::Value>) -> Vec<WordUpdate> {
        vec![WordUpdate::new(word_id, vec![FieldUpdate::new(field, value)])]
    }

    #[tokio::test]
    async fn clearing_an_already_false_flag_keeps_status_false() {
        let (service, store) = service_with(vec![trained_word(1, 1, [true, false, false, false])]);

        service.apply_batch(1, &single(1, "word_audio", false)).await.unwrap();

        let word = load(&store, 1).await;
        assert!(!word.word_audio);
        assert!(!word.is_learned);
    }

    #[tokio::test]
    async fn completing_the_last_training_marks_word_learned() {
        let (service, store) = service_with(vec![trained_word(1, 1, [true, true, true, false])]);

        service.apply_batch(1, &single(1, "word_audio", true)).await.unwrap();

        let word = load(&store, 1).await;
        assert!(word.word_audio);
        assert!(word.is_learned);
    }

    #[tokio::test]
    async fn clearing_a_flag_unlearns_the_word() {
        let mut learned = trained_word(1, 1, [true, true, true, true]);
        learned.is_learned = true;
        let (service, store) = service_with(vec![learned]);

        service.apply_batch(1, &single(1, "cards", false)).await.unwrap();

        let word = load(&store, 1).await;
        assert!(!word.cards);
        assert!(!word.is_learned);
    }

    #[tokio::test]
    async fn unknown_field_is_rejected_without_storage_calls() {
        let spy = SpyWordStore::new(MemoryWordStore::with_words([word_fixture(1, 1)]));
        let service = WordService::new(Arc::new(spy.clone()));

        let err = service
            .apply_batch(1, &single(1, "nonexistent_field", true))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            VocabError::Validation(ValidationError::InvalidField(ref f)) if f == "nonexistent_field"
        ));
        assert_eq!(spy.calls(), 0);
    }

    #[tokio::test]
    async fn one_invalid_item_blocks_every_item() {
        let spy = SpyWordStore::new(MemoryWordStore::with_words([
            word_fixture(1, 1),
            word_fixture(2, 1),
        ]));
        let service = WordService::new(Arc::new(spy.clone()));

        let batch = vec![
            WordUpdate::new(1, vec![FieldUpdate::new("definition", "valid")]),
            WordUpdate::new(2, vec![FieldUpdate::new("cards", "not a boolean")]),
        ];
        let err = service.apply_batch(1, &batch).await.unwrap_err();

        assert!(matches!(
            err,
            VocabError::Validation(ValidationError::InvalidValueType { .. })
        ));
        assert_eq!(spy.calls(), 0);
        assert_eq!(spy.inner().find_by_id(1).await.unwrap().unwrap().definition, "greeting");
    }

    #[tokio::test]
    async fn empty_update_list_is_rejected() {
        let (service, _) = service_with(vec![word_fixture(1, 1)]);

        let err = service
            .apply_batch(1, &[WordUpdate::new(1, vec![])])
            .await
            .unwrap_err();
        assert!(matches!(err, VocabError::Validation(ValidationError::NoUpdatesProvided)));

        let err = service.apply_batch(1, &[]).await.unwrap_err();
        assert!(matches!(err, VocabError::Validation(ValidationError::NoUpdatesProvided)));
    }

    #[tokio::test]
    async fn foreign_word_is_forbidden_and_untouched() {
        let (service, store) = service_with(vec![word_fixture(1, 1), word_fixture(2, 2)]);

        let err = service.apply_batch(1, &single(2, "definition", "x")).await.unwrap_err();
        assert!(matches!(err, VocabError::Forbidden(2)));
        assert_eq!(load(&store, 2).await, word_fixture(2, 2));

        let err = service.set_status(1, 2, true).await.unwrap_err();
        assert!(matches!(err, VocabError::Forbidden(2)));

        let err = service.delete_word(1, 2).await.unwrap_err();
        assert!(matches!(err, VocabError::Forbidden(2)));
        assert_eq!(load(&store, 2).await, word_fixture(2, 2));
    }

    #[tokio::test]
    async fn forbidden_item_stops_the_rest_of_the_batch() {
        let (service, store) =
            service_with(vec![word_fixture(1, 1), word_fixture(2, 2), word_fixture(3, 1)]);

        let batch = vec![
            WordUpdate::new(1, vec![FieldUpdate::new("definition", "first")]),
            WordUpdate::new(2, vec![FieldUpdate::new("definition", "second")]),
            WordUpdate::new(3, vec![FieldUpdate::new("definition", "third")]),
        ];
        let err = service.apply_batch(1, &batch).await.unwrap_err();
        assert!(matches!(err, VocabError::Forbidden(2)));

        // earlier item committed, later item never attempted
        assert_eq!(load(&store, 1).await.definition, "first");
        assert_eq!(load(&store, 3).await.definition, "greeting");
    }

    #[tokio::test]
    async fn missing_word_is_forbidden() {
        let (service, _) = service_with(vec![]);
        let err = service.apply_batch(1, &single(42, "cards", true)).await.unwrap_err();
        assert!(matches!(err, VocabError::Forbidden(42)));
    }

    #[tokio::test]
    async fn applying_the_same_batch_twice_is_idempotent() {
        let (service, store) = service_with(vec![trained_word(1, 1, [true, true, false, true])]);
        let batch = vec![WordUpdate::new(
            1,
            vec![
                FieldUpdate::new("constructor", true),
                FieldUpdate::new("definition", "a greeting"),
            ],
        )];

        service.apply_batch(1, &batch).await.unwrap();
        let once = load(&store, 1).await;
        service.apply_batch(1, &batch).await.unwrap();
        let twice = load(&store, 1).await;

        assert_eq!(once, twice);
        assert!(twice.is_learned);
    }

    #[tokio::test]
    async fn status_invariant_holds_after_mixed_batches() {
        let (service, store) = service_with(vec![word_fixture(1, 1), word_fixture(2, 1)]);
        let steps: Vec<Vec<WordUpdate>> = vec![
            vec![
                WordUpdate::new(1, vec![FieldUpdate::new("cards", true), FieldUpdate::new("word_audio", true)]),
                WordUpdate::new(2, vec![FieldUpdate::new("constructor", true)]),
            ],
            vec![WordUpdate::new(
                1,
                vec![FieldUpdate::new("constructor", true), FieldUpdate::new("word_translation", true)],
            )],
            vec![WordUpdate::new(2, vec![FieldUpdate::new("constructor", false)])],
            vec![WordUpdate::new(1, vec![FieldUpdate::new("word_audio", false)])],
        ];

        for batch in steps {
            service.apply_batch(1, &batch).await.unwrap();
            for id in [1, 2] {
                let word = load(&store, id).await;
                assert_eq!(word.is_learned, word.derived_status(), "word {id}");
            }
        }
    }

    #[tokio::test]
    async fn failed_status_write_rolls_back_field_write() {
        let spy = SpyWordStore::new(MemoryWordStore::with_words([trained_word(
            1,
            1,
            [true, true, true, false],
        )]));
        spy.fail_status_writes(true);
        let service = WordService::new(Arc::new(spy.clone()));

        let err = service.apply_batch(1, &single(1, "word_audio", true)).await.unwrap_err();
        assert!(matches!(err, VocabError::StatusUpdateFailed { word_id: 1, .. }));

        let word = spy.inner().find_by_id(1).await.unwrap().unwrap();
        assert!(!word.word_audio);
        assert!(!word.is_learned);
    }

    #[tokio::test]
    async fn storage_conflict_surfaces_as_update_failed() {
        let (service, store) = service_with(vec![word_fixture(1, 1), word_fixture(2, 1)]);

        let err = service.apply_batch(1, &single(2, "word", " WORD1 ")).await.unwrap_err();
        assert!(matches!(
            err,
            VocabError::UpdateFailed { word_id: 2, source: StoreError::Conflict(_) }
        ));
        assert_eq!(load(&store, 2).await.word, "word2");
    }

    #[tokio::test]
    async fn non_training_update_skips_recompute() {
        let spy = SpyWordStore::new(MemoryWordStore::with_words([word_fixture(1, 1)]));
        spy.fail_status_writes(true);
        let service = WordService::new(Arc::new(spy.clone()));

        service.apply_batch(1, &single(1, "definition", "salutation")).await.unwrap();
        assert_eq!(spy.inner().find_by_id(1).await.unwrap().unwrap().definition, "salutation");
    }

    #[tokio::test]
    async fn set_status_overrides_without_recompute() {
        let (service, store) = service_with(vec![word_fixture(1, 1)]);

        service.set_status(1, 1, true).await.unwrap();

        let word = load(&store, 1).await;
        assert!(word.is_learned);
        assert!(!word.cards);
    }

    #[tokio::test]
    async fn record_training_recomputes_status() {
        let (service, _) = service_with(vec![trained_word(1, 1, [false, true, true, true])]);

        let word = service.record_training(1, 1, Training::Cards, true).await.unwrap();
        assert!(word.cards);
        assert!(word.is_learned);

        let word = service.record_training(1, 1, Training::WordTranslation, false).await.unwrap();
        assert!(!word.word_translation);
        assert!(!word.is_learned);
    }

    #[tokio::test]
    async fn record_training_returns_the_committed_word() {
        let (service, store) = service_with(vec![trained_word(1, 1, [true, true, true, false])]);

        let returned = service.record_training(1, 1, Training::WordAudio, true).await.unwrap();
        assert_eq!(returned, load(&store, 1).await);
        assert!(returned.is_learned);

        service.apply_batch(1, &single(1, "definition", "salutation")).await.unwrap();
        let returned = service.record_training(1, 1, Training::Cards, true).await.unwrap();
        assert_eq!(returned.definition, "salutation");
        assert_eq!(returned, load(&store, 1).await);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_trainings_on_one_word_serialize() {
        for _ in 0..50 {
            let (service, store) = service_with(vec![word_fixture(1, 1)]);

            let handles: Vec<_> = Training::ALL
                .into_iter()
                .map(|training| {
                    let service = service.clone();
                    tokio::spawn(async move { service.record_training(1, 1, training, true).await })
                })
                .collect();
            for handle in handles {
                handle.await.unwrap().unwrap();
            }

            // a lost update would leave one flag false or the status stale
            let word = load(&store, 1).await;
            assert!(word.cards && word.word_translation && word.constructor && word.word_audio);
            assert!(word.is_learned && word.derived_status());
        }
    }

    #[tokio::test]
    async fn create_list_find_delete() {
        let (service, _) = service_with(vec![]);

        let created = service.create_word(7, " perro ", " dog ").await.unwrap();
        assert_eq!(created.word, "perro");
        assert_eq!(created.definition, "dog");
        assert_eq!(created.user_id, 7);
        assert!(!created.is_learned);

        let dup = service.create_word(7, "Perro", "dog").await.unwrap_err();
        assert!(matches!(dup, VocabError::Storage(StoreError::Conflict(_))));

        let blank = service.create_word(7, "gato", "  ").await.unwrap_err();
        assert!(matches!(blank, VocabError::Validation(ValidationError::EmptyValue(_))));

        assert_eq!(service.list_words(7).await.unwrap().len(), 1);
        assert!(service.list_words(8).await.unwrap().is_empty());

        assert_eq!(service.find_word(7, created.id).await.unwrap(), created);
        assert!(matches!(
            service.find_word(8, created.id).await,
            Err(VocabError::Forbidden(_))
        ));

        service.delete_word(7, created.id).await.unwrap();
        assert!(service.list_words(7).await.unwrap().is_empty());
    }
}
