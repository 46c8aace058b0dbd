use super::entity::{UserId, Word, WordId};
use super::error::VocabError;
use super::store::WordTransaction;

/// Confirm that `actor` owns `word_id`, returning the locked row.
///
/// A missing word is reported as `Forbidden` as well, so a caller cannot
/// probe for ids it does not own.
pub async fn authorize(
    tx: &mut dyn WordTransaction,
    actor: UserId,
    word_id: WordId,
) -> Result<Word, VocabError> {
    match tx.find_by_id(word_id).await? {
        Some(word) if word.user_id == actor => Ok(word),
        Some(word) => {
            tracing::warn!(
                "User {} attempted to modify word {} owned by user {}",
                actor,
                word_id,
                word.user_id
            );
            Err(VocabError::Forbidden(word_id))
        }
        None => {
            tracing::warn!("User {} attempted to modify missing word {}", actor, word_id);
            Err(VocabError::Forbidden(word_id))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::word_fixture;
    use crate::words::memory::MemoryWordStore;
    use crate::words::store::WordStore;

    #[tokio::test]
    async fn owner_is_authorized() {
        let store = MemoryWordStore::with_words([word_fixture(1, 10)]);
        let mut tx = store.begin().await.unwrap();

        let word = authorize(tx.as_mut(), 10, 1).await.unwrap();
        assert_eq!(word.id, 1);
    }

    #[tokio::test]
    async fn other_user_is_forbidden() {
        let store = MemoryWordStore::with_words([word_fixture(1, 10)]);
        let mut tx = store.begin().await.unwrap();

        let err = authorize(tx.as_mut(), 11, 1).await.unwrap_err();
        assert!(matches!(err, VocabError::Forbidden(1)));
    }

    #[tokio::test]
    async fn missing_word_is_forbidden_not_not_found() {
        let store = MemoryWordStore::new();
        let mut tx = store.begin().await.unwrap();

        let err = authorize(tx.as_mut(), 10, 99).await.unwrap_err();
        assert!(matches!(err, VocabError::Forbidden(99)));
    }
}
