use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::error::ValidationError;

pub type WordId = i64;
pub type UserId = i64;

/// A user-owned vocabulary entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Word {
    pub id: WordId,
    pub word: String,
    pub definition: String,
    pub user_id: UserId,
    pub created_at: DateTime<Utc>,

    /// Derived from the four training flags, see [`Word::derived_status`]
    pub is_learned: bool,
    pub cards: bool,
    pub word_translation: bool,
    pub constructor: bool,
    pub word_audio: bool,
}

impl Word {
    /// Learned status implied by the training flags
    pub fn derived_status(&self) -> bool {
        self.cards && self.word_translation && self.constructor && self.word_audio
    }

    /// True when the stored `is_learned` disagrees with the training flags
    pub fn status_is_stale(&self) -> bool {
        self.is_learned != self.derived_status()
    }

    /// Key used for the per-owner uniqueness rule
    pub fn unique_key(&self) -> (UserId, String) {
        (self.user_id, normalize_word(&self.word))
    }
}

/// Validated input for a new word. Training flags all start false.
#[derive(Debug, Clone, PartialEq)]
pub struct NewWord {
    pub word: String,
    pub definition: String,
    pub user_id: UserId,
}

impl NewWord {
    pub fn new(
        word: impl AsRef<str>,
        definition: impl AsRef<str>,
        user_id: UserId,
    ) -> Result<Self, ValidationError> {
        let word = word.as_ref().trim();
        let definition = definition.as_ref().trim();

        if word.is_empty() {
            return Err(ValidationError::EmptyValue("word".to_string()));
        }
        if definition.is_empty() {
            return Err(ValidationError::EmptyValue("definition".to_string()));
        }

        Ok(Self {
            word: word.to_string(),
            definition: definition.to_string(),
            user_id,
        })
    }

    pub fn unique_key(&self) -> (UserId, String) {
        (self.user_id, normalize_word(&self.word))
    }
}

/// Case and surrounding whitespace do not distinguish two words of one owner
pub fn normalize_word(word: &str) -> String {
    word.trim().to_lowercase()
}
