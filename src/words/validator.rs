use super::entity::WordId;
use super::error::ValidationError;
use super::field::{WordField, WordUpdate};

/// Validated updates for a single word
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WordPatch {
    pub word_id: WordId,
    pub fields: Vec<WordField>,
}

impl WordPatch {
    pub fn new(word_id: WordId, fields: Vec<WordField>) -> Self {
        Self { word_id, fields }
    }

    /// Whether applying this patch requires recomputing `is_learned`
    pub fn touches_training(&self) -> bool {
        self.fields.iter().any(WordField::is_training)
    }
}

/// Validate a whole batch before anything is written.
///
/// Fails on the first structurally invalid pair. A field repeated within one
/// item keeps its last value.
pub fn validate_batch(batch: &[WordUpdate]) -> Result<Vec<WordPatch>, ValidationError> {
    if batch.is_empty() {
        return Err(ValidationError::NoUpdatesProvided);
    }

    batch.iter().map(validate_item).collect()
}

fn validate_item(item: &WordUpdate) -> Result<WordPatch, ValidationError> {
    if item.updates.is_empty() {
        return Err(ValidationError::NoUpdatesProvided);
    }

    let mut fields: Vec<WordField> = Vec::with_capacity(item.updates.len());
    for update in &item.updates {
        let field = WordField::parse(update)?;
        fields.retain(|existing| existing.name() != field.name());
        fields.push(field);
    }

    Ok(WordPatch::new(item.word_id, fields))
}
