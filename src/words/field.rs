use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::entity::{Word, WordId};
use super::error::ValidationError;

/// Kind of value a patchable field accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueKind {
    String,
    Boolean,
}

impl ValueKind {
    fn matches(&self, value: &Value) -> bool {
        match self {
            ValueKind::String => value.is_string(),
            ValueKind::Boolean => value.is_boolean(),
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueKind::String => write!(f, "string"),
            ValueKind::Boolean => write!(f, "boolean"),
        }
    }
}

/// Fields a client may patch, with the value kind each expects.
/// `is_learned` is absent on purpose: it is derived.
pub const FIELD_TABLE: &[(&str, ValueKind)] = &[
    ("word", ValueKind::String),
    ("definition", ValueKind::String),
    ("cards", ValueKind::Boolean),
    ("word_translation", ValueKind::Boolean),
    ("constructor", ValueKind::Boolean),
    ("word_audio", ValueKind::Boolean),
];

/// Look up the expected kind of a patchable field
pub fn expected_kind(field: &str) -> Option<ValueKind> {
    FIELD_TABLE
        .iter()
        .find(|(name, _)| *name == field)
        .map(|(_, kind)| *kind)
}

/// One of the four learning exercises tracked per word
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Training {
    Cards,
    WordTranslation,
    Constructor,
    WordAudio,
}

impl Training {
    pub const ALL: [Training; 4] = [
        Training::Cards,
        Training::WordTranslation,
        Training::Constructor,
        Training::WordAudio,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Training::Cards => "cards",
            Training::WordTranslation => "word_translation",
            Training::Constructor => "constructor",
            Training::WordAudio => "word_audio",
        }
    }

    /// Field update that records the outcome of this training
    pub fn field(&self, passed: bool) -> WordField {
        match self {
            Training::Cards => WordField::Cards(passed),
            Training::WordTranslation => WordField::WordTranslation(passed),
            Training::Constructor => WordField::Constructor(passed),
            Training::WordAudio => WordField::WordAudio(passed),
        }
    }
}

impl fmt::Display for Training {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A typed, validated change to a single word field
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WordField {
    Word(String),
    Definition(String),
    Cards(bool),
    WordTranslation(bool),
    Constructor(bool),
    WordAudio(bool),
}

impl WordField {
    /// Parse a raw wire pair against [`FIELD_TABLE`]
    pub fn parse(update: &FieldUpdate) -> Result<Self, ValidationError> {
        let name = update.field.trim();
        let kind = match expected_kind(name) {
            Some(kind) => kind,
            None => return Err(ValidationError::InvalidField(name.to_string())),
        };

        if !kind.matches(&update.value) {
            return Err(ValidationError::InvalidValueType {
                field: name.to_string(),
                expected: kind,
            });
        }

        let field = match (name, &update.value) {
            ("word", Value::String(s)) => WordField::Word(non_empty(name, s)?),
            ("definition", Value::String(s)) => WordField::Definition(non_empty(name, s)?),
            ("cards", Value::Bool(b)) => WordField::Cards(*b),
            ("word_translation", Value::Bool(b)) => WordField::WordTranslation(*b),
            ("constructor", Value::Bool(b)) => WordField::Constructor(*b),
            ("word_audio", Value::Bool(b)) => WordField::WordAudio(*b),
            _ => return Err(ValidationError::InvalidField(name.to_string())),
        };

        Ok(field)
    }

    /// Column / wire name of the field
    pub fn name(&self) -> &'static str {
        match self {
            WordField::Word(_) => "word",
            WordField::Definition(_) => "definition",
            WordField::Cards(_) => "cards",
            WordField::WordTranslation(_) => "word_translation",
            WordField::Constructor(_) => "constructor",
            WordField::WordAudio(_) => "word_audio",
        }
    }

    pub fn training(&self) -> Option<Training> {
        match self {
            WordField::Cards(_) => Some(Training::Cards),
            WordField::WordTranslation(_) => Some(Training::WordTranslation),
            WordField::Constructor(_) => Some(Training::Constructor),
            WordField::WordAudio(_) => Some(Training::WordAudio),
            WordField::Word(_) | WordField::Definition(_) => None,
        }
    }

    pub fn is_training(&self) -> bool {
        self.training().is_some()
    }

    /// Write this change into an in-memory word
    pub fn apply_to(&self, word: &mut Word) {
        match self {
            WordField::Word(s) => word.word = s.clone(),
            WordField::Definition(s) => word.definition = s.clone(),
            WordField::Cards(b) => word.cards = *b,
            WordField::WordTranslation(b) => word.word_translation = *b,
            WordField::Constructor(b) => word.constructor = *b,
            WordField::WordAudio(b) => word.word_audio = *b,
        }
    }
}

fn non_empty(field: &str, value: &str) -> Result<String, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::EmptyValue(field.to_string()));
    }
    Ok(trimmed.to_string())
}

/// Raw `{ "field": ..., "value": ... }` pair as it arrives on the wire
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldUpdate {
    pub field: String,
    pub value: Value,
}

impl FieldUpdate {
    pub fn new(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            field: field.into(),
            value: value.into(),
        }
    }
}

/// Updates for one word inside a batch PATCH
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WordUpdate {
    #[serde(alias = "id")]
    pub word_id: WordId,
    #[serde(default)]
    pub updates: Vec<FieldUpdate>,
}

impl WordUpdate {
    pub fn new(word_id: WordId, updates: Vec<FieldUpdate>) -> Self {
        Self { word_id, updates }
    }
}
