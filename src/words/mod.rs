pub mod entity;
pub mod error;
pub mod field;
pub mod guard;
pub mod memory;
pub mod postgres;
pub mod service;
pub mod store;
pub mod validator;

pub use entity::{NewWord, UserId, Word, WordId};
pub use error::{StoreError, ValidationError, VocabError};
pub use field::{FieldUpdate, Training, ValueKind, WordField, WordUpdate};
pub use memory::MemoryWordStore;
pub use postgres::PgWordStore;
pub use service::WordService;
pub use store::{WordStore, WordTransaction};
pub use validator::{validate_batch, WordPatch};
