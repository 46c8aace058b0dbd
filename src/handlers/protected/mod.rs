pub mod auth;
pub mod vocab;
