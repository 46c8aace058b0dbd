pub mod model;
pub mod service;
pub mod store;

pub use model::{NewUser, User, UserProfile};
pub use service::{LoginToken, UserError, UserService};
pub use store::{MemoryUserStore, PgUserStore, UserStore};
