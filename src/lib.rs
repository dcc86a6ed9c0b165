pub mod cli;
pub mod config;
pub mod error;
pub mod gateway;
pub mod session;
pub mod shell;

pub use error::ApiError;
pub use gateway::ApiClient;
pub use session::{FileStore, MemoryStore, Role, Session, SessionStore};
