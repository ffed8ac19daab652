pub mod chat;
pub mod database;
pub mod markdown;
pub mod session_store;
pub mod settings;
pub mod storage;

pub use chat::ChatView;
pub use database::Database;
pub use markdown::MarkdownRenderer;
pub use session_store::SessionStore;
pub use settings::{SettingsService, Theme};
pub use storage::{KeyValueStore, MemoryStore};
