pub mod api;
pub mod conversation;
pub mod message;

pub use api::{ErrorResponse, GenerateRequest, GenerateResponse};
pub use conversation::{Conversation, DEFAULT_TITLE};
pub use message::{Message, Role};
