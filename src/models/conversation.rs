use serde::{Deserialize, Serialize};

use super::message::{Message, Role};

pub const DEFAULT_TITLE: &str = "New Chat";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conversation {
    pub id: String,
    pub title: String,
    pub messages: Vec<Message>,
    /// Set once the user picks a title; such conversations are never
    /// retitled from their first message.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub renamed: bool,
}

impl Conversation {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: DEFAULT_TITLE.to_string(),
            messages: Vec::new(),
            renamed: false,
        }
    }

    pub fn has_default_title(&self) -> bool {
        !self.renamed && self.title == DEFAULT_TITLE
    }

    pub fn has_user_message(&self) -> bool {
        self.messages.iter().any(|m| m.sender == Role::User)
    }
}
