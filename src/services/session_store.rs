use std::collections::HashSet;

use chrono::Utc;
use thiserror::Error;

use crate::models::{Conversation, Message, Role};
use crate::services::storage::KeyValueStore;

/// Storage key holding the JSON array of conversations.
pub const CONVERSATIONS_KEY: &str = "nexora_chats";

/// Titles derived from the first user message keep this many characters.
pub const TITLE_MAX_CHARS: usize = 25;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("Conversation not found: {0}")]
    NotFound(String),

    #[error("Conversation title cannot be empty")]
    EmptyTitle,
}

/// Ordered collection of conversations with exactly one active entry,
/// mirrored to a [`KeyValueStore`] after every mutation.
///
/// New conversations go to the front, so the front entry is always the most
/// recently created one.
#[derive(Debug)]
pub struct SessionStore<S> {
    storage: S,
    conversations: Vec<Conversation>,
    active: usize,
    // Highest timestamp ever issued or restored; ids are never reused.
    last_id_millis: i64,
}

impl<S: KeyValueStore> SessionStore<S> {
    /// Restore the collection from storage and pick the active conversation,
    /// creating a fresh one when nothing was stored.
    pub fn open(storage: S) -> Self {
        let conversations = restore(&storage);
        let last_id_millis = conversations
            .iter()
            .filter_map(|c| id_millis(&c.id))
            .max()
            .unwrap_or(0);
        let mut store = Self {
            storage,
            conversations,
            active: 0,
            last_id_millis,
        };
        if store.conversations.is_empty() {
            store.create_conversation();
        }
        store
    }

    pub fn conversations(&self) -> &[Conversation] {
        &self.conversations
    }

    pub fn active(&self) -> &Conversation {
        &self.conversations[self.active]
    }

    pub fn active_id(&self) -> &str {
        &self.active().id
    }

    pub fn get(&self, id: &str) -> Option<&Conversation> {
        self.conversations.iter().find(|c| c.id == id)
    }

    pub fn create_conversation(&mut self) -> String {
        let id = self.next_id();
        self.conversations.insert(0, Conversation::new(id.clone()));
        self.active = 0;
        self.save();
        tracing::debug!("Created conversation {}", id);
        id
    }

    pub fn switch_active(&mut self, id: &str) -> Result<&Conversation, SessionError> {
        let index = self.position(id)?;
        self.active = index;
        Ok(&self.conversations[index])
    }

    /// Remove a conversation. When the active one goes away the front entry
    /// becomes active, or a new conversation is created if none remain.
    pub fn delete_conversation(&mut self, id: &str) -> Result<(), SessionError> {
        let index = self.position(id)?;
        self.conversations.remove(index);

        if self.conversations.is_empty() {
            // create_conversation persists the removal as well
            self.create_conversation();
            return Ok(());
        }

        if index == self.active {
            self.active = 0;
        } else if index < self.active {
            self.active -= 1;
        }
        self.save();
        Ok(())
    }

    pub fn append_message(
        &mut self,
        conversation_id: &str,
        message: Message,
    ) -> Result<(), SessionError> {
        let index = self.position(conversation_id)?;
        let conversation = &mut self.conversations[index];

        let first_user_message = message.sender == Role::User && !conversation.has_user_message();
        if first_user_message && conversation.has_default_title() {
            conversation.title = derive_title(&message.text);
        }
        conversation.messages.push(message);

        self.save();
        Ok(())
    }

    pub fn rename_conversation(&mut self, id: &str, title: &str) -> Result<(), SessionError> {
        let title = title.trim();
        if title.is_empty() {
            return Err(SessionError::EmptyTitle);
        }
        let index = self.position(id)?;
        let conversation = &mut self.conversations[index];
        conversation.title = title.to_string();
        conversation.renamed = true;
        self.save();
        Ok(())
    }

    pub fn persist(&self) -> anyhow::Result<()> {
        let json = serde_json::to_string(&self.conversations)?;
        self.storage.set(CONVERSATIONS_KEY, &json)
    }

    fn save(&self) {
        if let Err(e) = self.persist() {
            tracing::error!("Failed to persist conversations: {}", e);
        }
    }

    fn position(&self, id: &str) -> Result<usize, SessionError> {
        self.conversations
            .iter()
            .position(|c| c.id == id)
            .ok_or_else(|| SessionError::NotFound(id.to_string()))
    }

    /// `chat-<millis>`, strictly later than every id issued or restored so
    /// far, so a deleted conversation's id never comes back.
    fn next_id(&mut self) -> String {
        let millis = Utc::now().timestamp_millis().max(self.last_id_millis + 1);
        self.last_id_millis = millis;
        format!("chat-{}", millis)
    }
}

fn id_millis(id: &str) -> Option<i64> {
    id.strip_prefix("chat-")?.parse().ok()
}

/// Load the stored collection. Absent, unreadable or malformed data yields
/// an empty collection; duplicate ids keep their first occurrence.
pub fn restore<S: KeyValueStore>(storage: &S) -> Vec<Conversation> {
    let json = match storage.get(CONVERSATIONS_KEY) {
        Ok(Some(json)) => json,
        Ok(None) => return Vec::new(),
        Err(e) => {
            tracing::warn!("Failed to read stored conversations: {}", e);
            return Vec::new();
        }
    };

    let conversations: Vec<Conversation> = match serde_json::from_str(&json) {
        Ok(conversations) => conversations,
        Err(e) => {
            tracing::warn!("Discarding malformed stored conversations: {}", e);
            return Vec::new();
        }
    };

    let mut seen = HashSet::new();
    conversations
        .into_iter()
        .filter(|c| {
            let fresh = seen.insert(c.id.clone());
            if !fresh {
                tracing::warn!("Dropping duplicate stored conversation {}", c.id);
            }
            fresh
        })
        .collect()
}

/// First [`TITLE_MAX_CHARS`] characters of the message, with `...` appended
/// when anything was cut.
pub fn derive_title(text: &str) -> String {
    let mut chars = text.chars();
    let head: String = chars.by_ref().take(TITLE_MAX_CHARS).collect();
    if chars.next().is_some() {
        format!("{}...", head)
    } else {
        head
    }
}
