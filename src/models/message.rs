use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    // Older stores wrote assistant messages as "ai".
    #[serde(alias = "ai")]
    Assistant,
}

impl Role {
    /// Single-letter avatar shown next to a message bubble.
    pub fn avatar(&self) -> &'static str {
        match self {
            Role::User => "U",
            Role::Assistant => "N",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub sender: Role,
    pub text: String,
}

impl Message {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            sender: Role::User,
            text: text.into(),
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            sender: Role::Assistant,
            text: text.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_wire_names() {
        let json = serde_json::to_string(&Message::assistant("hi")).unwrap();
        assert_eq!(json, r#"{"sender":"assistant","text":"hi"}"#);

        let legacy: Message = serde_json::from_str(r#"{"sender":"ai","text":"old"}"#).unwrap();
        assert_eq!(legacy.sender, Role::Assistant);
    }
}
