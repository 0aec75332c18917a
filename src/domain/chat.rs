use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Bot,
}

impl Role {
    /// Backend history uses "assistant" for answers; everything else is the user.
    pub fn from_backend(role: &str) -> Self {
        if role == "assistant" { Role::Bot } else { Role::User }
    }
}

/// Citation attached to an answer.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Source {
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub sender: String,
    #[serde(default)]
    pub snippet: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
    pub sources: Vec<Source>,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            sources: vec![],
        }
    }

    pub fn bot(content: impl Into<String>, sources: Vec<Source>) -> Self {
        Self {
            role: Role::Bot,
            content: content.into(),
            sources,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ChatSession {
    pub chat_id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

/// `chat-<unix millis>`; bumped past `previous` so a reset never reuses an id.
pub fn generate_chat_id(now_millis: i64, previous: Option<&str>) -> String {
    let mut stamp = now_millis;
    if let Some(prev) = previous.and_then(|p| p.strip_prefix("chat-")) {
        if let Ok(prev_stamp) = prev.parse::<i64>() {
            if prev_stamp >= stamp {
                stamp = prev_stamp + 1;
            }
        }
    }
    format!("chat-{stamp}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assistant_maps_to_bot() {
        assert_eq!(Role::from_backend("assistant"), Role::Bot);
        assert_eq!(Role::from_backend("user"), Role::User);
        assert_eq!(Role::from_backend("system"), Role::User);
    }

    #[test]
    fn chat_id_never_repeats_previous() {
        assert_eq!(generate_chat_id(100, None), "chat-100");
        assert_eq!(generate_chat_id(100, Some("chat-100")), "chat-101");
        assert_eq!(generate_chat_id(100, Some("chat-250")), "chat-251");
        assert_eq!(generate_chat_id(300, Some("chat-250")), "chat-300");
        assert_eq!(generate_chat_id(300, Some("my-chat")), "chat-300");
    }
}
