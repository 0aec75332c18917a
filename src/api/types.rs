//! Request and response bodies exchanged with the backend.

use serde::{Deserialize, Serialize};

use crate::domain::chat::Source;
use crate::domain::email::EmailSummary;

/// Lookback for the first import of a newly linked mailbox.
pub const CONNECT_DAYS_BACK: u32 = 90;
/// Lookback the backend uses when it has no incremental sync cursor.
pub const SYNC_FALLBACK_DAYS_BACK: u32 = 7;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoginRequest {
    pub user_id: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub user_id: String,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct EmailPage {
    #[serde(default)]
    pub items: Vec<EmailSummary>,
    #[serde(default)]
    pub total: u64,
}

/// Envelope used by list endpoints.
#[derive(Debug, Clone, Deserialize)]
pub struct Items<T> {
    #[serde(default = "Vec::new")]
    pub items: Vec<T>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AskRequest {
    pub question: String,
    pub current_thread_id: Option<String>,
    pub chat_id: String,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct AskResponse {
    #[serde(default)]
    pub answer: Option<String>,
    #[serde(default)]
    pub sources: Vec<Source>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ChatMessageRecord {
    pub role: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub sources: Vec<Source>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GmailConnectRequest {
    pub email: String,
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub days_back: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GmailSyncRequest {
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    pub fallback_days_back: u32,
}

impl GmailSyncRequest {
    /// Sync relying on the refresh token the backend already holds.
    pub fn stored_credentials(email: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            access_token: None,
            refresh_token: None,
            fallback_days_back: SYNC_FALLBACK_DAYS_BACK,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct IngestResponse {
    #[serde(default)]
    pub ingested: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokenless_sync_omits_token_fields() {
        let body = serde_json::to_value(GmailSyncRequest::stored_credentials("a@gmail.com")).unwrap();
        assert_eq!(
            body,
            serde_json::json!({ "email": "a@gmail.com", "fallback_days_back": 7 })
        );
    }

    #[test]
    fn ask_request_keeps_null_thread() {
        let body = serde_json::to_value(AskRequest {
            question: "q".into(),
            current_thread_id: None,
            chat_id: "chat-1".into(),
        })
        .unwrap();
        assert_eq!(body["current_thread_id"], serde_json::Value::Null);
    }

    #[test]
    fn email_page_tolerates_missing_fields() {
        let page: EmailPage = serde_json::from_str(r#"{"items":[{"id":5}]}"#).unwrap();
        assert_eq!(page.total, 0);
        assert_eq!(page.items[0].id, 5);
    }
}
