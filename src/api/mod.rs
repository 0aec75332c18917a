//! Client for the inbox assistant REST backend.

pub mod http;
pub mod types;

pub use http::HttpDashboardApi;
pub use types::*;

use crate::domain::chat::ChatSession;
use crate::domain::email::{EmailId, EmailRecord};
use crate::domain::mailbox::Mailbox;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ApiError {
    /// The backend rejected the bearer token. Always ends the session.
    #[error("session expired")]
    Unauthorized,
    #[error("{}", status_text(*status, detail))]
    Status { status: u16, detail: String },
    #[error("request failed: {0}")]
    Transport(String),
    #[error("unexpected response: {0}")]
    Decode(String),
}

fn status_text(status: u16, detail: &str) -> String {
    if detail.trim().is_empty() {
        format!("HTTP {status}")
    } else {
        detail.trim().to_string()
    }
}

impl ApiError {
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ApiError::Unauthorized)
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

/// Base URL and bearer token captured when a request is issued.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiContext {
    pub base: String,
    pub token: String,
    /// Login generation the token belongs to. Completions carry it back so
    /// replies meant for an earlier login can be told apart.
    pub session: u64,
}

impl ApiContext {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base.trim_end_matches('/'), path)
    }
}

pub trait DashboardApi: Send + Sync {
    /// Unauthenticated; every non-2xx answer is a login failure.
    fn login(&self, base: &str, request: &LoginRequest) -> ApiResult<LoginResponse>;

    fn list_emails(&self, ctx: &ApiContext, page: u32, page_size: u32) -> ApiResult<EmailPage>;
    fn get_email(&self, ctx: &ApiContext, id: EmailId) -> ApiResult<EmailRecord>;

    fn ask(&self, ctx: &ApiContext, request: &AskRequest) -> ApiResult<AskResponse>;
    fn chat_sessions(&self, ctx: &ApiContext, limit: u32) -> ApiResult<Vec<ChatSession>>;
    fn chat_messages(
        &self,
        ctx: &ApiContext,
        chat_id: &str,
        limit: u32,
    ) -> ApiResult<Vec<ChatMessageRecord>>;

    fn mailboxes(&self, ctx: &ApiContext) -> ApiResult<Vec<Mailbox>>;
    fn gmail_connect(&self, ctx: &ApiContext, request: &GmailConnectRequest)
    -> ApiResult<IngestResponse>;
    fn gmail_sync(&self, ctx: &ApiContext, request: &GmailSyncRequest) -> ApiResult<IngestResponse>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_error_prefers_body_detail() {
        let e = ApiError::Status {
            status: 500,
            detail: "  boom ".into(),
        };
        assert_eq!(e.to_string(), "boom");
        let e = ApiError::Status {
            status: 502,
            detail: String::new(),
        };
        assert_eq!(e.to_string(), "HTTP 502");
    }

    #[test]
    fn context_url_joins_without_double_slash() {
        let ctx = ApiContext {
            base: "http://localhost:8005/".into(),
            token: "t".into(),
            session: 0,
        };
        assert_eq!(ctx.url("/emails"), "http://localhost:8005/emails");
    }
}
