use reqwest::StatusCode;
use reqwest::blocking::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use std::time::Duration;

use crate::api::{
    ApiContext, ApiError, ApiResult, AskRequest, AskResponse, ChatMessageRecord, DashboardApi,
    EmailPage, GmailConnectRequest, GmailSyncRequest, IngestResponse, Items, LoginRequest,
    LoginResponse,
};
use crate::domain::chat::ChatSession;
use crate::domain::email::{EmailId, EmailRecord};
use crate::domain::mailbox::Mailbox;

/// Blocking reqwest implementation; the executor calls it from worker threads.
pub struct HttpDashboardApi {
    client: Client,
}

impl HttpDashboardApi {
    pub fn new(timeout: Duration) -> anyhow::Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }

    fn get(&self, ctx: &ApiContext, path: &str) -> RequestBuilder {
        self.client.get(ctx.url(path)).bearer_auth(&ctx.token)
    }

    fn post(&self, ctx: &ApiContext, path: &str) -> RequestBuilder {
        self.client.post(ctx.url(path)).bearer_auth(&ctx.token)
    }

    pub(crate) fn emails_request(&self, ctx: &ApiContext, page: u32, page_size: u32) -> RequestBuilder {
        self.get(ctx, "/emails").query(&[
            ("page", page.to_string()),
            ("page_size", page_size.to_string()),
        ])
    }

    pub(crate) fn chat_messages_request(
        &self,
        ctx: &ApiContext,
        chat_id: &str,
        limit: u32,
    ) -> RequestBuilder {
        self.get(ctx, "/ai/chat-messages")
            .query(&[("chat_id", chat_id.to_string()), ("limit", limit.to_string())])
    }
}

/// Send an authenticated request: 401 ends the session, other non-2xx
/// answers surface the body text.
fn send_json<T: DeserializeOwned>(request: RequestBuilder) -> ApiResult<T> {
    let resp = request
        .send()
        .map_err(|e| ApiError::Transport(e.to_string()))?;
    let status = resp.status();
    if status == StatusCode::UNAUTHORIZED {
        return Err(ApiError::Unauthorized);
    }
    decode(resp, status)
}

fn decode<T: DeserializeOwned>(resp: reqwest::blocking::Response, status: StatusCode) -> ApiResult<T> {
    if !status.is_success() {
        let mut detail = resp.text().unwrap_or_default();
        if detail.trim().is_empty() {
            detail = format!(
                "{} {}",
                status.as_u16(),
                status.canonical_reason().unwrap_or_default()
            );
        }
        return Err(ApiError::Status {
            status: status.as_u16(),
            detail,
        });
    }
    resp.json::<T>()
        .map_err(|e| ApiError::Decode(e.to_string()))
}

impl DashboardApi for HttpDashboardApi {
    fn login(&self, base: &str, request: &LoginRequest) -> ApiResult<LoginResponse> {
        let url = format!("{}/auth/login", base.trim_end_matches('/'));
        let resp = self
            .client
            .post(url)
            .json(request)
            .send()
            .map_err(|e| ApiError::Transport(e.to_string()))?;
        let status = resp.status();
        decode(resp, status)
    }

    fn list_emails(&self, ctx: &ApiContext, page: u32, page_size: u32) -> ApiResult<EmailPage> {
        send_json(self.emails_request(ctx, page, page_size))
    }

    fn get_email(&self, ctx: &ApiContext, id: EmailId) -> ApiResult<EmailRecord> {
        send_json(self.get(ctx, &format!("/emails/{id}")))
    }

    fn ask(&self, ctx: &ApiContext, request: &AskRequest) -> ApiResult<AskResponse> {
        send_json(self.post(ctx, "/ai/ask").json(request))
    }

    fn chat_sessions(&self, ctx: &ApiContext, limit: u32) -> ApiResult<Vec<ChatSession>> {
        let items: Items<ChatSession> = send_json(
            self.get(ctx, "/ai/chat-sessions")
                .query(&[("limit", limit.to_string())]),
        )?;
        Ok(items.items)
    }

    fn chat_messages(
        &self,
        ctx: &ApiContext,
        chat_id: &str,
        limit: u32,
    ) -> ApiResult<Vec<ChatMessageRecord>> {
        let items: Items<ChatMessageRecord> =
            send_json(self.chat_messages_request(ctx, chat_id, limit))?;
        Ok(items.items)
    }

    fn mailboxes(&self, ctx: &ApiContext) -> ApiResult<Vec<Mailbox>> {
        let items: Items<Mailbox> = send_json(self.get(ctx, "/mailboxes"))?;
        Ok(items.items)
    }

    fn gmail_connect(
        &self,
        ctx: &ApiContext,
        request: &GmailConnectRequest,
    ) -> ApiResult<IngestResponse> {
        send_json(self.post(ctx, "/gmail/connect").json(request))
    }

    fn gmail_sync(&self, ctx: &ApiContext, request: &GmailSyncRequest) -> ApiResult<IngestResponse> {
        send_json(self.post(ctx, "/gmail/sync").json(request))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx() -> ApiContext {
        ApiContext {
            base: "http://localhost:8005".into(),
            token: "t1".into(),
            session: 1,
        }
    }

    #[test]
    fn email_page_request_carries_bearer_and_paging() {
        let api = HttpDashboardApi::new(Duration::from_secs(5)).unwrap();
        let req = api.emails_request(&ctx(), 1, 20).build().unwrap();

        assert_eq!(req.method(), reqwest::Method::GET);
        assert_eq!(req.url().path(), "/emails");
        assert_eq!(req.url().query(), Some("page=1&page_size=20"));
        assert_eq!(req.headers()["authorization"], "Bearer t1");
    }

    #[test]
    fn chat_id_is_query_encoded() {
        let api = HttpDashboardApi::new(Duration::from_secs(5)).unwrap();
        let req = api
            .chat_messages_request(&ctx(), "chat 1&x", 200)
            .build()
            .unwrap();
        let pairs: Vec<(String, String)> = req
            .url()
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        assert_eq!(
            pairs,
            vec![
                ("chat_id".to_string(), "chat 1&x".to_string()),
                ("limit".to_string(), "200".to_string())
            ]
        );
    }
}
