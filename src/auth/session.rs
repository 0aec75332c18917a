//! Session store: auth token, user id and API base.

use crate::api::{ApiContext, LoginRequest, LoginResponse};
use crate::store::{self, KvStore, keys};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    #[error("user id and password are required")]
    MissingCredentials,
}

#[derive(Debug, Clone)]
pub struct SessionState {
    api_base: String,
    /// `(user_id, auth_token)`; both or neither.
    credentials: Option<(String, String)>,
    login_pending: bool,
    /// Bumped on every login and logout.
    generation: u64,
}

pub fn normalize_api_base(base: &str) -> String {
    base.trim().trim_end_matches('/').to_string()
}

impl SessionState {
    /// Read the persisted session. A token without a user id (or the reverse)
    /// counts as logged out.
    pub fn load(store: &dyn KvStore, default_api_base: &str) -> Self {
        let api_base = store::load(store, keys::API_BASE)
            .filter(|b| !b.trim().is_empty())
            .unwrap_or_else(|| default_api_base.to_string());
        let user_id = store::load(store, keys::USER_ID).filter(|s| !s.is_empty());
        let token = store::load(store, keys::AUTH_TOKEN).filter(|s| !s.is_empty());
        let credentials = match (user_id, token) {
            (Some(u), Some(t)) => Some((u, t)),
            _ => None,
        };
        Self {
            api_base: normalize_api_base(&api_base),
            credentials,
            login_pending: false,
            generation: 0,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.credentials.is_some()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn user_id(&self) -> Option<&str> {
        self.credentials.as_ref().map(|(u, _)| u.as_str())
    }

    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    pub fn login_pending(&self) -> bool {
        self.login_pending
    }

    /// Context for an authenticated call, or `None` when logged out.
    pub fn context(&self) -> Option<ApiContext> {
        self.credentials.as_ref().map(|(_, token)| ApiContext {
            base: self.api_base.clone(),
            token: token.clone(),
            session: self.generation,
        })
    }

    pub fn set_api_base(&mut self, store: &dyn KvStore, base: &str) {
        let base = normalize_api_base(base);
        if base.is_empty() {
            return;
        }
        store::save(store, keys::API_BASE, &base);
        self.api_base = base;
    }

    /// Validate credentials before any network call.
    pub fn begin_login(&mut self, user_id: &str, password: &str) -> Result<LoginRequest, SessionError> {
        let user_id = user_id.trim();
        if user_id.is_empty() || password.is_empty() {
            return Err(SessionError::MissingCredentials);
        }
        self.login_pending = true;
        Ok(LoginRequest {
            user_id: user_id.to_string(),
            password: password.to_string(),
        })
    }

    pub fn login_failed(&mut self) {
        self.login_pending = false;
    }

    pub fn complete_login(&mut self, store: &dyn KvStore, resp: &LoginResponse) {
        self.login_pending = false;
        store::save(store, keys::AUTH_TOKEN, &resp.access_token);
        store::save(store, keys::USER_ID, &resp.user_id);
        store::save(store, keys::API_BASE, &self.api_base);
        self.credentials = Some((resp.user_id.clone(), resp.access_token.clone()));
        self.generation += 1;
        log::info!("logged in as {}", resp.user_id);
    }

    /// Drop the session and its chat id. The API base is kept.
    pub fn clear(&mut self, store: &dyn KvStore) {
        store::forget(store, keys::AUTH_TOKEN);
        store::forget(store, keys::USER_ID);
        store::forget(store, keys::CHAT_ID);
        self.credentials = None;
        self.login_pending = false;
        self.generation += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryKvStore;

    #[test]
    fn partial_session_is_logged_out() {
        let store = MemoryKvStore::with(&[(keys::AUTH_TOKEN, "t1")]);
        let s = SessionState::load(&store, "http://api");
        assert!(!s.is_authenticated());
        assert!(s.context().is_none());

        let store = MemoryKvStore::with(&[(keys::USER_ID, "u1")]);
        assert!(!SessionState::load(&store, "http://api").is_authenticated());
    }

    #[test]
    fn stored_api_base_wins_over_default() {
        let store = MemoryKvStore::with(&[(keys::API_BASE, "http://other:9000//")]);
        let s = SessionState::load(&store, "http://api");
        assert_eq!(s.api_base(), "http://other:9000");
    }

    #[test]
    fn blank_credentials_are_rejected() {
        let mut s = SessionState::load(&MemoryKvStore::new(), "http://api");
        assert_eq!(s.begin_login("  ", "pw"), Err(SessionError::MissingCredentials));
        assert_eq!(s.begin_login("u1", ""), Err(SessionError::MissingCredentials));
        assert!(!s.login_pending());
    }

    #[test]
    fn login_then_clear_round_trip() {
        let store = MemoryKvStore::with(&[(keys::CHAT_ID, "chat-1")]);
        let mut s = SessionState::load(&store, "http://api");
        let req = s.begin_login(" u1 ", "p1").unwrap();
        assert_eq!(req.user_id, "u1");
        s.complete_login(
            &store,
            &LoginResponse {
                access_token: "t1".into(),
                user_id: "u1".into(),
            },
        );
        let first = s.context().unwrap();
        assert_eq!(first.token, "t1");
        assert_eq!(store.get(keys::AUTH_TOKEN).unwrap().as_deref(), Some("t1"));

        s.clear(&store);
        s.begin_login("u1", "p1").unwrap();
        s.complete_login(
            &store,
            &LoginResponse {
                access_token: "t1".into(),
                user_id: "u1".into(),
            },
        );
        // same token, different login
        assert_ne!(s.context().unwrap().session, first.session);

        s.clear(&store);
        assert!(!s.is_authenticated());
        assert_eq!(store.get(keys::AUTH_TOKEN).unwrap(), None);
        assert_eq!(store.get(keys::USER_ID).unwrap(), None);
        assert_eq!(store.get(keys::CHAT_ID).unwrap(), None);
        assert_eq!(store.get(keys::API_BASE).unwrap().as_deref(), Some("http://api"));
    }
}
