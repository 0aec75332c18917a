use std::rc::Rc;
use std::sync::mpsc::{self, Receiver};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use inbox_dashboard::api::{
    ApiContext, ApiError, ApiResult, AskRequest, AskResponse, ChatMessageRecord, DashboardApi,
    EmailPage, GmailConnectRequest, GmailSyncRequest, IngestResponse, LoginRequest, LoginResponse,
};
use inbox_dashboard::auth::oauth::{OAuthMessage, RELAY_SOURCE};
use inbox_dashboard::auth::profile::{LinkError, ProfileLookup};
use inbox_dashboard::config::{Config, GmailConfig};
use inbox_dashboard::dashboard::{Dashboard, Event, View};
use inbox_dashboard::domain::chat::ChatSession;
use inbox_dashboard::domain::email::{EmailId, EmailRecord, EmailSummary};
use inbox_dashboard::domain::mailbox::Mailbox;
use inbox_dashboard::runtime::Executor;
use inbox_dashboard::store::{KvStore, MemoryKvStore, keys};

#[derive(Default)]
struct FakeApi {
    /// `"<endpoint> <bearer>"` for every authenticated call.
    calls: Mutex<Vec<String>>,
    pages: Mutex<Vec<(u32, u32)>>,
    syncs: Mutex<Vec<GmailSyncRequest>>,
    reject_emails: bool,
}

impl FakeApi {
    fn record(&self, what: &str, ctx: &ApiContext) {
        self.calls.lock().unwrap().push(format!("{what} {}", ctx.token));
    }

    fn called(&self, what: &str) -> usize {
        let prefix = format!("{what} ");
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.starts_with(&prefix))
            .count()
    }
}

impl DashboardApi for FakeApi {
    fn login(&self, _base: &str, request: &LoginRequest) -> ApiResult<LoginResponse> {
        if request.password != "p1" {
            return Err(ApiError::Status {
                status: 401,
                detail: "Invalid credentials".into(),
            });
        }
        Ok(LoginResponse {
            access_token: "t1".into(),
            user_id: request.user_id.clone(),
        })
    }

    fn list_emails(&self, ctx: &ApiContext, page: u32, page_size: u32) -> ApiResult<EmailPage> {
        self.record("emails", ctx);
        self.pages.lock().unwrap().push((page, page_size));
        if self.reject_emails {
            return Err(ApiError::Unauthorized);
        }
        Ok(EmailPage {
            items: vec![EmailSummary {
                id: 5,
                sender: "alice@corp.io".into(),
                subject: "Hello".into(),
                ..Default::default()
            }],
            total: 1,
        })
    }

    fn get_email(&self, ctx: &ApiContext, id: EmailId) -> ApiResult<EmailRecord> {
        self.record("email", ctx);
        Ok(EmailRecord {
            summary: EmailSummary {
                id,
                ..Default::default()
            },
            body_text: Some("body".into()),
            ..Default::default()
        })
    }

    fn ask(&self, ctx: &ApiContext, _request: &AskRequest) -> ApiResult<AskResponse> {
        self.record("ask", ctx);
        Ok(AskResponse {
            answer: Some("**Nothing** urgent".into()),
            sources: vec![],
        })
    }

    fn chat_sessions(&self, ctx: &ApiContext, _limit: u32) -> ApiResult<Vec<ChatSession>> {
        self.record("sessions", ctx);
        Ok(vec![])
    }

    fn chat_messages(
        &self,
        ctx: &ApiContext,
        _chat_id: &str,
        _limit: u32,
    ) -> ApiResult<Vec<ChatMessageRecord>> {
        self.record("messages", ctx);
        Ok(vec![])
    }

    fn mailboxes(&self, ctx: &ApiContext) -> ApiResult<Vec<Mailbox>> {
        self.record("mailboxes", ctx);
        Ok(vec![Mailbox {
            provider: "me@gmail.com".into(),
            ..Default::default()
        }])
    }

    fn gmail_connect(
        &self,
        ctx: &ApiContext,
        _request: &GmailConnectRequest,
    ) -> ApiResult<IngestResponse> {
        self.record("connect", ctx);
        Ok(IngestResponse { ingested: 3 })
    }

    fn gmail_sync(&self, ctx: &ApiContext, request: &GmailSyncRequest) -> ApiResult<IngestResponse> {
        self.record("sync", ctx);
        self.syncs.lock().unwrap().push(request.clone());
        // the stored refresh token has expired
        if request.access_token.is_none() {
            return Err(ApiError::Status {
                status: 400,
                detail: "invalid_grant".into(),
            });
        }
        Ok(IngestResponse { ingested: 7 })
    }
}

struct FakeProfile(&'static str);

impl ProfileLookup for FakeProfile {
    fn email_address(&self, _access_token: &str) -> Result<String, LinkError> {
        Ok(self.0.to_string())
    }
}

struct Harness {
    api: Arc<FakeApi>,
    store: Rc<MemoryKvStore>,
    dash: Dashboard,
    exec: Executor,
    rx: Receiver<Event>,
    relay_tx: mpsc::Sender<Event>,
    opened: Receiver<String>,
}

impl Harness {
    fn new(api: FakeApi, profile: &'static str, store: MemoryKvStore) -> Self {
        let config = Config {
            gmail: Some(GmailConfig {
                client_id: "cid.apps.googleusercontent.com".into(),
                redirect_uri: "http://127.0.0.1:0/oauth-callback".into(),
            }),
            ..Config::default()
        };
        let api = Arc::new(api);
        let store = Rc::new(store);
        let (tx, rx) = mpsc::channel();
        let (open_tx, opened) = mpsc::channel();
        let open_tx = Mutex::new(open_tx);
        let exec = Executor::new(api.clone(), Arc::new(FakeProfile(profile)), tx.clone())
            .with_browser(move |url| {
                let _ = open_tx.lock().unwrap().send(url.to_string());
                Ok(())
            });
        Self {
            api,
            dash: Dashboard::new(Box::new(store.clone()), &config),
            store,
            exec,
            rx,
            relay_tx: tx,
            opened,
        }
    }

    fn logged_in(api: FakeApi, profile: &'static str) -> Self {
        let store = MemoryKvStore::with(&[(keys::AUTH_TOKEN, "t1"), (keys::USER_ID, "u1")]);
        Self::new(api, profile, store)
    }

    /// Apply completions until the workers go quiet.
    fn settle(&mut self) {
        while let Ok(ev) = self.rx.recv_timeout(Duration::from_millis(500)) {
            let cmds = self.dash.apply(ev);
            self.exec.dispatch_all(cmds);
        }
    }

    fn run(&mut self, cmds: Vec<inbox_dashboard::dashboard::Command>) {
        self.exec.dispatch_all(cmds);
        self.settle();
    }

    /// State embedded in the last authorization URL handed to the browser.
    fn opened_state(&self) -> String {
        let url = self
            .opened
            .recv_timeout(Duration::from_secs(2))
            .expect("browser was not opened");
        let url = url::Url::parse(&url).unwrap();
        url.query_pairs()
            .find(|(k, _)| k == "state")
            .map(|(_, v)| v.into_owned())
            .unwrap()
    }

    fn relay(&mut self, state: &str, token: &str) {
        self.relay_tx
            .send(Event::AuthorizationRelay(OAuthMessage {
                source: Some(RELAY_SOURCE.into()),
                state: Some(state.into()),
                access_token: Some(token.into()),
                ..Default::default()
            }))
            .unwrap();
        self.settle();
    }
}

#[test]
fn login_then_list_carries_bearer_token() {
    let mut h = Harness::new(FakeApi::default(), "me@gmail.com", MemoryKvStore::new());
    assert_eq!(h.dash.view(), View::Login);

    let cmds = h.dash.login("u1", "p1");
    h.run(cmds);

    assert_eq!(h.dash.view(), View::Inbox);
    assert_eq!(h.api.called("emails"), 1);
    assert!(h.api.calls.lock().unwrap().contains(&"emails t1".to_string()));
    assert_eq!(h.api.pages.lock().unwrap()[0], (1, 20));

    // single item on one page: nothing further to page to
    assert_eq!(h.dash.emails().total_pages(), 1);
    assert!(!h.dash.emails().has_next());
    assert!(h.dash.next_page().is_empty());
}

#[test]
fn wrong_password_reports_and_stays_on_login() {
    let mut h = Harness::new(FakeApi::default(), "me@gmail.com", MemoryKvStore::new());
    let cmds = h.dash.login("u1", "nope");
    h.run(cmds);
    assert_eq!(h.dash.view(), View::Login);
    let status = h.dash.status().current().unwrap();
    assert!(status.text.contains("Invalid credentials"));
    assert_eq!(h.store.get(keys::AUTH_TOKEN).unwrap(), None);
}

#[test]
fn rejected_token_logs_out_and_clears_storage() {
    let api = FakeApi {
        reject_emails: true,
        ..FakeApi::default()
    };
    let mut h = Harness::logged_in(api, "me@gmail.com");
    let cmds = h.dash.startup();
    h.run(cmds);

    assert_eq!(h.dash.view(), View::Login);
    assert_eq!(h.store.get(keys::AUTH_TOKEN).unwrap(), None);
    assert_eq!(h.store.get(keys::USER_ID).unwrap(), None);
    assert_eq!(h.store.get(keys::CHAT_ID).unwrap(), None);
}

#[test]
fn chat_round_trip_appends_answer() {
    let mut h = Harness::logged_in(FakeApi::default(), "me@gmail.com");
    let cmds = h.dash.send("anything urgent?");
    h.run(cmds);
    let messages = h.dash.chat().messages();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[1].content, "**Nothing** urgent");
    assert!(!h.dash.chat().is_thinking());
}

#[test]
fn expired_sync_reauthorizes_and_retries_with_tokens() {
    let mut h = Harness::logged_in(FakeApi::default(), "Me@Gmail.com");
    let cmds = h.dash.sync_mailbox("me@gmail.com");
    h.run(cmds);

    // token-less attempt failed, browser opened for re-authorization
    let state = h.opened_state();
    assert_eq!(h.api.called("sync"), 1);

    // a message for some other attempt changes nothing
    h.relay("not-the-state", "evil");
    assert_eq!(h.api.called("sync"), 1);

    h.relay(&state, "gtok");
    let syncs = h.api.syncs.lock().unwrap().clone();
    assert_eq!(syncs.len(), 2);
    assert_eq!(syncs[0].access_token, None);
    assert_eq!(syncs[1].access_token.as_deref(), Some("gtok"));
    assert_eq!(syncs[1].fallback_days_back, 7);

    // success refreshes both lists
    assert!(h.api.called("mailboxes") >= 1);
    assert!(h.api.called("emails") >= 1);
    assert!(!h.dash.linker().is_busy());
}

#[test]
fn reauthorizing_another_account_never_syncs_it() {
    let mut h = Harness::logged_in(FakeApi::default(), "someone-else@gmail.com");
    let cmds = h.dash.sync_mailbox("me@gmail.com");
    h.run(cmds);
    let state = h.opened_state();

    h.relay(&state, "gtok");
    assert_eq!(h.api.called("sync"), 1);
    assert!(!h.dash.linker().is_busy());
    let status = h.dash.status().current().unwrap();
    assert!(status.text.contains("someone-else@gmail.com"));
}

#[test]
fn connect_links_new_mailbox() {
    let mut h = Harness::logged_in(FakeApi::default(), "me@gmail.com");
    let cmds = h.dash.connect_gmail();
    h.run(cmds);
    let state = h.opened_state();

    h.relay(&state, "gtok");
    assert_eq!(h.api.called("connect"), 1);
    assert_eq!(h.dash.linker().mailboxes().len(), 1);
}
