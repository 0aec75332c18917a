//! The client state container.
//!
//! [`Dashboard`] owns one slice per controller. User operations and
//! network completions ([`Event`]) are plain method calls that update state
//! and return the [`Command`]s to run next; nothing here performs I/O
//! except the per-key storage writes.

pub mod chat;
pub mod emails;
pub mod linking;
pub mod status;

use std::time::Instant;

use crate::api::{
    ApiContext, ApiError, ApiResult, AskRequest, AskResponse, ChatMessageRecord, EmailPage,
    GmailConnectRequest, GmailSyncRequest, IngestResponse, LoginRequest, LoginResponse,
};
use crate::auth::oauth::OAuthMessage;
use crate::auth::profile::LinkError;
use crate::auth::session::SessionState;
use crate::config::{Config, GmailConfig};
use crate::domain::chat::ChatSession;
use crate::domain::email::{EmailId, EmailRecord};
use crate::domain::mailbox::{Mailbox, PendingAction};
use crate::i18n::{Lang, Msg};
use crate::store::{self, KvStore, keys};

use chat::{ChatController, MESSAGE_HISTORY_LIMIT, SESSION_LIST_LIMIT};
use emails::{DetailLoader, EmailList, Outcome};
use linking::{LinkStep, MailboxLinker};
use status::{Dismiss, SESSION_EXPIRED_DISMISS, Severity, StatusBar};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Login,
    Inbox,
}

/// How linked mailboxes are listed in the user center.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProfileLayout {
    #[default]
    Classic,
    Compact,
}

impl ProfileLayout {
    pub fn code(self) -> &'static str {
        match self {
            ProfileLayout::Classic => "classic",
            ProfileLayout::Compact => "compact",
        }
    }

    pub fn from_code(code: &str) -> Self {
        match code {
            "compact" => ProfileLayout::Compact,
            _ => ProfileLayout::Classic,
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            ProfileLayout::Classic => ProfileLayout::Compact,
            ProfileLayout::Compact => ProfileLayout::Classic,
        }
    }
}

/// A side effect for the executor. Authenticated commands carry the
/// context captured when they were issued.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Login {
        base: String,
        request: LoginRequest,
    },
    FetchPage {
        ctx: ApiContext,
        page: u32,
        page_size: u32,
    },
    FetchDetail {
        ctx: ApiContext,
        id: EmailId,
    },
    Ask {
        ctx: ApiContext,
        epoch: u64,
        request: AskRequest,
    },
    ListChatSessions {
        ctx: ApiContext,
        request: u64,
        limit: u32,
    },
    LoadChatMessages {
        ctx: ApiContext,
        epoch: u64,
        chat_id: String,
        limit: u32,
    },
    FetchMailboxes {
        ctx: ApiContext,
        request: u64,
    },
    ConnectGmail {
        ctx: ApiContext,
        attempt: u64,
        request: GmailConnectRequest,
    },
    SyncMailbox {
        ctx: ApiContext,
        attempt: u64,
        request: GmailSyncRequest,
    },
    OpenAuthorization {
        attempt: u64,
        url: String,
        redirect_uri: String,
    },
    LookupProfile {
        attempt: u64,
        access_token: String,
    },
}

/// Completion of a [`Command`], tagged with the identity it was issued for.
/// `session` is the login generation of the [`ApiContext`] used.
#[derive(Debug, Clone)]
pub enum Event {
    LoggedIn(ApiResult<LoginResponse>),
    PageLoaded {
        session: u64,
        page: u32,
        result: ApiResult<EmailPage>,
    },
    DetailLoaded {
        session: u64,
        id: EmailId,
        result: ApiResult<EmailRecord>,
    },
    Answered {
        session: u64,
        epoch: u64,
        result: ApiResult<AskResponse>,
    },
    ChatSessionsListed {
        session: u64,
        request: u64,
        result: ApiResult<Vec<ChatSession>>,
    },
    ChatMessagesLoaded {
        session: u64,
        epoch: u64,
        chat_id: String,
        result: ApiResult<Vec<ChatMessageRecord>>,
    },
    MailboxesLoaded {
        session: u64,
        request: u64,
        result: ApiResult<Vec<Mailbox>>,
    },
    AuthorizationRelay(OAuthMessage),
    /// The browser could not be launched; the user has to open `url`.
    BrowserUnavailable {
        attempt: u64,
        url: String,
    },
    AuthorizationUnavailable {
        attempt: u64,
        error: LinkError,
    },
    ProfileResolved {
        attempt: u64,
        result: Result<String, LinkError>,
    },
    MailboxLinked {
        session: u64,
        attempt: u64,
        result: ApiResult<IngestResponse>,
    },
    MailboxSynced {
        session: u64,
        attempt: u64,
        result: ApiResult<IngestResponse>,
    },
}

impl Event {
    /// Login generation of an authenticated completion.
    pub fn session(&self) -> Option<u64> {
        match self {
            Event::PageLoaded { session, .. }
            | Event::DetailLoaded { session, .. }
            | Event::Answered { session, .. }
            | Event::ChatSessionsListed { session, .. }
            | Event::ChatMessagesLoaded { session, .. }
            | Event::MailboxesLoaded { session, .. }
            | Event::MailboxLinked { session, .. }
            | Event::MailboxSynced { session, .. } => Some(*session),
            Event::LoggedIn(_)
            | Event::AuthorizationRelay(_)
            | Event::BrowserUnavailable { .. }
            | Event::AuthorizationUnavailable { .. }
            | Event::ProfileResolved { .. } => None,
        }
    }

    /// Whether the backend rejected the session token.
    pub fn is_unauthorized(&self) -> bool {
        fn rejected<T>(r: &ApiResult<T>) -> bool {
            r.as_ref().err().is_some_and(ApiError::is_unauthorized)
        }
        match self {
            Event::PageLoaded { result, .. } => rejected(result),
            Event::DetailLoaded { result, .. } => rejected(result),
            Event::Answered { result, .. } => rejected(result),
            Event::ChatSessionsListed { result, .. } => rejected(result),
            Event::ChatMessagesLoaded { result, .. } => rejected(result),
            Event::MailboxesLoaded { result, .. } => rejected(result),
            Event::MailboxLinked { result, .. } | Event::MailboxSynced { result, .. } => {
                rejected(result)
            }
            // login failures and Google's own answers are not about our session
            Event::LoggedIn(_)
            | Event::AuthorizationRelay(_)
            | Event::BrowserUnavailable { .. }
            | Event::AuthorizationUnavailable { .. }
            | Event::ProfileResolved { .. } => false,
        }
    }
}

fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

pub struct Dashboard {
    store: Box<dyn KvStore>,
    gmail: Option<GmailConfig>,
    session: SessionState,
    emails: EmailList,
    detail: DetailLoader,
    chat: ChatController,
    linker: MailboxLinker,
    status: StatusBar,
    lang: Lang,
    layout: ProfileLayout,
}

impl Dashboard {
    pub fn new(store: Box<dyn KvStore>, config: &Config) -> Self {
        let session = SessionState::load(store.as_ref(), &config.api_base);
        let chat = ChatController::load(store.as_ref(), now_millis());
        let lang = store::load(store.as_ref(), keys::UI_LANGUAGE)
            .map(|c| Lang::from_code(&c))
            .unwrap_or_default();
        let layout = store::load(store.as_ref(), keys::PROFILE_LAYOUT)
            .map(|c| ProfileLayout::from_code(&c))
            .unwrap_or_default();
        Self {
            store,
            gmail: config.gmail.clone(),
            session,
            emails: EmailList::default(),
            detail: DetailLoader::default(),
            chat,
            linker: MailboxLinker::default(),
            status: StatusBar::default(),
            lang,
            layout,
        }
    }

    /// Initial loads for a session resumed from storage.
    pub fn startup(&mut self) -> Vec<Command> {
        if !self.session.is_authenticated() {
            return vec![];
        }
        let mut cmds = self.refresh();
        cmds.extend(self.refresh_mailboxes());
        cmds
    }

    pub fn view(&self) -> View {
        if self.session.is_authenticated() {
            View::Inbox
        } else {
            View::Login
        }
    }

    pub fn session(&self) -> &SessionState {
        &self.session
    }

    pub fn emails(&self) -> &EmailList {
        &self.emails
    }

    pub fn detail(&self) -> &DetailLoader {
        &self.detail
    }

    pub fn chat(&self) -> &ChatController {
        &self.chat
    }

    pub fn linker(&self) -> &MailboxLinker {
        &self.linker
    }

    pub fn status(&self) -> &StatusBar {
        &self.status
    }

    pub fn lang(&self) -> Lang {
        self.lang
    }

    pub fn layout(&self) -> ProfileLayout {
        self.layout
    }

    pub fn text(&self, msg: Msg) -> String {
        msg.render(self.lang)
    }

    fn info(&mut self, msg: Msg) {
        let text = self.text(msg);
        self.status.info(text);
    }

    fn error(&mut self, msg: Msg) {
        let text = self.text(msg);
        self.status.error(text);
    }

    fn progress(&mut self, msg: Msg) {
        let text = self.text(msg);
        self.status.progress(text);
    }

    /// Clear `msg` if it is still the one showing.
    fn finish_progress(&mut self, msg: Msg) {
        let text = self.text(msg);
        if self.status.current().is_some_and(|m| m.text == text) {
            self.status.clear();
        }
    }

    pub fn tick(&mut self, now: Instant) {
        self.status.tick(now);
    }

    // -- session --

    pub fn set_api_base(&mut self, base: &str) {
        self.session.set_api_base(self.store.as_ref(), base);
    }

    pub fn login(&mut self, user_id: &str, password: &str) -> Vec<Command> {
        if self.session.login_pending() {
            return vec![];
        }
        match self.session.begin_login(user_id, password) {
            Ok(request) => {
                self.progress(Msg::LoggingIn);
                vec![Command::Login {
                    base: self.session.api_base().to_string(),
                    request,
                }]
            }
            Err(_) => {
                self.error(Msg::FillCredentials);
                vec![]
            }
        }
    }

    pub fn logout(&mut self) -> Vec<Command> {
        self.reset_session();
        self.info(Msg::LoggedOut);
        vec![]
    }

    fn reset_session(&mut self) {
        self.session.clear(self.store.as_ref());
        self.emails.clear();
        self.detail.clear();
        self.chat.forget();
        self.linker.clear();
    }

    fn force_logout(&mut self) {
        log::info!("backend rejected the session token, logging out");
        self.reset_session();
        let text = self.text(Msg::SessionExpired);
        self.status
            .set(text, Severity::Error, Dismiss::After(SESSION_EXPIRED_DISMISS));
    }

    // -- emails --

    fn fetch_page(&mut self, page: Option<u32>) -> Vec<Command> {
        let (Some(ctx), Some(page)) = (self.session.context(), page) else {
            return vec![];
        };
        self.progress(Msg::LoadingEmails);
        vec![Command::FetchPage {
            ctx,
            page,
            page_size: self.emails.page_size(),
        }]
    }

    pub fn refresh(&mut self) -> Vec<Command> {
        if !self.session.is_authenticated() {
            return vec![];
        }
        let page = self.emails.refresh();
        self.fetch_page(Some(page))
    }

    pub fn next_page(&mut self) -> Vec<Command> {
        let page = self.emails.next();
        self.fetch_page(page)
    }

    pub fn prev_page(&mut self) -> Vec<Command> {
        let page = self.emails.prev();
        self.fetch_page(page)
    }

    pub fn set_query(&mut self, query: &str) {
        self.emails.set_query(query);
    }

    /// All -> primary -> promotions. Filters the held page only.
    pub fn cycle_kind_filter(&mut self) {
        self.emails.set_kind(self.emails.kind().next());
    }

    /// Switch the list between page order and quadrant order.
    pub fn toggle_grouped(&mut self) {
        self.emails.set_grouped(!self.emails.is_grouped());
    }

    pub fn select_email(&mut self, id: EmailId) -> Vec<Command> {
        let Some(ctx) = self.session.context() else {
            return vec![];
        };
        let Some(summary) = self.emails.items().iter().find(|e| e.id == id).cloned() else {
            return vec![];
        };
        let id = self.detail.select(summary);
        vec![Command::FetchDetail { ctx, id }]
    }

    // -- chat --

    pub fn send(&mut self, question: &str) -> Vec<Command> {
        let Some(ctx) = self.session.context() else {
            return vec![];
        };
        let Some((epoch, request)) = self.chat.send(question, self.detail.thread_id()) else {
            return vec![];
        };
        self.progress(Msg::Thinking);
        vec![Command::Ask {
            ctx,
            epoch,
            request,
        }]
    }

    pub fn open_history(&mut self) -> Vec<Command> {
        let Some(ctx) = self.session.context() else {
            return vec![];
        };
        let request = self.chat.request_sessions();
        vec![Command::ListChatSessions {
            ctx,
            request,
            limit: SESSION_LIST_LIMIT,
        }]
    }

    pub fn switch_session(&mut self, chat_id: &str) -> Vec<Command> {
        let Some(ctx) = self.session.context() else {
            return vec![];
        };
        if chat_id.trim().is_empty() {
            return vec![];
        }
        let (epoch, chat_id) = self.chat.switch_session(self.store.as_ref(), chat_id);
        self.progress(Msg::LoadingChatMessages);
        vec![Command::LoadChatMessages {
            ctx,
            epoch,
            chat_id,
            limit: MESSAGE_HISTORY_LIMIT,
        }]
    }

    /// Start a fresh conversation under a new chat id.
    pub fn new_chat(&mut self) -> Vec<Command> {
        let chat_id = self
            .chat
            .reset(self.store.as_ref(), None, now_millis())
            .to_string();
        self.info(Msg::ResetSession { chat_id });
        vec![]
    }

    /// Empty the visible conversation but keep the chat id.
    pub fn clear_chat(&mut self) -> Vec<Command> {
        let current = self.chat.chat_id().to_string();
        self.chat.reset(self.store.as_ref(), Some(current), now_millis());
        vec![]
    }

    // -- mailboxes --

    pub fn refresh_mailboxes(&mut self) -> Vec<Command> {
        let Some(ctx) = self.session.context() else {
            return vec![];
        };
        let request = self.linker.request_mailboxes();
        vec![Command::FetchMailboxes { ctx, request }]
    }

    pub fn connect_gmail(&mut self) -> Vec<Command> {
        if !self.session.is_authenticated() {
            return vec![];
        }
        let step = self
            .linker
            .start_link(self.gmail.as_ref(), PendingAction::Connect);
        self.link_step(step)
    }

    pub fn sync_mailbox(&mut self, email: &str) -> Vec<Command> {
        let Some(ctx) = self.session.context() else {
            return vec![];
        };
        let step = self.linker.sync_with_retry(&ctx, email);
        self.link_step(step)
    }

    fn link_step(&mut self, step: LinkStep) -> Vec<Command> {
        match step {
            LinkStep::Ignored => vec![],
            LinkStep::Progress(cmd, msg) => {
                self.progress(msg);
                vec![cmd]
            }
            LinkStep::Finished(msg) => {
                self.info(msg);
                let mut cmds = self.refresh_mailboxes();
                if let Some(ctx) = self.session.context() {
                    let page = self.emails.refresh();
                    cmds.push(Command::FetchPage {
                        ctx,
                        page,
                        page_size: self.emails.page_size(),
                    });
                }
                cmds
            }
            LinkStep::Failed(e) => {
                self.error(Msg::GmailLinkFailed {
                    detail: e.to_string(),
                });
                vec![]
            }
        }
    }

    // -- preferences --

    pub fn set_language(&mut self, lang: Lang) {
        self.lang = lang;
        store::save(self.store.as_ref(), keys::UI_LANGUAGE, lang.code());
        self.info(Msg::LanguageChanged);
    }

    pub fn toggle_layout(&mut self) {
        self.layout = self.layout.toggled();
        store::save(self.store.as_ref(), keys::PROFILE_LAYOUT, self.layout.code());
    }

    // -- completions --

    pub fn apply(&mut self, event: Event) -> Vec<Command> {
        let event = match event {
            Event::LoggedIn(result) => return self.on_logged_in(result),
            other => other,
        };
        if !self.session.is_authenticated() {
            log::debug!("discarding completion while logged out");
            return vec![];
        }
        if event.session().is_some_and(|s| s != self.session.generation()) {
            log::debug!("discarding completion issued under an earlier login");
            return vec![];
        }
        if event.is_unauthorized() {
            self.force_logout();
            return vec![];
        }

        match event {
            Event::LoggedIn(_) => vec![],
            Event::PageLoaded { page, result, .. } => {
                match self.emails.apply_page(page, result) {
                    Outcome::Applied => self.finish_progress(Msg::LoadingEmails),
                    Outcome::Failed(e) => self.error(Msg::EmailsLoadFailed {
                        detail: e.to_string(),
                    }),
                    Outcome::Stale => {}
                }
                vec![]
            }
            Event::DetailLoaded { id, result, .. } => {
                if let Outcome::Failed(e) = self.detail.apply(id, result) {
                    self.error(Msg::EmailBodyFailed {
                        detail: e.to_string(),
                    });
                }
                vec![]
            }
            Event::Answered { epoch, result, .. } => {
                let empty = self.text(Msg::EmptyAnswer);
                match self.chat.apply_answer(epoch, result, &empty) {
                    Outcome::Applied => self.finish_progress(Msg::Thinking),
                    Outcome::Failed(e) => self.error(Msg::RequestFailed {
                        detail: e.to_string(),
                    }),
                    Outcome::Stale => {}
                }
                vec![]
            }
            Event::ChatSessionsListed { request, result, .. } => {
                if let Outcome::Failed(e) = self.chat.apply_sessions(request, result) {
                    self.error(Msg::HistoryFailed {
                        detail: e.to_string(),
                    });
                }
                vec![]
            }
            Event::ChatMessagesLoaded {
                epoch,
                chat_id,
                result,
                ..
            } => {
                match self.chat.apply_history(epoch, result) {
                    Outcome::Applied => self.info(Msg::SwitchedSession { chat_id }),
                    Outcome::Failed(e) => self.error(Msg::ChatMessagesFailed {
                        detail: e.to_string(),
                    }),
                    Outcome::Stale => {}
                }
                vec![]
            }
            Event::MailboxesLoaded { request, result, .. } => {
                if let Outcome::Failed(e) = self.linker.apply_mailboxes(request, result) {
                    self.error(Msg::MailboxesFailed {
                        detail: e.to_string(),
                    });
                }
                vec![]
            }
            Event::AuthorizationRelay(msg) => {
                let step = self.linker.on_relay(msg);
                self.link_step(step)
            }
            Event::BrowserUnavailable { attempt, url } => {
                if attempt == self.linker.attempt() && self.linker.is_busy() {
                    let text = self.text(Msg::OpenBrowserManually { url });
                    self.status.progress(text);
                }
                vec![]
            }
            Event::AuthorizationUnavailable { attempt, error } => {
                let step = self.linker.on_unavailable(attempt, error);
                self.link_step(step)
            }
            Event::ProfileResolved { attempt, result } => {
                let Some(ctx) = self.session.context() else {
                    return vec![];
                };
                let step = self.linker.on_profile(&ctx, attempt, result);
                self.link_step(step)
            }
            Event::MailboxLinked { attempt, result, .. } => {
                let step = self.linker.on_connected(attempt, result);
                self.link_step(step)
            }
            Event::MailboxSynced { attempt, result, .. } => {
                let step = self.linker.on_synced(self.gmail.as_ref(), attempt, result);
                self.link_step(step)
            }
        }
    }

    fn on_logged_in(&mut self, result: ApiResult<LoginResponse>) -> Vec<Command> {
        if !self.session.login_pending() {
            return vec![];
        }
        match result {
            Ok(resp) => {
                self.session.complete_login(self.store.as_ref(), &resp);
                self.chat = ChatController::load(self.store.as_ref(), now_millis());
                let cmds = self.startup();
                self.info(Msg::LoginSuccess);
                cmds
            }
            Err(e) => {
                self.session.login_failed();
                self.error(Msg::LoginFailed {
                    detail: e.to_string(),
                });
                vec![]
            }
        }
    }
}
