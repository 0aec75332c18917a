//! Runs dashboard commands off the UI thread.
//!
//! Each network command gets its own worker thread; the resulting
//! [`Event`] is sent back over a channel that the UI loop drains between
//! input polls. Nothing is ever cancelled: stale completions are filtered
//! by the dashboard.

use std::sync::Arc;
use std::sync::mpsc::Sender;
use std::thread;

use crate::api::DashboardApi;
use crate::auth::oauth::RelayListener;
use crate::auth::profile::{LinkError, ProfileLookup};
use crate::dashboard::{Command, Event};

type Browser = Arc<dyn Fn(&str) -> std::io::Result<()> + Send + Sync>;

pub struct Executor {
    api: Arc<dyn DashboardApi>,
    profile: Arc<dyn ProfileLookup>,
    tx: Sender<Event>,
    browser: Browser,
    /// Redirect URI the relay listener is serving, once started.
    relay: Option<String>,
}

impl Executor {
    pub fn new(api: Arc<dyn DashboardApi>, profile: Arc<dyn ProfileLookup>, tx: Sender<Event>) -> Self {
        Self {
            api,
            profile,
            tx,
            browser: Arc::new(|url: &str| open::that(url)),
            relay: None,
        }
    }

    /// Replace how authorization URLs are opened.
    pub fn with_browser<F>(mut self, browser: F) -> Self
    where
        F: Fn(&str) -> std::io::Result<()> + Send + Sync + 'static,
    {
        self.browser = Arc::new(browser);
        self
    }

    pub fn dispatch_all(&mut self, cmds: Vec<Command>) {
        for cmd in cmds {
            self.dispatch(cmd);
        }
    }

    pub fn dispatch(&mut self, cmd: Command) {
        match cmd {
            Command::OpenAuthorization {
                attempt,
                url,
                redirect_uri,
            } => self.open_authorization(attempt, url, &redirect_uri),
            cmd => {
                let api = Arc::clone(&self.api);
                let profile = Arc::clone(&self.profile);
                let tx = self.tx.clone();
                thread::spawn(move || {
                    if let Some(event) = run(api.as_ref(), profile.as_ref(), cmd) {
                        // the UI has gone away when this fails
                        let _ = tx.send(event);
                    }
                });
            }
        }
    }

    fn open_authorization(&mut self, attempt: u64, url: String, redirect_uri: &str) {
        if let Err(e) = self.ensure_relay(redirect_uri) {
            log::warn!("oauth relay unavailable: {e}");
            let _ = self.tx.send(Event::AuthorizationUnavailable {
                attempt,
                error: LinkError::Listener(e.to_string()),
            });
            return;
        }

        let browser = Arc::clone(&self.browser);
        let tx = self.tx.clone();
        thread::spawn(move || {
            if let Err(e) = browser(&url) {
                log::warn!("couldn't open the browser: {e}");
                let _ = tx.send(Event::BrowserUnavailable { attempt, url });
            }
        });
    }

    /// The listener must be up before the browser can be redirected to it.
    fn ensure_relay(&mut self, redirect_uri: &str) -> anyhow::Result<()> {
        if let Some(serving) = &self.relay {
            if serving != redirect_uri {
                log::warn!("relay already serving {serving}, ignoring {redirect_uri}");
            }
            return Ok(());
        }
        let listener = RelayListener::bind(redirect_uri)?;
        log::info!("oauth relay listening on port {}", listener.local_port());
        let tx = self.tx.clone();
        listener.spawn(move |msg| {
            let _ = tx.send(Event::AuthorizationRelay(msg));
        });
        self.relay = Some(redirect_uri.to_string());
        Ok(())
    }
}

/// Perform one network command and wrap its outcome.
pub fn run(api: &dyn DashboardApi, profile: &dyn ProfileLookup, cmd: Command) -> Option<Event> {
    let event = match cmd {
        Command::Login { base, request } => Event::LoggedIn(api.login(&base, &request)),
        Command::FetchPage {
            ctx,
            page,
            page_size,
        } => Event::PageLoaded {
            session: ctx.session,
            page,
            result: api.list_emails(&ctx, page, page_size),
        },
        Command::FetchDetail { ctx, id } => Event::DetailLoaded {
            session: ctx.session,
            id,
            result: api.get_email(&ctx, id),
        },
        Command::Ask {
            ctx,
            epoch,
            request,
        } => Event::Answered {
            session: ctx.session,
            epoch,
            result: api.ask(&ctx, &request),
        },
        Command::ListChatSessions {
            ctx,
            request,
            limit,
        } => Event::ChatSessionsListed {
            session: ctx.session,
            request,
            result: api.chat_sessions(&ctx, limit),
        },
        Command::LoadChatMessages {
            ctx,
            epoch,
            chat_id,
            limit,
        } => {
            let result = api.chat_messages(&ctx, &chat_id, limit);
            Event::ChatMessagesLoaded {
                session: ctx.session,
                epoch,
                chat_id,
                result,
            }
        }
        Command::FetchMailboxes { ctx, request } => Event::MailboxesLoaded {
            session: ctx.session,
            request,
            result: api.mailboxes(&ctx),
        },
        Command::ConnectGmail {
            ctx,
            attempt,
            request,
        } => Event::MailboxLinked {
            session: ctx.session,
            attempt,
            result: api.gmail_connect(&ctx, &request),
        },
        Command::SyncMailbox {
            ctx,
            attempt,
            request,
        } => Event::MailboxSynced {
            session: ctx.session,
            attempt,
            result: api.gmail_sync(&ctx, &request),
        },
        Command::LookupProfile {
            attempt,
            access_token,
        } => Event::ProfileResolved {
            attempt,
            result: profile.email_address(&access_token),
        },
        Command::OpenAuthorization { .. } => return None,
    };
    Some(event)
}
