//! Linked mailboxes and the Gmail authorization round-trip.
//!
//! ```text
//! idle -> awaiting authorization -> resolving profile -> connecting | syncing -> idle
//! ```
//! Any failure drops back to idle. A token-less sync that fails enters the
//! same machine with `PendingAction::Sync` so the user can re-authorize.

use crate::api::{
    ApiContext, ApiResult, CONNECT_DAYS_BACK, GmailConnectRequest, GmailSyncRequest,
    IngestResponse, SYNC_FALLBACK_DAYS_BACK,
};
use crate::auth::oauth::{self, OAuthMessage};
use crate::auth::profile::LinkError;
use crate::config::GmailConfig;
use crate::dashboard::Command;
use crate::dashboard::emails::Outcome;
use crate::domain::mailbox::{Mailbox, PendingAction};
use crate::i18n::Msg;

#[derive(Debug, Clone, PartialEq, Default)]
pub enum LinkPhase {
    #[default]
    Idle,
    AwaitingAuthorization {
        state: String,
        action: PendingAction,
    },
    ResolvingProfile {
        action: PendingAction,
        access_token: String,
        refresh_token: Option<String>,
    },
    Connecting {
        email: String,
    },
    Syncing {
        email: String,
        /// Set when the sync carries freshly authorized tokens. A failure
        /// then is final instead of leading to re-authorization.
        reauthorized: bool,
    },
}

/// What the dashboard should do after a linking transition.
#[derive(Debug, PartialEq)]
pub enum LinkStep {
    /// Not for the current attempt; nothing changes.
    Ignored,
    Progress(Command, Msg),
    /// Finished with new mail ingested; mailboxes and emails need a refresh.
    Finished(Msg),
    Failed(LinkError),
}

#[derive(Debug, Default)]
pub struct MailboxLinker {
    mailboxes: Vec<Mailbox>,
    loading: bool,
    /// Latest mailbox listing issued; older replies are dropped.
    mailboxes_request: u64,
    phase: LinkPhase,
    /// Identifies the attempt that commands and completions belong to.
    attempt: u64,
}

impl MailboxLinker {
    pub fn mailboxes(&self) -> &[Mailbox] {
        &self.mailboxes
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn phase(&self) -> &LinkPhase {
        &self.phase
    }

    pub fn attempt(&self) -> u64 {
        self.attempt
    }

    pub fn is_busy(&self) -> bool {
        self.phase != LinkPhase::Idle
    }

    pub fn request_mailboxes(&mut self) -> u64 {
        self.mailboxes_request += 1;
        self.loading = true;
        self.mailboxes_request
    }

    pub fn apply_mailboxes(&mut self, request: u64, result: ApiResult<Vec<Mailbox>>) -> Outcome {
        if request != self.mailboxes_request {
            log::debug!("discarding mailbox list {request}, want {}", self.mailboxes_request);
            return Outcome::Stale;
        }
        self.loading = false;
        match result {
            Ok(items) => {
                self.mailboxes = items;
                Outcome::Applied
            }
            Err(e) => Outcome::Failed(e),
        }
    }

    /// Open a new authorization attempt. Any earlier pending attempt is
    /// superseded: its relay message will no longer match.
    pub fn start_link(&mut self, gmail: Option<&GmailConfig>, action: PendingAction) -> LinkStep {
        self.attempt += 1;
        self.phase = LinkPhase::Idle;

        let Some(gmail) = gmail.filter(|g| g.is_configured()) else {
            return LinkStep::Failed(LinkError::NotConfigured);
        };
        let state = oauth::new_state_token();
        let url = match oauth::authorization_url(&gmail.client_id, &gmail.redirect_uri, &state) {
            Ok(url) => url,
            Err(e) => return LinkStep::Failed(LinkError::Authorization(e.to_string())),
        };

        log::info!("gmail authorization started ({action:?})");
        self.phase = LinkPhase::AwaitingAuthorization { state, action };
        LinkStep::Progress(
            Command::OpenAuthorization {
                attempt: self.attempt,
                url: url.to_string(),
                redirect_uri: gmail.redirect_uri.clone(),
            },
            Msg::AwaitingAuthorization,
        )
    }

    /// Handle a relayed authorization result. Messages from another source,
    /// with another `state`, or with nothing pending are not ours.
    pub fn on_relay(&mut self, msg: OAuthMessage) -> LinkStep {
        if !msg.is_relay() {
            log::debug!("ignoring relay message from {:?}", msg.source);
            return LinkStep::Ignored;
        }
        let LinkPhase::AwaitingAuthorization { state, .. } = &self.phase else {
            log::debug!("ignoring relay message, no authorization pending");
            return LinkStep::Ignored;
        };
        if msg.state.as_deref() != Some(state.as_str()) {
            log::debug!("ignoring relay message with foreign state");
            return LinkStep::Ignored;
        }
        let LinkPhase::AwaitingAuthorization { action, .. } = std::mem::take(&mut self.phase) else {
            return LinkStep::Ignored;
        };

        if let Some(error) = msg.error {
            let detail = msg.error_description.unwrap_or(error);
            return LinkStep::Failed(LinkError::Authorization(detail));
        }
        let Some(access_token) = msg.access_token else {
            return LinkStep::Failed(LinkError::NoAccessToken);
        };

        self.phase = LinkPhase::ResolvingProfile {
            action,
            access_token: access_token.clone(),
            refresh_token: msg.refresh_token,
        };
        LinkStep::Progress(
            Command::LookupProfile {
                attempt: self.attempt,
                access_token,
            },
            Msg::FetchingGmailProfile,
        )
    }

    /// The browser could not be started or the listener could not bind.
    pub fn on_unavailable(&mut self, attempt: u64, error: LinkError) -> LinkStep {
        if attempt != self.attempt || !matches!(self.phase, LinkPhase::AwaitingAuthorization { .. }) {
            return LinkStep::Ignored;
        }
        self.phase = LinkPhase::Idle;
        LinkStep::Failed(error)
    }

    pub fn on_profile(
        &mut self,
        ctx: &ApiContext,
        attempt: u64,
        result: Result<String, LinkError>,
    ) -> LinkStep {
        if attempt != self.attempt || !matches!(self.phase, LinkPhase::ResolvingProfile { .. }) {
            return LinkStep::Ignored;
        }
        let LinkPhase::ResolvingProfile {
            action,
            access_token,
            refresh_token,
        } = std::mem::take(&mut self.phase)
        else {
            return LinkStep::Ignored;
        };
        let email = match result {
            Ok(email) => email,
            Err(e) => return LinkStep::Failed(e),
        };

        match action {
            PendingAction::Connect => {
                self.phase = LinkPhase::Connecting {
                    email: email.clone(),
                };
                LinkStep::Progress(
                    Command::ConnectGmail {
                        ctx: ctx.clone(),
                        attempt,
                        request: GmailConnectRequest {
                            email: email.clone(),
                            access_token,
                            refresh_token,
                            days_back: CONNECT_DAYS_BACK,
                        },
                    },
                    Msg::LinkingMailbox { email },
                )
            }
            PendingAction::Sync { email: expected } => {
                if !same_address(&expected, &email) {
                    log::info!("authorized {email} while re-authorizing {expected}");
                    return LinkStep::Failed(LinkError::Mismatch {
                        expected,
                        actual: email,
                    });
                }
                self.phase = LinkPhase::Syncing {
                    email: expected.clone(),
                    reauthorized: true,
                };
                LinkStep::Progress(
                    Command::SyncMailbox {
                        ctx: ctx.clone(),
                        attempt,
                        request: GmailSyncRequest {
                            email: expected.clone(),
                            access_token: Some(access_token),
                            refresh_token,
                            fallback_days_back: SYNC_FALLBACK_DAYS_BACK,
                        },
                    },
                    Msg::SyncingMailbox { email: expected },
                )
            }
        }
    }

    pub fn on_connected(&mut self, attempt: u64, result: ApiResult<IngestResponse>) -> LinkStep {
        if attempt != self.attempt || !matches!(self.phase, LinkPhase::Connecting { .. }) {
            return LinkStep::Ignored;
        }
        self.phase = LinkPhase::Idle;
        match result {
            Ok(resp) => LinkStep::Finished(Msg::GmailConnectSuccess {
                count: resp.ingested,
            }),
            Err(e) => LinkStep::Failed(LinkError::Transport(e.to_string())),
        }
    }

    /// Sync relying on the refresh token stored by the backend.
    pub fn sync_with_retry(&mut self, ctx: &ApiContext, email: &str) -> LinkStep {
        self.attempt += 1;
        self.phase = LinkPhase::Syncing {
            email: email.to_string(),
            reauthorized: false,
        };
        LinkStep::Progress(
            Command::SyncMailbox {
                ctx: ctx.clone(),
                attempt: self.attempt,
                request: GmailSyncRequest::stored_credentials(email),
            },
            Msg::SyncingMailbox {
                email: email.to_string(),
            },
        )
    }

    /// A failed token-less sync falls back to re-authorization of the same
    /// mailbox.
    pub fn on_synced(
        &mut self,
        gmail: Option<&GmailConfig>,
        attempt: u64,
        result: ApiResult<IngestResponse>,
    ) -> LinkStep {
        if attempt != self.attempt {
            return LinkStep::Ignored;
        }
        let LinkPhase::Syncing { email, reauthorized } = std::mem::take(&mut self.phase) else {
            return LinkStep::Ignored;
        };
        match result {
            Ok(resp) => {
                log::info!("{email} synced, {} new messages", resp.ingested);
                LinkStep::Finished(Msg::SyncedMailbox {
                    email,
                    count: resp.ingested,
                })
            }
            Err(e) if reauthorized => LinkStep::Failed(LinkError::Transport(e.to_string())),
            Err(e) => {
                log::info!("sync of {email} failed ({e}), re-authorizing");
                match self.start_link(gmail, PendingAction::Sync { email }) {
                    LinkStep::Progress(cmd, _) => {
                        LinkStep::Progress(cmd, Msg::SyncNeedsReauth { detail: e.to_string() })
                    }
                    other => other,
                }
            }
        }
    }

    /// Forget everything, including any attempt in flight.
    pub fn clear(&mut self) {
        self.mailboxes.clear();
        self.loading = false;
        self.mailboxes_request += 1;
        self.phase = LinkPhase::Idle;
        self.attempt += 1;
    }
}

fn same_address(a: &str, b: &str) -> bool {
    a.trim().to_lowercase() == b.trim().to_lowercase()
}
