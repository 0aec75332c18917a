use serde::{Deserialize, Serialize};

/// A linked external mailbox as reported by `GET /mailboxes`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Mailbox {
    /// The mailbox address.
    pub provider: String,
    #[serde(default = "default_provider_type")]
    pub provider_type: String,
    #[serde(default)]
    pub last_synced_at: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

fn default_provider_type() -> String {
    "gmail".to_string()
}

/// What to do once the authorization round-trip delivers a token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PendingAction {
    Connect,
    Sync { email: String },
}
