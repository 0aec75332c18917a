use reqwest::blocking::Client;
use serde::Deserialize;
use std::time::Duration;

/// Failures of the Gmail linking flow.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LinkError {
    #[error("Gmail OAuth is not configured (set [gmail] client_id in config.toml)")]
    NotConfigured,
    #[error("no Gmail access token received")]
    NoAccessToken,
    #[error("could not get the mailbox address")]
    NoMailboxEmail,
    #[error("unable to fetch Gmail profile ({status}): {detail}")]
    Profile { status: u16, detail: String },
    #[error("authorized {actual} but {expected} was being synced")]
    Mismatch { expected: String, actual: String },
    #[error("Gmail authorization failed: {0}")]
    Authorization(String),
    #[error("request failed: {0}")]
    Transport(String),
    #[error("{0}")]
    Listener(String),
}

/// Resolves the address of the mailbox an access token was issued for.
pub trait ProfileLookup: Send + Sync {
    fn email_address(&self, access_token: &str) -> Result<String, LinkError>;
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProfileResponse {
    #[serde(default)]
    email_address: String,
}

pub struct GmailProfileClient {
    client: Client,
}

impl GmailProfileClient {
    const PROFILE_URL: &'static str = "https://gmail.googleapis.com/gmail/v1/users/me/profile";

    pub fn new(timeout: Duration) -> anyhow::Result<Self> {
        Ok(Self {
            client: Client::builder().timeout(timeout).build()?,
        })
    }
}

impl ProfileLookup for GmailProfileClient {
    fn email_address(&self, access_token: &str) -> Result<String, LinkError> {
        let resp = self
            .client
            .get(Self::PROFILE_URL)
            .bearer_auth(access_token)
            .send()
            .map_err(|e| LinkError::Transport(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(LinkError::Profile {
                status: status.as_u16(),
                detail: resp.text().unwrap_or_default(),
            });
        }

        let profile: ProfileResponse = resp
            .json()
            .map_err(|e| LinkError::Transport(e.to_string()))?;
        let email = profile.email_address.trim().to_string();
        if email.is_empty() {
            return Err(LinkError::NoMailboxEmail);
        }
        Ok(email)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn profile_response_reads_camel_case() {
        let p: ProfileResponse =
            serde_json::from_str(r#"{"emailAddress":"me@gmail.com","messagesTotal":10}"#).unwrap();
        assert_eq!(p.email_address, "me@gmail.com");
    }

    #[test]
    fn mismatch_message_names_both_addresses() {
        let e = LinkError::Mismatch {
            expected: "a@gmail.com".into(),
            actual: "b@gmail.com".into(),
        };
        let text = e.to_string();
        assert!(text.contains("a@gmail.com") && text.contains("b@gmail.com"));
    }
}
