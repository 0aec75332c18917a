use anyhow::{Result, anyhow};
use oauth2::basic::BasicClient;
use oauth2::{AuthUrl, ClientId, CsrfToken, RedirectUrl, Scope};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::thread;
use tiny_http::{Header, Response, Server};
use url::Url;

const AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const GMAIL_READONLY_SCOPE: &str = "https://www.googleapis.com/auth/gmail.readonly";
const USERINFO_EMAIL_SCOPE: &str = "https://www.googleapis.com/auth/userinfo.email";

/// Marker the relay page attaches to every message it forwards.
pub const RELAY_SOURCE: &str = "gmail-oauth";
const RELAY_PATH: &str = "/relay";

/// Served at the redirect URI. The implicit grant returns the token in the
/// URL fragment, which never reaches the server, so the page forwards it.
const RELAY_PAGE: &str = r#"<!doctype html>
<html><head><meta charset="utf-8"><title>Gmail authorization</title></head>
<body>
<p id="msg">Completing authorization...</p>
<script>
  const params = new URLSearchParams(window.location.hash.slice(1));
  new URLSearchParams(window.location.search).forEach((v, k) => {
    if (!params.has(k)) params.set(k, v);
  });
  params.set("source", "gmail-oauth");
  fetch("/relay?" + params.toString())
    .then(() => { document.getElementById("msg").textContent = "Authorization received. You can close this window."; })
    .catch(() => { document.getElementById("msg").textContent = "Could not reach the dashboard. Is it still running?"; });
</script>
</body></html>
"#;

/// Fresh opaque value for the `state` parameter of one authorization attempt.
pub fn new_state_token() -> String {
    CsrfToken::new_random().secret().clone()
}

/// Implicit-grant authorization URL for read-only Gmail access.
pub fn authorization_url(client_id: &str, redirect_uri: &str, state: &str) -> Result<Url> {
    let client = BasicClient::new(
        ClientId::new(client_id.to_string()),
        None,
        AuthUrl::new(AUTH_URL.to_string())?,
        None,
    )
    .set_redirect_uri(RedirectUrl::new(redirect_uri.to_string())?);

    let state = CsrfToken::new(state.to_string());
    let (url, _state) = client
        .authorize_url(|| state)
        .use_implicit_flow()
        .add_scope(Scope::new(GMAIL_READONLY_SCOPE.to_string()))
        .add_scope(Scope::new(USERINFO_EMAIL_SCOPE.to_string()))
        .add_extra_param("prompt", "consent")
        .add_extra_param("include_granted_scopes", "true")
        .url();
    Ok(url)
}

/// What the relay page forwarded from the authorization redirect.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct OAuthMessage {
    pub source: Option<String>,
    pub state: Option<String>,
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    pub error: Option<String>,
    pub error_description: Option<String>,
}

impl OAuthMessage {
    pub fn from_url(url: &Url) -> Self {
        let mut msg = OAuthMessage::default();
        for (k, v) in url.query_pairs() {
            let v = Some(v.into_owned()).filter(|v| !v.is_empty());
            match k.as_ref() {
                "source" => msg.source = v,
                "state" => msg.state = v,
                "access_token" => msg.access_token = v,
                "refresh_token" => msg.refresh_token = v,
                "error" => msg.error = v,
                "error_description" => msg.error_description = v,
                _ => {}
            }
        }
        msg
    }

    pub fn is_relay(&self) -> bool {
        self.source.as_deref() == Some(RELAY_SOURCE)
    }
}

/// Loopback listener standing in for the popup's `postMessage` channel.
pub struct RelayListener {
    server: Server,
    host: String,
    redirect_path: String,
}

impl RelayListener {
    /// Bind to the host and port of `redirect_uri`.
    pub fn bind(redirect_uri: &str) -> Result<Self> {
        let redirect = Url::parse(redirect_uri)
            .map_err(|e| anyhow!("Invalid redirect_uri '{redirect_uri}': {e}"))?;

        let host = redirect
            .host_str()
            .ok_or_else(|| anyhow!("redirect_uri missing host: {redirect_uri}"))?
            .to_string();

        let port = redirect
            .port_or_known_default()
            .ok_or_else(|| anyhow!("redirect_uri missing/unknown port: {redirect_uri}"))?;

        let bind_ip: IpAddr = match host.as_str() {
            "localhost" | "127.0.0.1" => IpAddr::V4(Ipv4Addr::LOCALHOST),
            other => other.parse::<IpAddr>().map_err(|_| {
                anyhow!("redirect_uri host must be localhost/127.0.0.1 or an IP: {other}")
            })?,
        };

        let bind_addr = SocketAddr::new(bind_ip, port);
        let server = Server::http(bind_addr)
            .map_err(|e| anyhow!("Failed to bind OAuth relay listener on {bind_addr}: {e:?}"))?;

        Ok(Self {
            server,
            host,
            redirect_path: redirect.path().to_string(),
        })
    }

    pub fn local_port(&self) -> u16 {
        self.server.server_addr().port()
    }

    /// Serve forever on a background thread, handing every relayed message
    /// to `deliver`. There is no timeout: an abandoned browser tab just
    /// leaves the attempt pending.
    pub fn spawn<F>(self, deliver: F) -> thread::JoinHandle<()>
    where
        F: Fn(OAuthMessage) + Send + 'static,
    {
        thread::spawn(move || {
            let port = self.local_port();
            for request in self.server.incoming_requests() {
                let full = format!("http://{}:{}{}", self.host, port, request.url());
                let Ok(parsed) = Url::parse(&full) else {
                    let _ = request.respond(Response::from_string("Bad redirect").with_status_code(400u16));
                    continue;
                };

                if parsed.path() == RELAY_PATH {
                    let msg = OAuthMessage::from_url(&parsed);
                    log::debug!("oauth relay message received (state {:?})", msg.state);
                    deliver(msg);
                    let _ = request.respond(Response::from_string("ok"));
                } else if parsed.path() == self.redirect_path {
                    let mut resp = Response::from_string(RELAY_PAGE);
                    if let Ok(h) = Header::from_bytes(&b"Content-Type"[..], &b"text/html; charset=utf-8"[..]) {
                        resp.add_header(h);
                    }
                    let _ = request.respond(resp);
                } else {
                    let _ = request.respond(Response::from_string("Not found").with_status_code(404u16));
                }
            }
        })
    }
}
