use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

const PLACEHOLDER_CLIENT_ID: &str = "YOUR_CLIENT_ID.apps.googleusercontent.com";

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Config {
    #[serde(default = "default_api_base")]
    pub api_base: String,
    #[serde(default = "default_timeout")]
    pub request_timeout_secs: u64,
    /// Keep the auth token in the OS keyring instead of the state database.
    #[serde(default = "default_true")]
    pub keyring: bool,
    pub db_path: Option<String>,
    pub log_path: Option<String>,
    pub gmail: Option<GmailConfig>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct GmailConfig {
    pub client_id: String,
    #[serde(default = "default_redirect_uri")]
    pub redirect_uri: String,
}

impl GmailConfig {
    /// False for an empty client id or the one from the generated template.
    pub fn is_configured(&self) -> bool {
        let id = self.client_id.trim();
        !id.is_empty() && id != PLACEHOLDER_CLIENT_ID
    }
}

fn default_api_base() -> String {
    "http://localhost:8005".to_string()
}

fn default_timeout() -> u64 {
    30
}

fn default_true() -> bool {
    true
}

fn default_redirect_uri() -> String {
    "http://127.0.0.1:3000/oauth-callback".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            request_timeout_secs: default_timeout(),
            keyring: true,
            db_path: None,
            log_path: None,
            gmail: None,
        }
    }
}

fn config_dir() -> Result<PathBuf> {
    Ok(dirs::config_dir()
        .ok_or_else(|| anyhow::anyhow!("no config dir available"))?
        .join("inbox_dashboard"))
}

pub fn config_path() -> Result<PathBuf> {
    let mut p = config_dir()?;
    fs::create_dir_all(&p)?;
    p.push("config.toml");
    Ok(p)
}

fn in_config_dir(name: &str) -> Result<PathBuf> {
    let mut p = config_dir()?;
    fs::create_dir_all(&p)?;
    p.push(name);
    Ok(p)
}

pub fn load_config() -> Result<Config> {
    load_config_from(&config_path()?)
}

/// Read `path`, writing a template there first when it does not exist.
pub fn load_config_from(path: &Path) -> Result<Config> {
    if !path.exists() {
        let sample = Config {
            gmail: Some(GmailConfig {
                client_id: PLACEHOLDER_CLIENT_ID.to_string(),
                redirect_uri: default_redirect_uri(),
            }),
            ..Config::default()
        };
        fs::write(path, toml::to_string_pretty(&sample)?)?;
        log::info!("created template config at {}", path.display());
        return Ok(sample);
    }
    let s = fs::read_to_string(path)?;
    let cfg: Config = toml::from_str(&s)?;
    Ok(cfg)
}

pub fn resolve_db_path(cfg: &Config) -> Result<PathBuf> {
    match &cfg.db_path {
        Some(p) => Ok(PathBuf::from(p)),
        None => in_config_dir("state.db"),
    }
}

pub fn resolve_log_path(cfg: &Config) -> Result<PathBuf> {
    match &cfg.log_path {
        Some(p) => Ok(PathBuf::from(p)),
        None => in_config_dir("dashboard.log"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_gets_template_with_unconfigured_gmail() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let cfg = load_config_from(&path).unwrap();
        assert!(path.exists());
        assert_eq!(cfg.api_base, "http://localhost:8005");
        assert!(!cfg.gmail.as_ref().unwrap().is_configured());

        // the template parses back to the same thing
        assert_eq!(load_config_from(&path).unwrap(), cfg);
    }

    #[test]
    fn partial_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            "api_base = \"https://api.example.com\"\n[gmail]\nclient_id = \"abc.apps.googleusercontent.com\"\n",
        )
        .unwrap();

        let cfg = load_config_from(&path).unwrap();
        assert_eq!(cfg.api_base, "https://api.example.com");
        assert_eq!(cfg.request_timeout_secs, 30);
        assert!(cfg.keyring);
        let gmail = cfg.gmail.unwrap();
        assert!(gmail.is_configured());
        assert_eq!(gmail.redirect_uri, "http://127.0.0.1:3000/oauth-callback");
    }

    #[test]
    fn explicit_paths_win() {
        let cfg = Config {
            db_path: Some("/tmp/x.db".into()),
            log_path: Some("/tmp/x.log".into()),
            ..Config::default()
        };
        assert_eq!(resolve_db_path(&cfg).unwrap(), PathBuf::from("/tmp/x.db"));
        assert_eq!(resolve_log_path(&cfg).unwrap(), PathBuf::from("/tmp/x.log"));
    }
}
