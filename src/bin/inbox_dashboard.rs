use anyhow::{Result, anyhow};
use clap::{Parser, Subcommand};
use std::sync::{Arc, mpsc};
use std::time::Duration;

use inbox_dashboard::api::{DashboardApi, HttpDashboardApi};
use inbox_dashboard::auth::profile::GmailProfileClient;
use inbox_dashboard::auth::session::SessionState;
use inbox_dashboard::config::{Config, load_config, resolve_db_path, resolve_log_path};
use inbox_dashboard::dashboard::Dashboard;
use inbox_dashboard::logging;
use inbox_dashboard::runtime::Executor;
use inbox_dashboard::store::{KeyringSecrets, KvStore, MemoryKvStore, SqliteKvStore};
use inbox_dashboard::terminal::run_tui;

#[derive(Parser)]
#[command(name = "inbox-dashboard")]
#[command(about = "Terminal dashboard for the inbox assistant", long_about = None)]
struct Cli {
    #[command(subcommand)]
    cmd: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the dashboard (default)
    Tui {
        /// Keep nothing on disk; the session ends with the process
        #[arg(long)]
        ephemeral: bool,
    },

    /// Sign in without the TUI; the password is read from stdin
    Login {
        #[arg(long)]
        user_id: String,

        #[arg(long)]
        api_base: Option<String>,
    },

    /// Forget the stored session
    Logout,

    /// Show the stored session
    Whoami,
}

fn open_store(cfg: &Config, ephemeral: bool) -> Result<Box<dyn KvStore>> {
    if ephemeral {
        return Ok(Box::new(MemoryKvStore::new()));
    }
    let db_path = resolve_db_path(cfg)?;
    let db = SqliteKvStore::open(&db_path)?;
    if cfg.keyring {
        Ok(Box::new(KeyringSecrets::new(db)))
    } else {
        Ok(Box::new(db))
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let cfg = load_config().map_err(|e| anyhow!("Configuration error: {e}"))?;
    let timeout = Duration::from_secs(cfg.request_timeout_secs);

    match cli.cmd.unwrap_or(Command::Tui { ephemeral: false }) {
        Command::Tui { ephemeral } => {
            logging::init_file(&resolve_log_path(&cfg)?)?;
            let store = open_store(&cfg, ephemeral)?;

            let api = Arc::new(HttpDashboardApi::new(timeout)?);
            let profile = Arc::new(GmailProfileClient::new(timeout)?);
            let (tx, rx) = mpsc::channel();
            let exec = Executor::new(api, profile, tx);
            let dash = Dashboard::new(store, &cfg);

            run_tui(dash, exec, rx).map_err(|e| anyhow!("{e:?}"))
        }

        Command::Login { user_id, api_base } => {
            logging::init_stderr();
            let store = open_store(&cfg, false)?;
            let mut session = SessionState::load(store.as_ref(), &cfg.api_base);
            if let Some(base) = api_base {
                session.set_api_base(store.as_ref(), &base);
            }

            eprintln!("Password (end with Enter or Ctrl-D):");
            let mut password = String::new();
            std::io::stdin().read_line(&mut password)?;
            let password = password.trim_end_matches(['\r', '\n']);

            let request = session.begin_login(&user_id, password)?;
            let api = HttpDashboardApi::new(timeout)?;
            let resp = api
                .login(session.api_base(), &request)
                .map_err(|e| anyhow!("Login failed: {e}"))?;
            session.complete_login(store.as_ref(), &resp);
            println!("Logged in as {} at {}", resp.user_id, session.api_base());
            Ok(())
        }

        Command::Logout => {
            logging::init_stderr();
            let store = open_store(&cfg, false)?;
            let mut session = SessionState::load(store.as_ref(), &cfg.api_base);
            session.clear(store.as_ref());
            println!("Logged out");
            Ok(())
        }

        Command::Whoami => {
            logging::init_stderr();
            let store = open_store(&cfg, false)?;
            let session = SessionState::load(store.as_ref(), &cfg.api_base);
            match session.user_id() {
                Some(user) => println!("{user} at {}", session.api_base()),
                None => println!("not logged in ({})", session.api_base()),
            }
            Ok(())
        }
    }
}
