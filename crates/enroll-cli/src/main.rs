//! `enroll`: command-line client for the course-enrollment backend.
//!
//! # Usage
//!
//! ```text
//! enroll --url http://localhost:3000 login --email sam@example.com --token <id-token>
//! enroll classes --page 2
//! enroll submit <assignment-id> --class <class-id> --text "my answer"
//! ```
//!
//! The signed-in principal is kept in a session file between runs. A command
//! the backend answers with `401` deletes that file.

mod commands;

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use anyhow::{Context, Result};
use clap::Parser;
use commands::Command;
use enroll_client::{
  AuthClient, CancellationToken, ClientConfig, Session, navigator::NavigationLog,
};
use enroll_core::principal::Principal;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "enroll", version, about = "Command-line client for the enrollment backend")]
struct Args {
  /// Path to a TOML config file.
  #[arg(short, long, value_name = "FILE")]
  config: Option<PathBuf>,

  /// Base URL of the backend; overrides the config file.
  #[arg(long, env = "ENROLL_URL")]
  url: Option<String>,

  /// Where the signed-in principal is kept between runs.
  #[arg(long, env = "ENROLL_SESSION", default_value = "~/.config/enroll/session.json")]
  session: PathBuf,

  #[command(subcommand)]
  command: Command,
}

// ─── Entry point ──────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .with_writer(std::io::stderr)
    .init();

  let args = Args::parse();

  let mut config = ClientConfig::load(args.config.as_deref()).context("loading configuration")?;
  if let Some(url) = args.url {
    config.base_url = url;
  }

  let session_path = expand_tilde(&args.session);
  let session = match load_session(&session_path)? {
    Some(principal) => Session::signed_in(principal),
    None => Session::anonymous(),
  };

  let nav = Arc::new(NavigationLog::new());
  let client = AuthClient::new(config, session, nav.clone()).context("building HTTP client")?;

  // Ctrl-C abandons whatever is in flight.
  let cancel = CancellationToken::new();
  {
    let cancel = cancel.clone();
    tokio::spawn(async move {
      if tokio::signal::ctrl_c().await.is_ok() {
        cancel.cancel();
      }
    });
  }

  let result = commands::run(args.command, &client, &session_path, &cancel).await;

  let login = client.config().login_path.clone();
  if nav.entries().iter().any(|r| r.to == login) {
    forget_session(&session_path)?;
    eprintln!("Session expired or was rejected; run `enroll login` again.");
  }

  result
}

// ─── Session file ─────────────────────────────────────────────────────────────

fn load_session(path: &Path) -> Result<Option<Principal>> {
  if !path.exists() {
    return Ok(None);
  }
  let raw = std::fs::read_to_string(path)
    .with_context(|| format!("reading session file {}", path.display()))?;
  let principal = serde_json::from_str(&raw)
    .with_context(|| format!("parsing session file {}", path.display()))?;
  Ok(Some(principal))
}

pub(crate) fn save_session(path: &Path, principal: &Principal) -> Result<()> {
  if let Some(dir) = path.parent() {
    std::fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
  }
  let raw = serde_json::to_string_pretty(principal)?;
  std::fs::write(path, raw).with_context(|| format!("writing session file {}", path.display()))
}

pub(crate) fn forget_session(path: &Path) -> Result<()> {
  match std::fs::remove_file(path) {
    Ok(()) => Ok(()),
    Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
    Err(e) => Err(e).with_context(|| format!("removing session file {}", path.display())),
  }
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
