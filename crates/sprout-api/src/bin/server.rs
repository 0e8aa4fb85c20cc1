//! Sprout server binary.
//!
//! Reads `config.toml` (or the path specified with `--config`), opens an
//! in-process SQLite store, and serves the assessment API over HTTP.
//!
//! # Staff bootstrap
//!
//! Registration through the API never grants the staff flag. To create the
//! first staff account (password read from stdin):
//!
//! ```
//! cargo run -p sprout-api --bin server -- --create-staff admin@example.com "Admin"
//! ```

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use anyhow::Context as _;
use clap::Parser;
use sprout_api::{AppState, ServerConfig, auth};
use sprout_core::{
  account::{self, NewAccount, Role},
  store::AssessmentStore as _,
};
use sprout_store_sqlite::SqliteStore;
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Sprout assessment server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,

  /// Create a staff account (email and display name; password from stdin)
  /// and exit.
  #[arg(long, num_args = 2, value_names = ["EMAIL", "NAME"])]
  create_staff: Option<Vec<String>>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  // Initialise tracing.
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  // Load configuration.
  let settings = config::Config::builder()
    .add_source(config::File::from(cli.config).required(false))
    .add_source(config::Environment::with_prefix("SPROUT"))
    .build()
    .context("failed to read config file")?;

  let server_cfg: ServerConfig = settings
    .try_deserialize()
    .context("failed to deserialise ServerConfig")?;

  // Expand `~` in store path.
  let store_path = expand_tilde(&server_cfg.store_path);

  // Open SQLite store.
  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;

  // Helper mode: create a staff account and exit.
  if let Some(args) = cli.create_staff {
    let email = account::normalize_email(&args[0])?;
    let password = password_from_stdin()?;
    account::check_password_policy(&password)?;
    let password_hash = auth::hash_password(&password)
      .map_err(|e| anyhow::anyhow!("password hashing failed: {e}"))?;
    let created = store
      .create_account(NewAccount {
        email,
        name: args[1].clone(),
        password_hash,
        role: Role::Staff,
        is_staff: true,
      })
      .await
      .context("failed to create staff account")?;
    println!("created staff account {} (id {})", created.email, created.account_id);
    return Ok(());
  }

  // Build application state.
  let state = AppState { store: Arc::new(store) };

  let app = sprout_api::router(state);
  let address = format!("{}:{}", server_cfg.host, server_cfg.port);

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}

/// Read a password from stdin.
fn password_from_stdin() -> anyhow::Result<String> {
  use std::io::{self, BufRead, Write};
  let stdin = io::stdin();
  print!("Password: ");
  io::stdout().flush().ok();
  let mut line = String::new();
  stdin.lock().read_line(&mut line)?;
  Ok(
    line
      .trim_end_matches('\n')
      .trim_end_matches('\r')
      .to_string(),
  )
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
