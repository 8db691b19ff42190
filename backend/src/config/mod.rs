// Process settings read from the environment
pub mod store;

pub use store::{
  AdminSection, AiSection, AiSettings, ConfigError, ConfigStore, DatabaseSection, ServiceKey,
  SetupConfig,
};

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Which SQL backend (if any) persists users, sessions, keys and history
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DatabaseKind {
  #[default]
  None,
  Sqlite,
  MySql,
}

impl DatabaseKind {
  pub fn as_str(&self) -> &'static str {
    match self {
      DatabaseKind::None => "none",
      DatabaseKind::Sqlite => "sqlite",
      DatabaseKind::MySql => "mysql",
    }
  }

  /// Infer the backend from a connection URL scheme
  pub fn from_url(url: &str) -> Option<Self> {
    if url.starts_with("sqlite:") {
      Some(DatabaseKind::Sqlite)
    } else if url.starts_with("mysql:") || url.starts_with("mariadb:") {
      Some(DatabaseKind::MySql)
    } else {
      None
    }
  }
}

impl FromStr for DatabaseKind {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.trim().to_lowercase().as_str() {
      "" | "none" | "memory" => Ok(DatabaseKind::None),
      "sqlite" => Ok(DatabaseKind::Sqlite),
      "mysql" | "mariadb" => Ok(DatabaseKind::MySql),
      other => Err(format!("Unknown database type: {}", other)),
    }
  }
}

#[derive(Debug, Clone)]
pub struct Settings {
  pub bind_address: String,
  pub port: u16,
  /// Development mode exposes internal error messages in responses
  pub development: bool,
  pub data_dir: PathBuf,
  pub database_kind: DatabaseKind,
  pub database_url: Option<String>,
  pub admin_username: String,
  pub admin_password: String,
  pub admin_password_hash: Option<String>,
  pub session_ttl: chrono::Duration,
  pub login_failure_delay: Duration,
  pub rate_limit_max_requests: usize,
  pub rate_limit_window: Duration,
  /// Honour `X-Forwarded-For` from a reverse proxy when keying rate limits
  pub trust_proxy: bool,
  pub frontend_url: Option<String>,
  pub cookie_secure: bool,
  pub bcrypt_cost: u32,
  pub claude_api_key: Option<String>,
  pub openai_api_key: Option<String>,
}

impl Default for Settings {
  fn default() -> Self {
    Self {
      bind_address: "0.0.0.0".to_string(),
      port: 3001,
      development: false,
      data_dir: PathBuf::from("./data"),
      database_kind: DatabaseKind::None,
      database_url: None,
      admin_username: "admin".to_string(),
      admin_password: "testlab2024".to_string(),
      admin_password_hash: None,
      session_ttl: chrono::Duration::hours(24),
      login_failure_delay: Duration::from_millis(1000),
      rate_limit_max_requests: 100,
      rate_limit_window: Duration::from_secs(3600),
      trust_proxy: false,
      frontend_url: None,
      cookie_secure: false,
      bcrypt_cost: 10,
      claude_api_key: None,
      openai_api_key: None,
    }
  }
}

/// Upper bound for `SESSION_TTL_HOURS`, one year
pub const MAX_SESSION_TTL_HOURS: i64 = 24 * 365;

fn env_var(name: &str) -> Option<String> {
  std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn env_parse<T: FromStr>(name: &str) -> Option<T> {
  env_var(name).and_then(|v| v.trim().parse().ok())
}

fn env_flag(name: &str) -> Option<bool> {
  env_var(name).map(|v| v == "true" || v == "1")
}

impl Settings {
  /// Build settings from environment variables, falling back to defaults
  pub fn from_env() -> anyhow::Result<Self> {
    let defaults = Settings::default();

    let environment = env_var("TESTLAB_ENV")
      .or_else(|| env_var("NODE_ENV"))
      .unwrap_or_else(|| "production".to_string());

    let database_url = env_var("DATABASE_URL");
    let database_kind = match env_var("DATABASE_TYPE") {
      Some(kind) => kind.parse::<DatabaseKind>().map_err(anyhow::Error::msg)?,
      None => database_url
        .as_deref()
        .and_then(DatabaseKind::from_url)
        .unwrap_or_default(),
    };

    Ok(Self {
      bind_address: env_var("BIND_ADDRESS").unwrap_or(defaults.bind_address),
      port: env_parse("PORT").unwrap_or(defaults.port),
      development: environment == "development",
      data_dir: env_var("DATA_DIR")
        .map(PathBuf::from)
        .unwrap_or(defaults.data_dir),
      database_kind,
      database_url,
      admin_username: env_var("ADMIN_USERNAME").unwrap_or(defaults.admin_username),
      admin_password: env_var("ADMIN_PASSWORD").unwrap_or(defaults.admin_password),
      admin_password_hash: env_var("ADMIN_PASSWORD_HASH"),
      session_ttl: match env_var("SESSION_TTL_HOURS") {
        Some(raw) => session_ttl_hours(&raw)?,
        None => defaults.session_ttl,
      },
      login_failure_delay: env_parse::<u64>("LOGIN_FAILURE_DELAY_MS")
        .map(Duration::from_millis)
        .unwrap_or(defaults.login_failure_delay),
      rate_limit_max_requests: env_parse("RATE_LIMIT_MAX_REQUESTS")
        .unwrap_or(defaults.rate_limit_max_requests),
      rate_limit_window: env_parse::<u64>("RATE_LIMIT_WINDOW_SECS")
        .map(Duration::from_secs)
        .unwrap_or(defaults.rate_limit_window),
      trust_proxy: env_flag("TRUST_PROXY").unwrap_or(defaults.trust_proxy),
      frontend_url: env_var("FRONTEND_URL"),
      cookie_secure: env_flag("COOKIE_SECURE").unwrap_or(defaults.cookie_secure),
      bcrypt_cost: env_parse("BCRYPT_COST").unwrap_or(defaults.bcrypt_cost),
      claude_api_key: env_var("CLAUDE_API_KEY"),
      openai_api_key: env_var("OPENAI_API_KEY"),
    })
  }

  /// Connection URL for the configured backend. SQLite defaults to a file in
  /// the data directory.
  pub fn resolved_database_url(&self) -> Option<String> {
    match self.database_kind {
      DatabaseKind::None => None,
      DatabaseKind::Sqlite => Some(self.database_url.clone().unwrap_or_else(|| {
        format!("sqlite://{}?mode=rwc", self.data_dir.join("testlab.db").display())
      })),
      DatabaseKind::MySql => self.database_url.clone(),
    }
  }
}

/// Parse a session lifetime in hours, rejecting values outside
/// `1..=MAX_SESSION_TTL_HOURS`
fn session_ttl_hours(raw: &str) -> anyhow::Result<chrono::Duration> {
  let hours: i64 = raw
    .trim()
    .parse()
    .map_err(|_| anyhow::anyhow!("SESSION_TTL_HOURS must be a whole number of hours, got '{}'", raw))?;
  if !(1..=MAX_SESSION_TTL_HOURS).contains(&hours) {
    anyhow::bail!(
      "SESSION_TTL_HOURS must be between 1 and {}, got {}",
      MAX_SESSION_TTL_HOURS,
      hours
    );
  }
  chrono::Duration::try_hours(hours)
    .ok_or_else(|| anyhow::anyhow!("SESSION_TTL_HOURS out of range: {}", hours))
}
