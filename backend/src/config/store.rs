// Setup configuration persisted as JSON in the data directory
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
  #[error("Setup already complete")]
  AlreadyComplete,
  #[error("Configuration file not found at {0}")]
  Missing(PathBuf),
  #[error("Failed to access configuration: {0}")]
  Io(#[from] std::io::Error),
  #[error("Invalid configuration file: {0}")]
  Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatabaseSection {
  #[serde(rename = "type", default = "default_database_type")]
  pub kind: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub url: Option<String>,
}

fn default_database_type() -> String {
  "none".to_string()
}

impl Default for DatabaseSection {
  fn default() -> Self {
    Self {
      kind: default_database_type(),
      url: None,
    }
  }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminSection {
  #[serde(default)]
  pub username: String,
  #[serde(default)]
  pub password_hash: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub email: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceKey {
  #[serde(default)]
  pub api_key: String,
}

/// AI service keys, keyed by normalized service name (`claude`, `chatgpt`, ...)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AiSection {
  #[serde(flatten)]
  pub services: BTreeMap<String, ServiceKey>,
}

impl AiSection {
  pub fn key(&self, service: &str) -> Option<&str> {
    self
      .services
      .get(&normalize_service(service))
      .map(|s| s.api_key.as_str())
      .filter(|k| !k.trim().is_empty())
  }

  pub fn set_key(&mut self, service: &str, api_key: &str) {
    self.services.insert(
      normalize_service(service),
      ServiceKey {
        api_key: api_key.trim().to_string(),
      },
    );
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AiSettings {
  pub enable_claude: bool,
  pub enable_chatgpt: bool,
  pub max_tokens: u32,
  pub temperature: f32,
}

impl Default for AiSettings {
  fn default() -> Self {
    Self {
      enable_claude: true,
      enable_chatgpt: true,
      max_tokens: 2048,
      temperature: 0.7,
    }
  }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetupConfig {
  /// Derived from the marker file, never written to disk
  #[serde(skip)]
  pub is_setup: bool,
  #[serde(default)]
  pub database: DatabaseSection,
  #[serde(default)]
  pub admin: AdminSection,
  #[serde(default)]
  pub ai: AiSection,
  #[serde(default)]
  pub settings: AiSettings,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub setup_completed_at: Option<String>,
}

/// Map the many spellings of a service name onto one key.
///
/// `anthropic`, `claude` and `CLAUDE_API_KEY` all become `claude`; `openai`,
/// `chatgpt` and `OPENAI_API_KEY` become `chatgpt`.
pub fn normalize_service(service: &str) -> String {
  let lower = service.trim().to_lowercase();
  let base = lower.strip_suffix("_api_key").unwrap_or(&lower);
  match base {
    "anthropic" | "claude" => "claude".to_string(),
    "openai" | "chatgpt" | "gpt" => "chatgpt".to_string(),
    other => other.to_string(),
  }
}

/// Reads and writes `config.json` and the `.setup-complete` marker
#[derive(Debug, Clone)]
pub struct ConfigStore {
  dir: PathBuf,
}

impl ConfigStore {
  pub const CONFIG_FILE: &'static str = "config.json";
  pub const SETUP_MARKER: &'static str = ".setup-complete";

  pub fn new(dir: impl Into<PathBuf>) -> Self {
    Self { dir: dir.into() }
  }

  pub fn dir(&self) -> &Path {
    &self.dir
  }

  pub fn config_path(&self) -> PathBuf {
    self.dir.join(Self::CONFIG_FILE)
  }

  pub fn marker_path(&self) -> PathBuf {
    self.dir.join(Self::SETUP_MARKER)
  }

  pub async fn is_setup(&self) -> bool {
    tokio::fs::try_exists(self.marker_path())
      .await
      .unwrap_or(false)
  }

  /// Load the persisted config. Before setup this is the default config.
  pub async fn load(&self) -> Result<SetupConfig, ConfigError> {
    if !self.is_setup().await {
      return Ok(SetupConfig::default());
    }

    let mut config = self.read_config_file().await?;
    config.is_setup = true;
    Ok(config)
  }

  /// Read `config.json` regardless of the marker
  pub async fn read_config_file(&self) -> Result<SetupConfig, ConfigError> {
    let path = self.config_path();
    let raw = match tokio::fs::read_to_string(&path).await {
      Ok(raw) => raw,
      Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
        return Err(ConfigError::Missing(path));
      }
      Err(e) => return Err(e.into()),
    };
    Ok(serde_json::from_str(&raw)?)
  }

  /// Persist the config, replacing the file atomically
  pub async fn save(&self, config: &SetupConfig) -> Result<(), ConfigError> {
    tokio::fs::create_dir_all(&self.dir).await?;
    let body = serde_json::to_string_pretty(config)?;
    let tmp = self.dir.join(format!("{}.tmp", Self::CONFIG_FILE));
    tokio::fs::write(&tmp, body).await?;
    tokio::fs::rename(&tmp, self.config_path()).await?;
    Ok(())
  }

  /// First-run completion: claim the marker, then write the config.
  ///
  /// The marker is created exclusively, so a second completion fails with
  /// `AlreadyComplete` even when two requests race.
  pub async fn complete(&self, config: &SetupConfig) -> Result<(), ConfigError> {
    tokio::fs::create_dir_all(&self.dir).await?;

    let mut marker = match tokio::fs::OpenOptions::new()
      .write(true)
      .create_new(true)
      .open(self.marker_path())
      .await
    {
      Ok(file) => file,
      Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
        return Err(ConfigError::AlreadyComplete);
      }
      Err(e) => return Err(e.into()),
    };

    let completed_at = config
      .setup_completed_at
      .clone()
      .unwrap_or_else(|| chrono::Utc::now().to_rfc3339());
    marker.write_all(completed_at.as_bytes()).await?;
    marker.flush().await?;

    if let Err(e) = self.save(config).await {
      // Roll back so setup can be retried
      let _ = tokio::fs::remove_file(self.marker_path()).await;
      return Err(e);
    }

    Ok(())
  }
}
