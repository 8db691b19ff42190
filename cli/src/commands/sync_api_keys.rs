use anyhow::{bail, Context, Result};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use testlab_backend::config::store::normalize_service;
use testlab_backend::config::DatabaseKind;
use testlab_backend::crypto::is_placeholder_key;
use testlab_backend::Database;

use crate::utils::{print_success, print_warning};

pub const OUTPUT_FILE: &str = "api_keys.json";

/// Services the AI router expects an entry for
pub const ROUTER_SERVICES: [&str; 5] = ["openai", "anthropic", "together", "cohere", "huggingface"];

pub async fn run(data_dir: &Path, database: Option<PathBuf>, output: Option<PathBuf>) -> Result<()> {
    let database = database.unwrap_or_else(|| data_dir.join("testlab.db"));
    let output = output.unwrap_or_else(|| data_dir.join(OUTPUT_FILE));

    if !database.exists() {
        if output.exists() {
            print_success(&format!("No database found, keeping existing {}", output.display()));
            return Ok(());
        }
        bail!("Could not find TestLab database at {}", database.display());
    }
    println!("Reading keys from {}", database.display());

    let found = read_database_keys(&database).await?;
    if found.is_empty() {
        print_warning("No API keys found in the database");
    } else {
        for service in found.keys() {
            println!("  found {} key", service);
        }
    }

    let existing = read_existing(&output).await;
    let merged = merge_keys(existing, &found);

    if let Some(parent) = output.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(&output, serde_json::to_string_pretty(&Value::Object(merged))?)
        .await
        .with_context(|| format!("Failed to write {}", output.display()))?;

    print_success(&format!(
        "Synced {} API key(s) to {}",
        found.len(),
        output.display()
    ));
    Ok(())
}

async fn read_database_keys(path: &Path) -> Result<BTreeMap<String, String>> {
    let url = format!("sqlite://{}?mode=ro", path.display());
    let db = Database::connect(DatabaseKind::Sqlite, &url).await?;
    let rows = db.list_active_api_keys().await;
    db.pool.close().await;

    Ok(rows?
        .into_iter()
        .filter(|row| !is_placeholder_key(&row.api_key))
        .map(|row| (router_name(&row.service), row.api_key))
        .collect())
}

async fn read_existing(path: &Path) -> Map<String, Value> {
    let raw = match tokio::fs::read_to_string(path).await {
        Ok(raw) => raw,
        Err(_) => return Map::new(),
    };
    match serde_json::from_str::<Value>(&raw) {
        Ok(Value::Object(map)) => map,
        Ok(_) | Err(_) => {
            print_warning(&format!("Ignoring unreadable {}", path.display()));
            Map::new()
        }
    }
}

/// Name the AI router uses for a stored service
pub fn router_name(service: &str) -> String {
    match normalize_service(service).as_str() {
        "claude" => "anthropic".to_string(),
        "chatgpt" => "openai".to_string(),
        other => other.to_string(),
    }
}

/// Overlay `found` on the existing file contents and add placeholders for
/// router services that still have no key
pub fn merge_keys(mut existing: Map<String, Value>, found: &BTreeMap<String, String>) -> Map<String, Value> {
    for (service, key) in found {
        existing.insert(service.clone(), Value::String(key.clone()));
    }
    for service in ROUTER_SERVICES {
        existing
            .entry(service.to_string())
            .or_insert_with(|| Value::String(format!("your-{}-api-key", service)));
    }
    existing
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_router_names() {
        assert_eq!(router_name("claude"), "anthropic");
        assert_eq!(router_name("CHATGPT"), "openai");
        assert_eq!(router_name("cohere"), "cohere");
    }

    #[test]
    fn test_new_keys_win_and_placeholders_fill_gaps() {
        let mut existing = Map::new();
        existing.insert("openai".to_string(), Value::String("sk-old".to_string()));
        existing.insert("custom".to_string(), Value::String("keep-me".to_string()));

        let mut found = BTreeMap::new();
        found.insert("openai".to_string(), "sk-new".to_string());

        let merged = merge_keys(existing, &found);
        assert_eq!(merged["openai"], "sk-new");
        assert_eq!(merged["custom"], "keep-me");
        assert_eq!(merged["anthropic"], "your-anthropic-api-key");
        assert_eq!(merged["huggingface"], "your-huggingface-api-key");
    }

    #[tokio::test]
    async fn test_sync_from_database() {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let db_path = dir.path().join("testlab.db");

        let db = Database::connect(
            DatabaseKind::Sqlite,
            &format!("sqlite://{}?mode=rwc", db_path.display()),
        )
        .await
        .expect("Failed to create database");
        db.init_schema().await.expect("Failed to create schema");
        db.upsert_api_key("claude", "sk-ant-live-1")
            .await
            .expect("Failed to store key");
        db.pool.close().await;

        run(dir.path(), None, None).await.expect("Failed to sync keys");

        let raw = std::fs::read_to_string(dir.path().join(OUTPUT_FILE)).expect("Failed to read output");
        let keys: Value = serde_json::from_str(&raw).expect("output should be JSON");
        assert_eq!(keys["anthropic"], "sk-ant-live-1");
        assert_eq!(keys["openai"], "your-openai-api-key");
    }

    #[tokio::test]
    async fn test_missing_database_is_an_error() {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        assert!(run(dir.path(), None, None).await.is_err());
    }
}
