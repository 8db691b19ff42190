use anyhow::{bail, Result};
use std::path::PathBuf;

use testlab_backend::config::ConfigStore;

/// Directories searched for `config.json`, most specific first
pub fn candidate_dirs(explicit: Option<PathBuf>) -> Vec<PathBuf> {
    if let Some(dir) = explicit {
        return vec![dir];
    }

    let mut dirs = Vec::new();
    if let Ok(mount) = std::env::var("RAILWAY_VOLUME_MOUNT_PATH") {
        if !mount.trim().is_empty() {
            dirs.push(PathBuf::from(mount));
        }
    }
    dirs.push(PathBuf::from("/data"));
    dirs.push(PathBuf::from("./data"));
    dirs
}

/// First candidate directory that already holds a config file
pub fn locate_data_dir(explicit: Option<PathBuf>) -> Result<PathBuf> {
    let candidates = candidate_dirs(explicit);
    if let Some(dir) = candidates
        .iter()
        .find(|dir| dir.join(ConfigStore::CONFIG_FILE).exists())
    {
        return Ok(dir.clone());
    }

    let searched: Vec<String> = candidates.iter().map(|d| d.display().to_string()).collect();
    bail!(
        "No {} found (searched {}). Complete setup first.",
        ConfigStore::CONFIG_FILE,
        searched.join(", ")
    )
}

/// Where to read and write data when no config file is required: the first
/// existing candidate, else `./data`
pub fn resolve_data_dir(explicit: Option<PathBuf>) -> PathBuf {
    candidate_dirs(explicit)
        .into_iter()
        .find(|dir| dir.is_dir())
        .unwrap_or_else(|| PathBuf::from("./data"))
}
