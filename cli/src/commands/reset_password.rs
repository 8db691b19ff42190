use anyhow::{bail, Context, Result};
use std::path::Path;

use testlab_backend::config::{ConfigStore, DatabaseKind, Settings};
use testlab_backend::crypto::hash_password;
use testlab_backend::state::database_target;
use testlab_backend::Database;

use crate::utils::{print_success, print_warning};

const MIN_PASSWORD_LEN: usize = 6;

pub async fn run(data_dir: &Path, password: &str) -> Result<()> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        bail!("Password must be at least {} characters", MIN_PASSWORD_LEN);
    }

    let settings = Settings {
        data_dir: data_dir.to_path_buf(),
        ..Settings::from_env()?
    };

    let store = ConfigStore::new(data_dir);
    let mut config = store
        .read_config_file()
        .await
        .with_context(|| format!("Failed to read {}", store.config_path().display()))?;

    let hash = hash_password(password, settings.bcrypt_cost)?;

    // Logins check the users table before config.json, so the row must change
    // first or the old hash keeps working
    if let Some((kind, url)) = database_target(&settings, &config)? {
        let updated = update_database(kind, &url, &config.admin.username, &hash)
            .await
            .with_context(|| format!("Failed to update the {} database", kind.as_str()))?;
        if updated {
            print_success(&format!("Updated admin user in the {} database", kind.as_str()));
        } else {
            print_warning("Admin user not present in the database");
        }
    }

    config.admin.password_hash = hash;
    store.save(&config).await?;
    tracing::info!(path = %store.config_path().display(), "Admin password hash replaced");

    print_success("Password reset successfully");
    println!("  Config: {}", store.config_path().display());
    println!("  Log in as '{}' with the new password.", config.admin.username);
    Ok(())
}

async fn update_database(kind: DatabaseKind, url: &str, username: &str, hash: &str) -> Result<bool> {
    let db = Database::connect(kind, url).await?;
    let updated = async {
        db.init_schema().await?;
        db.update_password_hash(username, hash).await
    }
    .await;
    db.pool.close().await;
    updated
}
