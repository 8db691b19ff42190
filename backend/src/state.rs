// Shared application state handed to every handler
use anyhow::{bail, Context};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::analyzers::AnalyzerRegistry;
use crate::auth::{
    AdminDirectory, Authenticator, LoginPolicy, MemorySessionStore, SessionStore, SqlSessionStore,
};
use crate::config::store::normalize_service;
use crate::config::{ConfigStore, DatabaseKind, Settings, SetupConfig};
use crate::crypto::{hash_password, is_placeholder_key};
use crate::db::Database;
use crate::rate_limit::SlidingWindowLimiter;
use crate::routing::RoutingService;

pub struct AppState {
    pub settings: Settings,
    pub config_store: ConfigStore,
    pub config: Arc<RwLock<SetupConfig>>,
    pub db: Option<Database>,
    pub sessions: Arc<dyn SessionStore>,
    pub authenticator: Authenticator,
    pub rate_limiter: Arc<SlidingWindowLimiter>,
    pub analyzers: RwLock<AnalyzerRegistry>,
    pub routing: RoutingService,
}

impl AppState {
    /// Load the setup config, connect the database (if any) and wire the
    /// services together
    pub async fn initialize(settings: Settings) -> anyhow::Result<Arc<Self>> {
        tokio::fs::create_dir_all(&settings.data_dir)
            .await
            .with_context(|| {
                format!("Failed to create data directory {}", settings.data_dir.display())
            })?;

        let config_store = ConfigStore::new(&settings.data_dir);
        let setup = config_store
            .load()
            .await
            .context("Failed to load setup configuration")?;

        let db = match database_target(&settings, &setup)? {
            Some((kind, url)) => {
                let db = Database::connect(kind, &url).await?;
                db.init_schema().await?;
                db.log_pool_metrics();
                Some(db)
            }
            None => {
                tracing::info!("No database configured, keeping sessions in memory");
                None
            }
        };

        let config = Arc::new(RwLock::new(setup));

        let sessions: Arc<dyn SessionStore> = match &db {
            Some(db) => Arc::new(SqlSessionStore::new(db.clone(), settings.session_ttl)),
            None => Arc::new(MemorySessionStore::new(settings.session_ttl)),
        };

        let bootstrap_hash = match &settings.admin_password_hash {
            Some(hash) => hash.clone(),
            None => hash_password(&settings.admin_password, settings.bcrypt_cost)?,
        };
        let directory = AdminDirectory::new(
            config.clone(),
            db.clone(),
            settings.admin_username.clone(),
            bootstrap_hash,
        );
        let authenticator = Authenticator::new(
            LoginPolicy {
                failure_delay: settings.login_failure_delay,
            },
            sessions.clone(),
            Arc::new(directory),
        );

        let rate_limiter = Arc::new(
            SlidingWindowLimiter::new(settings.rate_limit_max_requests, settings.rate_limit_window)
                .trusting_proxy(settings.trust_proxy),
        );
        let routing = RoutingService::load(&settings.data_dir).await?;

        let state = Arc::new(Self {
            settings,
            config_store,
            config,
            db,
            sessions,
            authenticator,
            rate_limiter,
            analyzers: RwLock::new(AnalyzerRegistry::builtin()),
            routing,
        });
        state.refresh_analyzers().await;

        Ok(state)
    }

    /// AI keys by normalized service name. Environment keys are the base;
    /// keys stored through setup or the admin panel override them.
    /// Placeholder values are dropped.
    pub async fn effective_api_keys(&self) -> BTreeMap<String, String> {
        let mut keys = BTreeMap::new();

        if let Some(key) = &self.settings.claude_api_key {
            keys.insert("claude".to_string(), key.clone());
        }
        if let Some(key) = &self.settings.openai_api_key {
            keys.insert("chatgpt".to_string(), key.clone());
        }

        if let Some(db) = &self.db {
            match db.list_active_api_keys().await {
                Ok(rows) => {
                    for row in rows {
                        keys.insert(normalize_service(&row.service), row.api_key);
                    }
                }
                Err(e) => tracing::error!("Failed to load API keys from database: {}", e),
            }
        }

        for (service, key) in &self.config.read().await.ai.services {
            if !key.api_key.is_empty() {
                keys.insert(service.clone(), key.api_key.clone());
            }
        }

        keys.retain(|_, key| !is_placeholder_key(key));
        keys
    }

    /// Rebuild the analyzer registry after keys or AI settings change
    pub async fn refresh_analyzers(&self) {
        let keys = self.effective_api_keys().await;
        let ai_settings = self.config.read().await.settings.clone();
        let registry = AnalyzerRegistry::with_ai_services(&keys, &ai_settings);

        tracing::info!(analyzers = ?registry.names(), "Analyzers available");
        *self.analyzers.write().await = registry;
    }
}

/// Which database to open: the environment wins, then the database chosen
/// during setup
pub fn database_target(
    settings: &Settings,
    setup: &SetupConfig,
) -> anyhow::Result<Option<(DatabaseKind, String)>> {
    if settings.database_kind != DatabaseKind::None {
        let Some(url) = settings.resolved_database_url() else {
            bail!(
                "DATABASE_URL is required for the {} backend",
                settings.database_kind.as_str()
            );
        };
        return Ok(Some((settings.database_kind, url)));
    }

    let kind = match setup.database.kind.parse::<DatabaseKind>() {
        Ok(kind) => kind,
        Err(e) => {
            tracing::warn!("Ignoring database in setup config: {}", e);
            return Ok(None);
        }
    };

    let url = match (kind, setup.database.url.clone()) {
        (DatabaseKind::None, _) => return Ok(None),
        (_, Some(url)) => url,
        (DatabaseKind::Sqlite, None) => format!(
            "sqlite://{}?mode=rwc",
            settings.data_dir.join("testlab.db").display()
        ),
        (DatabaseKind::MySql, None) => {
            tracing::warn!("Setup config selects MySQL without a URL, running without a database");
            return Ok(None);
        }
    };
    Ok(Some((kind, url)))
}
