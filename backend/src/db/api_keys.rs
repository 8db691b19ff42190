// Third-party API key storage
use uuid::Uuid;

use crate::db::{models::ApiKey, Database};

impl Database {
    pub async fn list_active_api_keys(&self) -> anyhow::Result<Vec<ApiKey>> {
        let keys = sqlx::query_as::<_, ApiKey>(
            "SELECT id, service, api_key, is_active, created_at
             FROM api_keys
             WHERE is_active = 1
             ORDER BY created_at DESC",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(keys)
    }

    /// Store a new active key for `service`, deactivating any previous one
    pub async fn upsert_api_key(&self, service: &str, api_key: &str) -> anyhow::Result<ApiKey> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("UPDATE api_keys SET is_active = 0 WHERE service = ? AND is_active = 1")
            .bind(service)
            .execute(&mut *tx)
            .await?;

        let key = ApiKey {
            id: Uuid::new_v4().to_string(),
            service: service.to_string(),
            api_key: api_key.to_string(),
            is_active: 1,
            created_at: chrono::Utc::now().timestamp(),
        };

        sqlx::query(
            "INSERT INTO api_keys (id, service, api_key, is_active, created_at)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&key.id)
        .bind(&key.service)
        .bind(&key.api_key)
        .bind(key.is_active)
        .bind(key.created_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(key)
    }
}
