// Session persistence for the SQL-backed session store
use crate::db::{models::SessionRecord, Database};

impl Database {
    pub async fn create_session(
        &self,
        id: &str,
        user_id: &str,
        token: &str,
        expires_at: i64,
        created_at: i64,
    ) -> anyhow::Result<()> {
        sqlx::query(
            "INSERT INTO sessions (id, user_id, token, expires_at, created_at)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(id)
        .bind(user_id)
        .bind(token)
        .bind(expires_at)
        .bind(created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn get_session_by_token(&self, token: &str) -> anyhow::Result<Option<SessionRecord>> {
        let session = sqlx::query_as::<_, SessionRecord>(
            "SELECT id, user_id, token, expires_at, created_at
             FROM sessions
             WHERE token = ?",
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;
        Ok(session)
    }

    pub async fn delete_session_by_token(&self, token: &str) -> anyhow::Result<bool> {
        let result = sqlx::query("DELETE FROM sessions WHERE token = ?")
            .bind(token)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Delete sessions whose expiry is at or before `now`; returns the count
    pub async fn delete_expired_sessions(&self, now: i64) -> anyhow::Result<u64> {
        let result = sqlx::query("DELETE FROM sessions WHERE expires_at <= ?")
            .bind(now)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}
