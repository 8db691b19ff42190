// Analysis history records
use uuid::Uuid;

use crate::db::{models::AnalysisHistory, Database};

impl Database {
    pub async fn insert_history(
        &self,
        user_id: Option<&str>,
        code_hash: &str,
        analysis_type: &str,
        analyzer: &str,
        result: &str,
    ) -> anyhow::Result<AnalysisHistory> {
        let entry = AnalysisHistory {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.map(str::to_string),
            code_hash: code_hash.to_string(),
            analysis_type: analysis_type.to_string(),
            analyzer: analyzer.to_string(),
            result: result.to_string(),
            created_at: chrono::Utc::now().timestamp(),
        };

        sqlx::query(
            "INSERT INTO analysis_history (id, user_id, code_hash, analysis_type, analyzer, result, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&entry.id)
        .bind(entry.user_id.as_deref())
        .bind(&entry.code_hash)
        .bind(&entry.analysis_type)
        .bind(&entry.analyzer)
        .bind(&entry.result)
        .bind(entry.created_at)
        .execute(&self.pool)
        .await?;

        Ok(entry)
    }

    /// Most recent entries first
    pub async fn list_history_for_user(
        &self,
        user_id: &str,
        limit: i64,
    ) -> anyhow::Result<Vec<AnalysisHistory>> {
        let rows = sqlx::query_as::<_, AnalysisHistory>(
            "SELECT id, user_id, code_hash, analysis_type, analyzer, result, created_at
             FROM analysis_history
             WHERE user_id = ?
             ORDER BY created_at DESC
             LIMIT ?",
        )
        .bind(user_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}
