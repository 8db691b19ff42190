// Admin user database operations
use crate::db::{models::User, Database};

impl Database {
    pub async fn create_user(
        &self,
        id: &str,
        username: &str,
        password_hash: &str,
        email: Option<&str>,
        role: &str,
    ) -> anyhow::Result<User> {
        let created_at = chrono::Utc::now().timestamp();
        sqlx::query(
            "INSERT INTO users (id, username, password_hash, email, role, created_at)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(id)
        .bind(username)
        .bind(password_hash)
        .bind(email)
        .bind(role)
        .bind(created_at)
        .execute(&self.pool)
        .await?;

        Ok(User {
            id: id.to_string(),
            username: username.to_string(),
            password_hash: password_hash.to_string(),
            email: email.map(str::to_string),
            role: role.to_string(),
            created_at,
        })
    }

    pub async fn get_user_by_username(&self, username: &str) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, username, password_hash, email, role, created_at
             FROM users
             WHERE username = ?",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    pub async fn get_user_by_id(&self, id: &str) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, username, password_hash, email, role, created_at
             FROM users
             WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    /// Returns false when no user with that name exists
    pub async fn update_password_hash(
        &self,
        username: &str,
        password_hash: &str,
    ) -> anyhow::Result<bool> {
        let result = sqlx::query("UPDATE users SET password_hash = ? WHERE username = ?")
            .bind(password_hash)
            .bind(username)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn count_users(&self) -> anyhow::Result<i64> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}
