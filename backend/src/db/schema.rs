// DDL for each supported backend. Timestamps are Unix seconds.
use crate::config::DatabaseKind;

const SQLITE: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS users (
        id TEXT PRIMARY KEY,
        username TEXT NOT NULL UNIQUE,
        password_hash TEXT NOT NULL,
        email TEXT,
        role TEXT NOT NULL DEFAULT 'admin',
        created_at BIGINT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS sessions (
        id TEXT PRIMARY KEY,
        user_id TEXT NOT NULL,
        token TEXT NOT NULL UNIQUE,
        expires_at BIGINT NOT NULL,
        created_at BIGINT NOT NULL
    )",
    "CREATE INDEX IF NOT EXISTS idx_sessions_expires_at ON sessions (expires_at)",
    "CREATE TABLE IF NOT EXISTS api_keys (
        id TEXT PRIMARY KEY,
        service TEXT NOT NULL,
        api_key TEXT NOT NULL,
        is_active BIGINT NOT NULL DEFAULT 1,
        created_at BIGINT NOT NULL
    )",
    "CREATE INDEX IF NOT EXISTS idx_api_keys_service ON api_keys (service)",
    "CREATE TABLE IF NOT EXISTS analysis_history (
        id TEXT PRIMARY KEY,
        user_id TEXT,
        code_hash TEXT NOT NULL,
        analysis_type TEXT NOT NULL,
        analyzer TEXT NOT NULL,
        result TEXT NOT NULL,
        created_at BIGINT NOT NULL
    )",
    "CREATE INDEX IF NOT EXISTS idx_history_user ON analysis_history (user_id, created_at)",
];

// MySQL has no CREATE INDEX IF NOT EXISTS, so indexes are declared inline
const MYSQL: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS users (
        id VARCHAR(64) PRIMARY KEY,
        username VARCHAR(255) NOT NULL UNIQUE,
        password_hash VARCHAR(255) NOT NULL,
        email VARCHAR(255),
        role VARCHAR(32) NOT NULL DEFAULT 'admin',
        created_at BIGINT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS sessions (
        id VARCHAR(64) PRIMARY KEY,
        user_id VARCHAR(64) NOT NULL,
        token VARCHAR(128) NOT NULL UNIQUE,
        expires_at BIGINT NOT NULL,
        created_at BIGINT NOT NULL,
        INDEX idx_sessions_expires_at (expires_at)
    )",
    "CREATE TABLE IF NOT EXISTS api_keys (
        id VARCHAR(64) PRIMARY KEY,
        service VARCHAR(64) NOT NULL,
        api_key TEXT NOT NULL,
        is_active BIGINT NOT NULL DEFAULT 1,
        created_at BIGINT NOT NULL,
        INDEX idx_api_keys_service (service)
    )",
    "CREATE TABLE IF NOT EXISTS analysis_history (
        id VARCHAR(64) PRIMARY KEY,
        user_id VARCHAR(64),
        code_hash VARCHAR(64) NOT NULL,
        analysis_type VARCHAR(255) NOT NULL,
        analyzer VARCHAR(64) NOT NULL,
        result LONGTEXT NOT NULL,
        created_at BIGINT NOT NULL,
        INDEX idx_history_user (user_id, created_at)
    )",
];

pub fn statements(kind: DatabaseKind) -> &'static [&'static str] {
    match kind {
        DatabaseKind::MySql => MYSQL,
        DatabaseKind::Sqlite | DatabaseKind::None => SQLITE,
    }
}
