//! SQLite access for server-side documents
//!
//! This module wraps an sqlx SQLite pool with versioned, checksummed
//! migrations. The account service keeps its user documents here.

use sqlx::{
    sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions},
    Error as SqlxError, SqlitePool,
};
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

/// Database error types
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// SQLx error
    #[error("Database error: {0}")]
    Sqlx(#[from] SqlxError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// A previously applied migration no longer matches its definition
    #[error("Migration {version} checksum mismatch")]
    ChecksumMismatch {
        /// Migration version
        version: i64,
    },
}

/// Result type for database operations
pub type Result<T> = std::result::Result<T, DatabaseError>;

/// Database configuration
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// Connection string, e.g. `sqlite://sapa_umkm.db`
    pub url: String,
    /// Maximum number of connections in pool
    pub max_connections: u32,
    /// Connection timeout
    pub connect_timeout: Duration,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://sapa_umkm.db".to_string(),
            max_connections: 5,
            connect_timeout: Duration::from_secs(30),
        }
    }
}

impl DatabaseConfig {
    /// Create a new database configuration
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into(), ..Default::default() }
    }

    /// Set maximum connections
    pub fn max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }

    /// Set connection timeout
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }
}

/// Migration definition
#[derive(Debug, Clone)]
pub struct MigrationDefinition {
    /// Migration version number
    pub version: i64,
    /// Migration description
    pub description: String,
    /// SQL to execute
    pub sql: String,
    /// md5 of the SQL text
    pub checksum: String,
}

impl MigrationDefinition {
    /// Create a new migration definition
    pub fn new(version: i64, description: impl Into<String>, sql: impl Into<String>) -> Self {
        let sql = sql.into();
        let checksum = format!("{:x}", md5::compute(&sql));

        Self { version, description: description.into(), sql, checksum }
    }
}

/// SQLite database handle
#[derive(Clone)]
pub struct SqliteDatabase {
    pool: SqlitePool,
}

impl SqliteDatabase {
    /// Open (creating if missing) the database described by `config`
    pub async fn connect(config: DatabaseConfig) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(&config.url)
            .map_err(|e| DatabaseError::Config(e.to_string()))?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal);

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(config.connect_timeout)
            .connect_with(options)
            .await?;

        tracing::info!(url = %config.url, "connected to database");
        Ok(Self { pool })
    }

    /// Create an in-memory database (for testing)
    pub async fn in_memory() -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await?;

        Ok(Self { pool })
    }

    /// Get the underlying pool
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Apply every migration newer than the current version
    pub async fn migrate(&self, migrations: &[MigrationDefinition]) -> Result<()> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS _migrations (
                version INTEGER PRIMARY KEY,
                description TEXT NOT NULL,
                installed_on TIMESTAMP DEFAULT CURRENT_TIMESTAMP,
                checksum TEXT NOT NULL
            )",
        )
        .execute(&self.pool)
        .await?;

        let current_version = self.current_version().await?;

        for migration in migrations {
            if migration.version <= current_version {
                let recorded: Option<String> =
                    sqlx::query_scalar("SELECT checksum FROM _migrations WHERE version = ?")
                        .bind(migration.version)
                        .fetch_optional(&self.pool)
                        .await?;
                if recorded.is_some_and(|checksum| checksum != migration.checksum) {
                    return Err(DatabaseError::ChecksumMismatch { version: migration.version });
                }
                continue;
            }

            tracing::info!(
                "Applying migration {} - {}",
                migration.version,
                migration.description
            );

            let mut tx = self.pool.begin().await?;
            sqlx::query(&migration.sql).execute(&mut *tx).await?;
            sqlx::query("INSERT INTO _migrations (version, description, checksum) VALUES (?, ?, ?)")
                .bind(migration.version)
                .bind(&migration.description)
                .bind(&migration.checksum)
                .execute(&mut *tx)
                .await?;
            tx.commit().await?;
        }

        Ok(())
    }

    /// Get current migration version
    pub async fn current_version(&self) -> Result<i64> {
        let version: Option<i64> = sqlx::query_scalar("SELECT MAX(version) FROM _migrations")
            .fetch_one(&self.pool)
            .await?;

        Ok(version.unwrap_or(0))
    }

    /// Check if the database answers queries
    pub async fn health_check(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn notes_migration() -> MigrationDefinition {
        MigrationDefinition::new(
            1,
            "create notes",
            "CREATE TABLE notes (id TEXT PRIMARY KEY, body TEXT NOT NULL)",
        )
    }

    #[tokio::test]
    async fn test_in_memory_health() {
        let db = SqliteDatabase::in_memory().await.unwrap();
        assert!(db.health_check().await.is_ok());
    }

    #[tokio::test]
    async fn test_migrations_apply_once() {
        let db = SqliteDatabase::in_memory().await.unwrap();

        db.migrate(&[notes_migration()]).await.unwrap();
        assert_eq!(db.current_version().await.unwrap(), 1);

        // Re-running is a no-op
        db.migrate(&[notes_migration()]).await.unwrap();
        assert_eq!(db.current_version().await.unwrap(), 1);

        sqlx::query("INSERT INTO notes (id, body) VALUES ('a', 'halo')")
            .execute(db.pool())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_edited_migration_is_detected() {
        let db = SqliteDatabase::in_memory().await.unwrap();
        db.migrate(&[notes_migration()]).await.unwrap();

        let edited = MigrationDefinition::new(
            1,
            "create notes",
            "CREATE TABLE notes (id TEXT PRIMARY KEY)",
        );
        let result = db.migrate(&[edited]).await;
        assert!(matches!(result, Err(DatabaseError::ChecksumMismatch { version: 1 })));
    }

    #[test]
    fn test_migration_checksum_is_md5_of_sql() {
        let migration = MigrationDefinition::new(2, "noop", "SELECT 1");
        assert_eq!(migration.checksum, format!("{:x}", md5::compute("SELECT 1")));
    }

    #[test]
    fn test_config_builder() {
        let config = DatabaseConfig::new("sqlite://test.db")
            .max_connections(2)
            .connect_timeout(Duration::from_secs(5));

        assert_eq!(config.url, "sqlite://test.db");
        assert_eq!(config.max_connections, 2);
        assert_eq!(config.connect_timeout, Duration::from_secs(5));
    }
}
