//! User persistence
//!
//! Users live in one SQLite table. Emails are stored normalized and carry a
//! UNIQUE index, so the database has the last word on duplicates.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use networking::PublicUser;
use sqlx::{sqlite::SqliteRow, Row};
use storage::{MigrationDefinition, SqliteDatabase};

use crate::error::{Result, ServiceError};

/// A stored user, including the password hash
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRecord {
    /// UUID v4
    pub id: String,
    /// Display name
    pub name: String,
    /// Normalized email
    pub email: String,
    /// Phone, possibly empty
    pub phone: String,
    /// bcrypt hash
    pub password_hash: String,
    /// Registration time
    pub created_at: DateTime<Utc>,
}

impl UserRecord {
    /// The user without the password hash
    pub fn to_public(&self) -> PublicUser {
        PublicUser {
            id: self.id.clone(),
            name: self.name.clone(),
            email: self.email.clone(),
            phone: self.phone.clone(),
            created_at: self.created_at,
        }
    }

    fn from_row(row: &SqliteRow) -> Result<Self> {
        let decode = |e: sqlx::Error| ServiceError::CorruptRecord(e.to_string());
        Ok(Self {
            id: row.try_get("id").map_err(decode)?,
            name: row.try_get("name").map_err(decode)?,
            email: row.try_get("email").map_err(decode)?,
            phone: row.try_get("phone").map_err(decode)?,
            password_hash: row.try_get("password_hash").map_err(decode)?,
            created_at: row.try_get("created_at").map_err(decode)?,
        })
    }
}

/// Schema of the users table
pub fn migrations() -> Vec<MigrationDefinition> {
    vec![MigrationDefinition::new(
        1,
        "create users",
        "CREATE TABLE users (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            email TEXT NOT NULL UNIQUE,
            phone TEXT NOT NULL DEFAULT '',
            password_hash TEXT NOT NULL,
            created_at TEXT NOT NULL
        )",
    )]
}

/// Storage operations the handlers need
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert a new user; a taken email is [`ServiceError::DuplicateEmail`]
    async fn create(&self, user: &UserRecord) -> Result<()>;

    /// Find a user by normalized email
    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>>;

    /// Find a user by id
    async fn find_by_id(&self, id: &str) -> Result<Option<UserRecord>>;

    /// All users, oldest first
    async fn list(&self) -> Result<Vec<UserRecord>>;

    /// Overwrite the mutable fields of an existing user
    async fn update(&self, user: &UserRecord) -> Result<()>;

    /// Delete a user by id
    async fn delete(&self, id: &str) -> Result<()>;

    /// Whether the backing store answers
    async fn health_check(&self) -> Result<()>;
}

/// [`UserRepository`] over SQLite
#[derive(Clone)]
pub struct SqliteUserRepository {
    db: SqliteDatabase,
}

impl SqliteUserRepository {
    /// Wrap `db`, applying the users schema first
    pub async fn open(db: SqliteDatabase) -> Result<Self> {
        db.migrate(&migrations()).await?;
        Ok(Self { db })
    }
}

#[async_trait]
impl UserRepository for SqliteUserRepository {
    async fn create(&self, user: &UserRecord) -> Result<()> {
        sqlx::query(
            "INSERT INTO users (id, name, email, phone, password_hash, created_at)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&user.id)
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.phone)
        .bind(&user.password_hash)
        .bind(user.created_at)
        .execute(self.db.pool())
        .await?;

        tracing::debug!(user_id = %user.id, "user created");
        Ok(())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>> {
        let row = sqlx::query("SELECT * FROM users WHERE email = ?")
            .bind(email)
            .fetch_optional(self.db.pool())
            .await?;

        row.as_ref().map(UserRecord::from_row).transpose()
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<UserRecord>> {
        let row = sqlx::query("SELECT * FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(self.db.pool())
            .await?;

        row.as_ref().map(UserRecord::from_row).transpose()
    }

    async fn list(&self) -> Result<Vec<UserRecord>> {
        let rows = sqlx::query("SELECT * FROM users ORDER BY created_at, id")
            .fetch_all(self.db.pool())
            .await?;

        rows.iter().map(UserRecord::from_row).collect()
    }

    async fn update(&self, user: &UserRecord) -> Result<()> {
        let result = sqlx::query(
            "UPDATE users SET name = ?, email = ?, phone = ?, password_hash = ? WHERE id = ?",
        )
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.phone)
        .bind(&user.password_hash)
        .bind(&user.id)
        .execute(self.db.pool())
        .await?;

        if result.rows_affected() == 0 {
            return Err(ServiceError::NotFound);
        }
        tracing::debug!(user_id = %user.id, "user updated");
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<()> {
        let result = sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(id)
            .execute(self.db.pool())
            .await?;

        if result.rows_affected() == 0 {
            return Err(ServiceError::NotFound);
        }
        tracing::debug!(user_id = id, "user deleted");
        Ok(())
    }

    async fn health_check(&self) -> Result<()> {
        self.db.health_check().await?;
        Ok(())
    }
}
