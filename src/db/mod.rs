//! Database module for SQLite persistence.
//!
//! `Database` is the connection manager: it opens one pool lazily, caches it
//! for the life of the process and runs the embedded migrations on first use.

mod repository;

pub use repository::*;

use sqlx::sqlite::{
    SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions, SqliteSynchronous,
};
use std::str::FromStr;
use std::time::Duration;
use tokio::sync::OnceCell;

use crate::errors::AppError;

/// Pool sizing and timeouts applied when the pool is first established.
#[derive(Debug, Clone, Copy)]
pub struct PoolSettings {
    pub max_connections: u32,
    /// How long a request may wait for a pooled connection
    pub acquire_timeout: Duration,
    /// How long a statement may wait on a locked database
    pub busy_timeout: Duration,
}

impl Default for PoolSettings {
    fn default() -> Self {
        Self {
            max_connections: 10,
            acquire_timeout: Duration::from_secs(5),
            busy_timeout: Duration::from_secs(45),
        }
    }
}

/// Lazily established, cached connection pool.
pub struct Database {
    url: String,
    settings: PoolSettings,
    pool: OnceCell<SqlitePool>,
}

impl Database {
    /// Record the connection settings. Nothing is opened until `connect`.
    pub fn new(url: impl Into<String>, settings: PoolSettings) -> Self {
        Self {
            url: url.into(),
            settings,
            pool: OnceCell::new(),
        }
    }

    /// Return the cached pool, establishing it on first use.
    ///
    /// A failed attempt leaves nothing cached, so the next call starts over.
    pub async fn connect(&self) -> Result<&SqlitePool, AppError> {
        self.pool.get_or_try_init(|| self.establish()).await
    }

    /// Whether a pool has been established and cached.
    #[allow(dead_code)]
    pub fn is_connected(&self) -> bool {
        self.pool.initialized()
    }

    async fn establish(&self) -> Result<SqlitePool, AppError> {
        tracing::info!("Connecting to database at {}", self.url);

        let options = SqliteConnectOptions::from_str(&self.url)?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .busy_timeout(self.settings.busy_timeout);

        // Ensure the parent directory exists
        let filename = options.get_filename();
        if filename.as_os_str() != ":memory:" {
            if let Some(parent) = filename.parent() {
                tokio::fs::create_dir_all(parent).await.ok();
            }
        }

        let pool = SqlitePoolOptions::new()
            .max_connections(self.settings.max_connections)
            .acquire_timeout(self.settings.acquire_timeout)
            .connect_with(options)
            .await?;

        run_migrations(&pool).await?;

        tracing::info!(
            "Database connected (max {} connections)",
            self.settings.max_connections
        );
        Ok(pool)
    }
}

/// Run database migrations.
async fn run_migrations(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS blog_posts (
            id TEXT PRIMARY KEY,
            title TEXT NOT NULL,
            content TEXT NOT NULL,
            category TEXT NOT NULL,
            image TEXT,
            author TEXT NOT NULL,
            likes INTEGER NOT NULL DEFAULT 0 CHECK (likes >= 0),
            comments TEXT NOT NULL DEFAULT '[]',
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS event_proposals (
            id TEXT PRIMARY KEY,
            proposal TEXT NOT NULL CHECK (length(trim(proposal)) > 0),
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS support_tickets (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            email TEXT NOT NULL,
            subject TEXT NOT NULL,
            message TEXT NOT NULL,
            status TEXT NOT NULL DEFAULT 'pending'
                CHECK (status IN ('pending', 'in-progress', 'resolved')),
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS podcast_subscribers (
            id TEXT PRIMARY KEY,
            email TEXT NOT NULL UNIQUE,
            is_active INTEGER NOT NULL DEFAULT 1,
            date_subscribed TEXT NOT NULL,
            date_unsubscribed TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS listings (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            description TEXT NOT NULL,
            image TEXT,
            category TEXT NOT NULL,
            price REAL NOT NULL DEFAULT 0 CHECK (price >= 0),
            hide_price INTEGER NOT NULL DEFAULT 0,
            condition TEXT NOT NULL DEFAULT 'good',
            seller_name TEXT NOT NULL,
            contact_email TEXT NOT NULL,
            contact_phone TEXT,
            status TEXT NOT NULL DEFAULT 'available'
                CHECK (status IN ('available', 'sold', 'reserved', 'unavailable')),
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );
        "#,
    )
    .execute(pool)
    .await?;

    // Create indexes for common queries
    sqlx::query(
        r#"
        CREATE INDEX IF NOT EXISTS idx_blog_posts_created_at ON blog_posts(created_at);
        CREATE INDEX IF NOT EXISTS idx_blog_posts_category ON blog_posts(category);
        CREATE INDEX IF NOT EXISTS idx_event_proposals_created_at ON event_proposals(created_at);
        CREATE INDEX IF NOT EXISTS idx_support_tickets_status ON support_tickets(status);
        CREATE INDEX IF NOT EXISTS idx_podcast_subscribers_active ON podcast_subscribers(is_active);
        CREATE INDEX IF NOT EXISTS idx_listings_category ON listings(category);
        CREATE INDEX IF NOT EXISTS idx_listings_status ON listings(status);
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sqlite_url(path: &std::path::Path) -> String {
        format!("sqlite:{}", path.display())
    }

    #[tokio::test]
    async fn test_connect_caches_pool() {
        let temp_dir = TempDir::new().unwrap();
        let db = Database::new(
            sqlite_url(&temp_dir.path().join("cache.sqlite")),
            PoolSettings::default(),
        );
        assert!(!db.is_connected());

        let first = db.connect().await.unwrap();
        let second = db.connect().await.unwrap();

        assert!(std::ptr::eq(first, second));
        assert!(db.is_connected());
    }

    #[tokio::test]
    async fn test_failed_connect_is_not_cached() {
        let temp_dir = TempDir::new().unwrap();
        // A regular file where the database directory should be
        let blocker = temp_dir.path().join("blocked");
        std::fs::write(&blocker, b"not a directory").unwrap();

        let db = Database::new(
            sqlite_url(&blocker.join("app.sqlite")),
            PoolSettings {
                acquire_timeout: Duration::from_secs(1),
                ..PoolSettings::default()
            },
        );

        assert!(db.connect().await.is_err());
        assert!(!db.is_connected());

        // Clear the obstacle; the next call retries from scratch
        std::fs::remove_file(&blocker).unwrap();
        assert!(db.connect().await.is_ok());
        assert!(db.is_connected());
    }

    #[tokio::test]
    async fn test_migrations_are_idempotent() {
        let temp_dir = TempDir::new().unwrap();
        let db = Database::new(
            sqlite_url(&temp_dir.path().join("migrate.sqlite")),
            PoolSettings::default(),
        );
        let pool = db.connect().await.unwrap();
        run_migrations(pool).await.unwrap();
    }
}
