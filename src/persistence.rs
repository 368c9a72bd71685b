//! Database connection pooling
//!
//! All stores share one pool over a single SQLite file. Each store call
//! checks a connection out, does its work and hands the connection back,
//! so nothing holds a connection across operations. SQLite's own locking
//! serializes the writers.
use anyhow::{Context, Result};
use r2d2_sqlite::SqliteConnectionManager;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub type SqliteConnection = r2d2::PooledConnection<SqliteConnectionManager>;

/// How long a connection waits on a locked database before giving up
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Clone)]
pub struct SqlitePersistence {
    pool: r2d2::Pool<SqliteConnectionManager>,
    path: PathBuf,
}

impl SqlitePersistence {
    pub fn open(path: impl AsRef<Path>, pool_size: u32) -> Result<Self> {
        let path = path.as_ref().to_owned();
        let manager = SqliteConnectionManager::file(&path)
            .with_init(|conn| conn.busy_timeout(BUSY_TIMEOUT));

        let pool = r2d2::Pool::builder()
            .max_size(pool_size.max(1))
            .build(manager)
            .with_context(|| format!("Failed to open database at {}", path.display()))?;

        Ok(Self { pool, path })
    }

    pub fn get_connection(&self) -> Result<SqliteConnection> {
        Ok(self.pool.get()?)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
