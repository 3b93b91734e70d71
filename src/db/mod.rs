mod from_row;
mod schema;
pub mod queries;

pub use schema::init_db;

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;

use crate::jwt::TokenKeys;
use crate::licensing::LicenseEngine;

pub type DbPool = Pool<SqliteConnectionManager>;

/// Application state shared by all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Main database pool (catalogue reads in handlers)
    pub db: DbPool,
    /// License lifecycle engine, constructed once at startup
    pub engine: LicenseEngine,
    /// Bearer token keys used by the auth middleware
    pub tokens: TokenKeys,
}

impl AppState {
    pub fn new(db: DbPool, tokens: TokenKeys) -> Self {
        Self {
            engine: LicenseEngine::new(db.clone()),
            db,
            tokens,
        }
    }
}

fn manager(manager: SqliteConnectionManager) -> SqliteConnectionManager {
    manager.with_init(|conn| conn.execute_batch("PRAGMA foreign_keys = ON;"))
}

pub fn create_pool(database_path: &str, max_size: u32) -> Result<DbPool, r2d2::Error> {
    let manager = manager(SqliteConnectionManager::file(database_path));
    Pool::builder().max_size(max_size).build(manager)
}

/// Single-connection in-memory pool. Every pooled in-memory connection is a
/// separate database, so the size is pinned to one.
pub fn create_memory_pool() -> Result<DbPool, r2d2::Error> {
    let manager = manager(SqliteConnectionManager::memory());
    Pool::builder().max_size(1).build(manager)
}
