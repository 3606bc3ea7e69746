//! # State Module
//!
//! Application state for the `preco` command line.
//!
//! ## Separate State Types (Option B)
//! Config and database are separate types. A command takes only what it
//! needs: `calc` runs on `ConfigState` alone and never opens the database.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    State Architecture                                   │
//! │                                                                         │
//! │  main()                                                                 │
//! │    │  ConfigState::from_env()                                           │
//! │    │  Database::new(DbConfig::new(path))   (only for db commands)       │
//! │    ▼                                                                    │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                        AppContext                               │   │
//! │  │   ┌──────────────────┐            ┌──────────────────────────┐  │   │
//! │  │   │   ConfigState    │            │        DbState           │  │   │
//! │  │   │  tax_policy      │            │  Database (SQLite pool)  │  │   │
//! │  │   │  currency_symbol │            │                          │  │   │
//! │  │   │  defaults        │            │                          │  │   │
//! │  │   └──────────────────┘            └──────────────────────────┘  │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │    │                                                                    │
//! │    ▼  passed by reference                                               │
//! │  commands::product::add(&ctx, ...)                                      │
//! │                                                                         │
//! │  • ConfigState: read-only after initialization                         │
//! │  • DbState: Database has internal connection pool (thread-safe)        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

mod config;
mod db;

pub use config::ConfigState;
pub use db::DbState;

use preco_db::{Database, DbConfig};
use std::path::Path;
use tracing::debug;

use crate::error::ApiError;

/// Everything a database-backed command needs.
#[derive(Debug)]
pub struct AppContext {
    pub config: ConfigState,
    pub db: DbState,
}

impl AppContext {
    pub fn new(config: ConfigState, db: Database) -> Self {
        AppContext {
            config,
            db: DbState::new(db),
        }
    }

    /// Opens (creating if needed) the database at `path` and runs migrations.
    pub async fn open(config: ConfigState, path: &Path) -> Result<Self, ApiError> {
        debug!(path = %path.display(), "Opening database");
        let db = Database::new(DbConfig::new(path)).await?;
        Ok(AppContext::new(config, db))
    }

    /// Context over a fresh in-memory database.
    pub async fn in_memory(config: ConfigState) -> Result<Self, ApiError> {
        let db = Database::new(DbConfig::in_memory()).await?;
        Ok(AppContext::new(config, db))
    }
}
