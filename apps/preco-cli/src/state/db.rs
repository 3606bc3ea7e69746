//! # Database State
//!
//! Wraps the `Database` connection for use in commands.
//!
//! The `Database` from `preco-db` holds a `SqlitePool`, which is
//! thread-safe; commands only ever borrow it.

use preco_db::Database;

/// Wrapper around `Database` for the app context.
#[derive(Debug)]
pub struct DbState {
    db: Database,
}

impl DbState {
    /// Creates a new DbState wrapping the database connection.
    pub fn new(db: Database) -> Self {
        DbState { db }
    }

    /// Returns a reference to the inner Database.
    ///
    /// ## Usage
    /// ```rust,ignore
    /// let products = ctx.db.inner().products().search("cadeira").await?;
    /// ```
    pub fn inner(&self) -> &Database {
        &self.db
    }
}
