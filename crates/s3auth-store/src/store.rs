//! The store handle and connection setup.

use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use std::str::FromStr;

use crate::error::StoreResult;
use crate::schema;

/// Relational store over tenants, users, access keys, and bucket grants.
///
/// Holds a pooled SQLite connection. Clone is cheap — the pool is
/// internally reference-counted.
#[derive(Debug, Clone)]
pub struct Store {
    pub(crate) pool: SqlitePool,
}

impl Store {
    /// Open (creating if absent) the SQLite database at `database_path` and
    /// establish the schema.
    ///
    /// # Errors
    ///
    /// Returns a [`crate::error::StoreError`] if the connection cannot be
    /// established or the schema cannot be created.
    pub async fn connect(database_path: &str) -> StoreResult<Self> {
        let options = SqliteConnectOptions::from_str(database_path)
            .or_else(|_| SqliteConnectOptions::from_str(&format!("sqlite://{database_path}")))
            .map_err(|e| crate::error::StoreError::StoreError(e.to_string()))?
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new().max_connections(16).connect_with(options).await?;

        schema::establish(&pool).await?;

        Ok(Self { pool })
    }

    /// Build a store around an already-open pool, establishing the schema.
    /// Used by tests to share an in-memory database across connections.
    ///
    /// # Errors
    ///
    /// Returns a [`crate::error::StoreError`] if the schema cannot be created.
    pub async fn from_pool(pool: SqlitePool) -> StoreResult<Self> {
        schema::establish(&pool).await?;
        Ok(Self { pool })
    }
}

#[cfg(test)]
pub(crate) async fn test_store() -> Store {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("in-memory sqlite connects");
    Store::from_pool(pool).await.expect("schema establishes")
}
