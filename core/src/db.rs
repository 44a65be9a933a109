// III-IV
// Copyright 2023 Julio Merino
//
// Licensed under the Apache License, Version 2.0 (the "License"); you may not
// use this file except in compliance with the License.  You may obtain a copy
// of the License at:
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS, WITHOUT
// WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.  See the
// License for the specific language governing permissions and limitations
// under the License.

//! Database access shared by all services.
//!
//! Services talk to the database through the `Db` trait, which hands out `Executor`s bound to
//! either a pooled connection or an open transaction.  PostgreSQL is the production backend and
//! SQLite backs unit tests and local runs.  Query code destructures `Executor` and issues one
//! `sqlx` call per backend so that each query is written in that backend's dialect.

use crate::model::ModelError;
use async_trait::async_trait;

#[cfg(feature = "postgres")]
pub mod postgres;
#[cfg(feature = "sqlite")]
pub mod sqlite;

/// Errors raised by the database layer.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum DbError {
    /// An insertion collided with an existing entry.
    #[error("Already exists")]
    AlreadyExists,

    /// The backend failed in a way we do not classify.
    #[error("Database error: {0}")]
    BackendError(String),

    /// Stored data could not be turned back into a valid model object.
    #[error("Data integrity error: {0}")]
    DataIntegrityError(String),

    /// The requested entry is not in the database.
    #[error("Entity not found")]
    NotFound,

    /// The backend cannot take more work right now, e.g. because it ran out of connections.
    #[error("Unavailable")]
    Unavailable,
}

impl From<ModelError> for DbError {
    fn from(e: ModelError) -> Self {
        DbError::DataIntegrityError(e.to_string())
    }
}

/// Result type for this module.
pub type DbResult<T> = Result<T, DbError>;

/// Verifies that a write statement that should touch one row touched exactly `rows_affected == 1`.
pub fn ensure_one_upsert(rows_affected: u64) -> DbResult<()> {
    match rows_affected {
        1 => Ok(()),
        n => Err(DbError::BackendError(format!("Expected only one affected row but got {}", n))),
    }
}

/// Handle to run queries against whichever backend is configured.
pub enum Executor {
    /// Handle for PostgreSQL.  Use `conn()` to get something `sqlx` can run queries on.
    #[cfg(feature = "postgres")]
    Postgres(postgres::PostgresExecutor),

    /// Handle for SQLite.  Use `conn()` to get something `sqlx` can run queries on.
    #[cfg(feature = "sqlite")]
    Sqlite(sqlite::SqliteExecutor),
}

/// An `Executor` bound to an open transaction.
///
/// Dropping the transaction without calling `commit` rolls it back.
pub struct TxExecutor(Executor);

impl TxExecutor {
    /// Gives access to the executor of this transaction to issue queries.
    pub fn ex(&mut self) -> &mut Executor {
        &mut self.0
    }

    /// Commits all changes made within the transaction.
    pub async fn commit(self) -> DbResult<()> {
        match self.0 {
            #[cfg(feature = "postgres")]
            Executor::Postgres(ex) => ex.commit().await,

            #[cfg(feature = "sqlite")]
            Executor::Sqlite(ex) => ex.commit().await,
        }
    }
}

/// A database connection pool.
#[async_trait]
pub trait Db {
    /// Gets an executor backed by a connection from the pool.
    async fn ex(&self) -> DbResult<Executor>;

    /// Opens a new transaction.
    async fn begin(&self) -> DbResult<TxExecutor>;

    /// Closes the pool, waiting for checked out connections to come back.
    async fn close(&self);
}

/// Macros to run a single suite of database tests against every backend.
#[cfg(any(test, feature = "testutils"))]
pub mod testutils {
    pub use paste::paste;

    /// Generates one `#[tokio::test]` per `name` that calls `module::name(setup)`.
    ///
    /// `setup` is evaluated separately for every test and must yield the database to test
    /// against.  An optional leading attribute, such as `#[ignore]`, is attached to all tests.
    #[macro_export]
    macro_rules! generate_tests [
        ( #[$extra:meta], $setup:expr, $module:path $(, $name:ident)+ ) => {
            $(
                #[tokio::test]
                #[$extra]
                async fn $name() {
                    $crate::db::testutils::paste! { $module :: [< $name >]($setup).await; }
                }
            )+
        };

        ( $setup:expr, $module:path $(, $name:ident)+ ) => {
            $(
                #[tokio::test]
                async fn $name() {
                    $crate::db::testutils::paste! { $module :: [< $name >]($setup).await; }
                }
            )+
        };
    ];

    pub use generate_tests;
}
