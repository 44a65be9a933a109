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

//! SQLite backend, used by tests and local runs.

use crate::db::{Db, DbError, DbResult, Executor, TxExecutor};
use async_trait::async_trait;
use log::warn;
use sqlx::pool::PoolConnection;
use sqlx::sqlite::{Sqlite, SqliteConnection, SqlitePool};
use sqlx::{Connection, Transaction};

/// Converts a `sqlx` error raised by SQLite into a `DbError`.
pub fn map_sqlx_error(e: sqlx::Error) -> DbError {
    match e {
        sqlx::Error::ColumnDecode { source, .. } => DbError::DataIntegrityError(source.to_string()),
        sqlx::Error::RowNotFound => DbError::NotFound,
        sqlx::Error::Database(e) if e.is_foreign_key_violation() => DbError::NotFound,
        sqlx::Error::Database(e) if e.is_unique_violation() => DbError::AlreadyExists,
        e => DbError::BackendError(e.to_string()),
    }
}

/// Opens a pool against the database at `conn_str`.
///
/// With `:memory:`, all connections in the pool share one private in-memory database.
pub async fn connect(conn_str: &str) -> DbResult<SqliteDb> {
    let pool = SqlitePool::connect(conn_str).await.map_err(map_sqlx_error)?;
    Ok(SqliteDb { pool })
}

/// An SQLite connection, either checked out of the pool or inside a transaction.
#[derive(Debug)]
pub enum SqliteExecutor {
    /// Queries run in autocommit mode.
    Pooled(PoolConnection<Sqlite>),

    /// Queries run within an open transaction.
    InTx(Transaction<'static, Sqlite>),
}

impl SqliteExecutor {
    /// Returns the connection to pass to `sqlx` queries.
    pub fn conn(&mut self) -> &mut SqliteConnection {
        match self {
            SqliteExecutor::Pooled(conn) => &mut **conn,
            SqliteExecutor::InTx(tx) => &mut **tx,
        }
    }

    /// Commits the open transaction.  Committing a pooled connection is a no-op.
    pub(super) async fn commit(self) -> DbResult<()> {
        match self {
            SqliteExecutor::Pooled(_) => Ok(()),
            SqliteExecutor::InTx(tx) => tx.commit().await.map_err(map_sqlx_error),
        }
    }
}

/// Connection pool to an SQLite database.
pub struct SqliteDb {
    /// The pool.
    pool: SqlitePool,
}

impl SqliteDb {
    /// Checks out a connection from the pool.
    pub async fn typed_ex(&self) -> DbResult<SqliteExecutor> {
        let conn = self.pool.acquire().await.map_err(map_sqlx_error)?;
        Ok(SqliteExecutor::Pooled(conn))
    }
}

impl Drop for SqliteDb {
    fn drop(&mut self) {
        if !self.pool.is_closed() {
            warn!("SQLite pool dropped without calling close()");
        }
    }
}

#[async_trait]
impl Db for SqliteDb {
    async fn ex(&self) -> DbResult<Executor> {
        Ok(Executor::Sqlite(self.typed_ex().await?))
    }

    async fn begin(&self) -> DbResult<TxExecutor> {
        let tx = self.pool.begin().await.map_err(map_sqlx_error)?;
        Ok(TxExecutor(Executor::Sqlite(SqliteExecutor::InTx(tx))))
    }

    async fn close(&self) {
        self.pool.close().await;
    }
}

/// Runs every statement in `schema`, which is split on semicolons.
pub async fn run_schema(ex: &mut SqliteExecutor, schema: &str) -> DbResult<()> {
    let mut tx = ex.conn().begin().await.map_err(map_sqlx_error)?;
    for stmt in schema.split(';').filter(|stmt| !stmt.trim().is_empty()) {
        sqlx::query(stmt).execute(&mut *tx).await.map_err(map_sqlx_error)?;
    }
    tx.commit().await.map_err(map_sqlx_error)
}

/// Test utilities for the SQLite backend.
#[cfg(any(feature = "testutils", test))]
pub mod testutils {
    use super::*;

    /// Creates a fresh in-memory database.  Panics on errors.
    pub async fn setup() -> SqliteDb {
        let _can_fail = env_logger::builder().is_test(true).try_init();
        connect(":memory:").await.unwrap()
    }
}
