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

//! PostgreSQL backend.

use crate::db::{Db, DbError, DbResult, Executor, TxExecutor};
use crate::env::{get_optional_var, get_required_var};
use async_trait::async_trait;
use derivative::Derivative;
use log::warn;
use sqlx::pool::PoolConnection;
use sqlx::postgres::{
    PgConnectOptions, PgConnection, PgDatabaseError, PgPool, PgPoolOptions, Postgres,
};
use sqlx::{Connection, Transaction};
use std::future::Future;
use std::time::Duration;

/// Number of times to retry acquiring a connection when `MAX_RETRIES` is not configured.
const DEFAULT_MAX_RETRIES: u16 = 60;

/// Upper bound for the delay between two connection attempts.
const MAX_RETRY_DELAY: Duration = Duration::from_secs(5);

/// Converts a `sqlx` error raised by PostgreSQL into a `DbError`.
pub fn map_sqlx_error(e: sqlx::Error) -> DbError {
    match e {
        sqlx::Error::ColumnDecode { source, .. } => DbError::DataIntegrityError(source.to_string()),
        sqlx::Error::Database(e) => match e.try_downcast_ref().map(PgDatabaseError::code) {
            Some("23503") => DbError::NotFound,
            Some("23505") => DbError::AlreadyExists,
            Some("53300") => DbError::Unavailable,
            Some(code) => DbError::BackendError(format!("pgsql error {}: {}", code, e)),
            None => DbError::BackendError(e.to_string()),
        },
        sqlx::Error::PoolTimedOut => DbError::Unavailable,
        sqlx::Error::RowNotFound => DbError::NotFound,
        e => DbError::BackendError(e.to_string()),
    }
}

/// Connection settings for a PostgreSQL server.
#[derive(Derivative)]
#[derivative(Debug, Default)]
#[cfg_attr(test, derivative(PartialEq))]
pub struct PostgresOptions {
    /// Server hostname.
    pub host: String,

    /// Server port.
    pub port: u16,

    /// Name of the database.
    pub database: String,

    /// Login name.
    pub username: String,

    /// Login password.
    #[derivative(Debug = "ignore")]
    pub password: String,

    /// Connections to keep open even when idle.
    pub min_connections: Option<u32>,

    /// Cap on the number of open connections.
    pub max_connections: Option<u32>,

    /// How many times to retry acquiring a connection while the server is unavailable.
    pub max_retries: u16,
}

impl PostgresOptions {
    /// Reads the options from `<prefix>_HOST`, `<prefix>_PORT`, `<prefix>_DATABASE`,
    /// `<prefix>_USERNAME` and `<prefix>_PASSWORD`, plus the optional `<prefix>_MIN_CONNECTIONS`,
    /// `<prefix>_MAX_CONNECTIONS` and `<prefix>_MAX_RETRIES`.
    pub fn from_env(prefix: &str) -> Result<PostgresOptions, String> {
        Ok(PostgresOptions {
            host: get_required_var::<String>(prefix, "HOST")?,
            port: get_required_var::<u16>(prefix, "PORT")?,
            database: get_required_var::<String>(prefix, "DATABASE")?,
            username: get_required_var::<String>(prefix, "USERNAME")?,
            password: get_required_var::<String>(prefix, "PASSWORD")?,
            min_connections: get_optional_var::<u32>(prefix, "MIN_CONNECTIONS")?,
            max_connections: get_optional_var::<u32>(prefix, "MAX_CONNECTIONS")?,
            max_retries: get_optional_var::<u16>(prefix, "MAX_RETRIES")?
                .unwrap_or(DEFAULT_MAX_RETRIES),
        })
    }
}

/// A PostgreSQL connection, either checked out of the pool or inside a transaction.
#[derive(Debug)]
pub enum PostgresExecutor {
    /// Queries run in autocommit mode.
    Pooled(PoolConnection<Postgres>),

    /// Queries run within an open transaction.
    InTx(Transaction<'static, Postgres>),
}

impl PostgresExecutor {
    /// Returns the connection to pass to `sqlx` queries.
    pub fn conn(&mut self) -> &mut PgConnection {
        match self {
            PostgresExecutor::Pooled(conn) => &mut **conn,
            PostgresExecutor::InTx(tx) => &mut **tx,
        }
    }

    /// Commits the open transaction.  Committing a pooled connection is a no-op.
    pub(super) async fn commit(self) -> DbResult<()> {
        match self {
            PostgresExecutor::Pooled(_) => Ok(()),
            PostgresExecutor::InTx(tx) => tx.commit().await.map_err(map_sqlx_error),
        }
    }
}

/// Runs `op` until it succeeds or fails with something other than unavailability, sleeping a
/// random and growing delay between attempts.
async fn with_retries<Op, OpFut, T>(op: Op, max_retries: u16) -> DbResult<T>
where
    Op: Fn() -> OpFut,
    OpFut: Future<Output = Result<T, sqlx::Error>>,
{
    let jitter = || Duration::from_millis(u64::from(rand::random::<u16>() % 1000));

    let mut delay = Duration::from_millis(100) + jitter();
    let mut retries_left = max_retries;
    loop {
        match op().await.map_err(map_sqlx_error) {
            Err(DbError::Unavailable) if retries_left > 0 => {
                retries_left -= 1;
                warn!(
                    "Database unavailable; retrying in {}ms ({} attempts left)",
                    delay.as_millis(),
                    retries_left
                );
                tokio::time::sleep(delay).await;
                delay = (delay + jitter()).min(MAX_RETRY_DELAY);
            }
            result => return result,
        }
    }
}

/// Connection pool to a PostgreSQL server.
pub struct PostgresDb {
    /// The pool.  Connections are established lazily.
    pool: PgPool,

    /// Retries to apply when acquiring connections.
    max_retries: u16,
}

impl Drop for PostgresDb {
    fn drop(&mut self) {
        if !self.pool.is_closed() {
            warn!("PostgreSQL pool dropped without calling close()");
        }
    }
}

impl PostgresDb {
    /// Configures a pool for `opts` without connecting to the server yet.
    pub fn connect(opts: PostgresOptions) -> DbResult<Self> {
        let connect_options = PgConnectOptions::new()
            .host(&opts.host)
            .port(opts.port)
            .database(&opts.database)
            .username(&opts.username)
            .password(&opts.password);

        let mut pool_options = PgPoolOptions::new().acquire_timeout(Duration::from_secs(2));
        if let Some(n) = opts.min_connections {
            pool_options = pool_options.min_connections(n);
        }
        if let Some(n) = opts.max_connections {
            pool_options = pool_options.max_connections(n);
        }

        let pool = pool_options.connect_lazy_with(connect_options);
        Ok(Self { pool, max_retries: opts.max_retries })
    }

    /// Checks out a connection from the pool.
    pub async fn typed_ex(&self) -> DbResult<PostgresExecutor> {
        let conn = with_retries(|| self.pool.acquire(), self.max_retries).await?;
        Ok(PostgresExecutor::Pooled(conn))
    }
}

#[async_trait]
impl Db for PostgresDb {
    async fn ex(&self) -> DbResult<Executor> {
        Ok(Executor::Postgres(self.typed_ex().await?))
    }

    async fn begin(&self) -> DbResult<TxExecutor> {
        let tx = with_retries(|| self.pool.begin(), self.max_retries).await?;
        Ok(TxExecutor(Executor::Postgres(PostgresExecutor::InTx(tx))))
    }

    async fn close(&self) {
        self.pool.close().await;
    }
}

/// Runs every statement in `schema`, which is split on semicolons after dropping `--` comments.
pub async fn run_schema(ex: &mut PostgresExecutor, schema: &str) -> DbResult<()> {
    let mut tx = ex.conn().begin().await.map_err(map_sqlx_error)?;
    for line_stmt in strip_comments(schema).split(';') {
        if !line_stmt.trim().is_empty() {
            sqlx::query(line_stmt).execute(&mut *tx).await.map_err(map_sqlx_error)?;
        }
    }
    tx.commit().await.map_err(map_sqlx_error)
}

/// Removes SQL line comments from `schema`.
fn strip_comments(schema: &str) -> String {
    schema
        .lines()
        .map(|line| match line.find("--") {
            Some(pos) => &line[..pos],
            None => line,
        })
        .collect::<Vec<&str>>()
        .join("\n")
}

/// Test utilities for the PostgreSQL backend.
#[cfg(any(feature = "testutils", test))]
pub mod testutils {
    use super::*;

    /// Connects to the database described by the `PGSQL_TEST_*` variables.
    ///
    /// The pool holds a single connection whose `search_path` points at `pg_temp`, so any tables
    /// created by a test vanish when the pool is closed.  Panics on errors.
    pub async fn setup() -> PostgresDb {
        let _can_fail = env_logger::builder().is_test(true).try_init();

        let mut opts = PostgresOptions::from_env("PGSQL_TEST").unwrap();
        opts.min_connections = Some(1);
        opts.max_connections = Some(1);
        let db = PostgresDb::connect(opts).unwrap();

        let mut ex = db.typed_ex().await.unwrap();
        sqlx::query("SET search_path TO pg_temp").execute(ex.conn()).await.unwrap();
        db
    }
}
