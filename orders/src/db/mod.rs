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

//! Database abstraction to persist orders.
//!
//! Orders are only ever modified through `update_order`, which performs a compare-and-swap on the
//! stored version so that concurrent writers cannot silently overwrite each other.

use crate::model::{Address, Order, OrderId, PaymentRef, Status, Version};
use futures::TryStreamExt;
#[cfg(feature = "postgres")]
use hypermedia_core::db::postgres;
#[cfg(any(feature = "sqlite", test))]
use hypermedia_core::db::sqlite;
use hypermedia_core::db::{DbError, DbResult, Executor, ensure_one_upsert};
use sqlx::Row;
#[cfg(feature = "postgres")]
use sqlx::postgres::PgRow;
#[cfg(any(feature = "sqlite", test))]
use sqlx::sqlite::SqliteRow;
use std::collections::BTreeSet;

#[cfg(test)]
mod tests;

/// Initializes the database schema.
pub async fn init_schema(ex: &mut Executor) -> DbResult<()> {
    match ex {
        #[cfg(feature = "postgres")]
        Executor::Postgres(ex) => postgres::run_schema(ex, include_str!("postgres.sql")).await,

        #[cfg(any(feature = "sqlite", test))]
        Executor::Sqlite(ex) => sqlite::run_schema(ex, include_str!("sqlite.sql")).await,

        #[allow(unused)]
        _ => unreachable!(),
    }
}

/// Reassembles an order from the raw values of its columns.
#[allow(clippy::too_many_arguments)]
fn build_order(
    id: String,
    status: String,
    street: String,
    city: String,
    zip: String,
    country: String,
    payment: Option<String>,
    version: i32,
) -> DbResult<Order> {
    let id = OrderId::new(id)?;
    let status = status.parse::<Status>()?;
    let address = Address::new(street, city, zip, country)?;
    let payment = match payment {
        Some(payment) => Some(PaymentRef::new(payment)?),
        None => None,
    };
    let version = Version::from_i32(version)?;
    Ok(Order::new(id, address).with_status(status).with_payment(payment).with_version(version))
}

#[cfg(feature = "postgres")]
impl TryFrom<PgRow> for Order {
    type Error = DbError;

    fn try_from(row: PgRow) -> DbResult<Self> {
        let id: String = row.try_get("id").map_err(postgres::map_sqlx_error)?;
        let status: String = row.try_get("status").map_err(postgres::map_sqlx_error)?;
        let street: String = row.try_get("street").map_err(postgres::map_sqlx_error)?;
        let city: String = row.try_get("city").map_err(postgres::map_sqlx_error)?;
        let zip: String = row.try_get("zip").map_err(postgres::map_sqlx_error)?;
        let country: String = row.try_get("country").map_err(postgres::map_sqlx_error)?;
        let payment: Option<String> = row.try_get("payment").map_err(postgres::map_sqlx_error)?;
        let version: i32 = row.try_get("version").map_err(postgres::map_sqlx_error)?;
        build_order(id, status, street, city, zip, country, payment, version)
    }
}

#[cfg(any(feature = "sqlite", test))]
impl TryFrom<SqliteRow> for Order {
    type Error = DbError;

    fn try_from(row: SqliteRow) -> DbResult<Self> {
        let id: String = row.try_get("id").map_err(sqlite::map_sqlx_error)?;
        let status: String = row.try_get("status").map_err(sqlite::map_sqlx_error)?;
        let street: String = row.try_get("street").map_err(sqlite::map_sqlx_error)?;
        let city: String = row.try_get("city").map_err(sqlite::map_sqlx_error)?;
        let zip: String = row.try_get("zip").map_err(sqlite::map_sqlx_error)?;
        let country: String = row.try_get("country").map_err(sqlite::map_sqlx_error)?;
        let payment: Option<String> = row.try_get("payment").map_err(sqlite::map_sqlx_error)?;
        let version: i32 = row.try_get("version").map_err(sqlite::map_sqlx_error)?;
        build_order(id, status, street, city, zip, country, payment, version)
    }
}

/// Stores a brand new `order`.  Fails with `AlreadyExists` if its identifier is taken.
pub async fn create_order(ex: &mut Executor, order: &Order) -> DbResult<()> {
    let address = order.shipping_address();
    let rows_affected = match ex {
        #[cfg(feature = "postgres")]
        Executor::Postgres(ex) => {
            let query_str = "
                INSERT INTO orders (id, status, street, city, zip, country, payment, version)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8)";
            let done = sqlx::query(query_str)
                .bind(order.id().as_str())
                .bind(order.status().as_str())
                .bind(address.street().as_str())
                .bind(address.city().as_str())
                .bind(address.zip().as_str())
                .bind(address.country().as_str())
                .bind(order.payment().map(PaymentRef::as_str))
                .bind(order.version().as_i32())
                .execute(ex.conn())
                .await
                .map_err(postgres::map_sqlx_error)?;
            done.rows_affected()
        }

        #[cfg(any(feature = "sqlite", test))]
        Executor::Sqlite(ex) => {
            let query_str = "
                INSERT INTO orders (id, status, street, city, zip, country, payment, version)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?)";
            let done = sqlx::query(query_str)
                .bind(order.id().as_str())
                .bind(order.status().as_str())
                .bind(address.street().as_str())
                .bind(address.city().as_str())
                .bind(address.zip().as_str())
                .bind(address.country().as_str())
                .bind(order.payment().map(PaymentRef::as_str))
                .bind(order.version().as_i32())
                .execute(ex.conn())
                .await
                .map_err(sqlite::map_sqlx_error)?;
            done.rows_affected()
        }

        #[allow(unused)]
        _ => unreachable!(),
    };
    ensure_one_upsert(rows_affected)
}

/// Gets the current contents of the order identified by `id`.
pub async fn get_order(ex: &mut Executor, id: &OrderId) -> DbResult<Order> {
    match ex {
        #[cfg(feature = "postgres")]
        Executor::Postgres(ex) => {
            let query_str = "SELECT * FROM orders WHERE id = $1";
            let raw_order = sqlx::query(query_str)
                .bind(id.as_str())
                .fetch_one(ex.conn())
                .await
                .map_err(postgres::map_sqlx_error)?;
            Order::try_from(raw_order)
        }

        #[cfg(any(feature = "sqlite", test))]
        Executor::Sqlite(ex) => {
            let query_str = "SELECT * FROM orders WHERE id = ?";
            let raw_order = sqlx::query(query_str)
                .bind(id.as_str())
                .fetch_one(ex.conn())
                .await
                .map_err(sqlite::map_sqlx_error)?;
            Order::try_from(raw_order)
        }

        #[allow(unused)]
        _ => unreachable!(),
    }
}

/// Gets the identifiers of all existing orders.
pub async fn get_order_ids(ex: &mut Executor) -> DbResult<BTreeSet<OrderId>> {
    let query_str = "SELECT id FROM orders ORDER BY id";
    let mut ids = BTreeSet::default();
    match ex {
        #[cfg(feature = "postgres")]
        Executor::Postgres(ex) => {
            let mut rows = sqlx::query(query_str).fetch(ex.conn());
            while let Some(row) = rows.try_next().await.map_err(postgres::map_sqlx_error)? {
                let id: String = row.try_get("id").map_err(postgres::map_sqlx_error)?;
                ids.insert(OrderId::new(id)?);
            }
        }

        #[cfg(any(feature = "sqlite", test))]
        Executor::Sqlite(ex) => {
            let mut rows = sqlx::query(query_str).fetch(ex.conn());
            while let Some(row) = rows.try_next().await.map_err(sqlite::map_sqlx_error)? {
                let id: String = row.try_get("id").map_err(sqlite::map_sqlx_error)?;
                ids.insert(OrderId::new(id)?);
            }
        }

        #[allow(unused)]
        _ => unreachable!(),
    }
    Ok(ids)
}

/// Replaces the stored contents of `order` if and only if its stored version is `expected`.
///
/// The version of `order` is written as is, so callers must have bumped it already.  Returns
/// false when the stored version differs from `expected`, and `NotFound` if the order is gone.
pub async fn update_order(ex: &mut Executor, order: &Order, expected: Version) -> DbResult<bool> {
    let address = order.shipping_address();
    let rows_affected = match ex {
        #[cfg(feature = "postgres")]
        Executor::Postgres(ex) => {
            let query_str = "
                UPDATE orders
                SET status = $1, street = $2, city = $3, zip = $4, country = $5, payment = $6,
                    version = $7
                WHERE id = $8 AND version = $9";
            let done = sqlx::query(query_str)
                .bind(order.status().as_str())
                .bind(address.street().as_str())
                .bind(address.city().as_str())
                .bind(address.zip().as_str())
                .bind(address.country().as_str())
                .bind(order.payment().map(PaymentRef::as_str))
                .bind(order.version().as_i32())
                .bind(order.id().as_str())
                .bind(expected.as_i32())
                .execute(ex.conn())
                .await
                .map_err(postgres::map_sqlx_error)?;
            done.rows_affected()
        }

        #[cfg(any(feature = "sqlite", test))]
        Executor::Sqlite(ex) => {
            let query_str = "
                UPDATE orders
                SET status = ?, street = ?, city = ?, zip = ?, country = ?, payment = ?,
                    version = ?
                WHERE id = ? AND version = ?";
            let done = sqlx::query(query_str)
                .bind(order.status().as_str())
                .bind(address.street().as_str())
                .bind(address.city().as_str())
                .bind(address.zip().as_str())
                .bind(address.country().as_str())
                .bind(order.payment().map(PaymentRef::as_str))
                .bind(order.version().as_i32())
                .bind(order.id().as_str())
                .bind(expected.as_i32())
                .execute(ex.conn())
                .await
                .map_err(sqlite::map_sqlx_error)?;
            done.rows_affected()
        }

        #[allow(unused)]
        _ => unreachable!(),
    };

    match rows_affected {
        1 => Ok(true),
        0 => {
            // Tell apart a lost race from a vanished order.
            get_order(ex, order.id()).await?;
            Ok(false)
        }
        n => Err(DbError::BackendError(format!("Expected only one affected row but got {}", n))),
    }
}
