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

//! Common tests for any database implementation.

use crate::db::*;
use crate::model::Action;
use hypermedia_core::db::Db;
use std::sync::Arc;

/// Initializes the schema of `db` and returns it back for chaining.
async fn setup_schema(db: Arc<dyn Db + Send + Sync>) -> Arc<dyn Db + Send + Sync> {
    init_schema(&mut db.ex().await.unwrap()).await.unwrap();
    db
}

/// Syntactic sugar to build a new order given only its identifier.
fn simple_order(id: &'static str) -> Order {
    Order::new(
        OrderId::new(id).unwrap(),
        Address::new("1 Main St", "Springfield", "12345", "US").unwrap(),
    )
}

/// Runs a raw `query` on `ex` to tamper with the stored data.
async fn exec(ex: &mut Executor, query: &str) {
    match ex {
        #[cfg(feature = "postgres")]
        Executor::Postgres(ex) => {
            let _result = sqlx::query(query).execute(ex.conn()).await.unwrap();
        }

        Executor::Sqlite(ex) => {
            let _result = sqlx::query(query).execute(ex.conn()).await.unwrap();
        }
    }
}

pub(crate) async fn test_create_and_get(db: Arc<dyn Db + Send + Sync>) {
    let db = setup_schema(db).await;
    let mut ex = db.ex().await.unwrap();

    let order = simple_order("first").with_payment(Some(PaymentRef::new("card-1").unwrap()));
    create_order(&mut ex, &order).await.unwrap();
    assert_eq!(order, get_order(&mut ex, order.id()).await.unwrap());

    let order = simple_order("second");
    create_order(&mut ex, &order).await.unwrap();
    assert_eq!(order, get_order(&mut ex, order.id()).await.unwrap());

    drop(ex);
    db.close().await;
}

pub(crate) async fn test_create_already_exists(db: Arc<dyn Db + Send + Sync>) {
    let db = setup_schema(db).await;
    let mut ex = db.ex().await.unwrap();

    create_order(&mut ex, &simple_order("dup")).await.unwrap();
    let other = simple_order("dup").with_status(Status::Payed);
    assert_eq!(DbError::AlreadyExists, create_order(&mut ex, &other).await.unwrap_err());
    assert_eq!(Status::Received, get_order(&mut ex, other.id()).await.unwrap().status());

    drop(ex);
    db.close().await;
}

pub(crate) async fn test_get_not_found(db: Arc<dyn Db + Send + Sync>) {
    let db = setup_schema(db).await;
    let mut ex = db.ex().await.unwrap();

    create_order(&mut ex, &simple_order("exists")).await.unwrap();
    assert_eq!(
        DbError::NotFound,
        get_order(&mut ex, &OrderId::new("missing").unwrap()).await.unwrap_err()
    );

    drop(ex);
    db.close().await;
}

pub(crate) async fn test_get_order_ids(db: Arc<dyn Db + Send + Sync>) {
    let db = setup_schema(db).await;
    let mut ex = db.ex().await.unwrap();

    assert!(get_order_ids(&mut ex).await.unwrap().is_empty());

    for id in ["c", "a", "b"] {
        create_order(&mut ex, &simple_order(id)).await.unwrap();
    }
    let ids = get_order_ids(&mut ex).await.unwrap();
    assert_eq!(
        vec!["a", "b", "c"],
        ids.iter().map(OrderId::as_str).collect::<Vec<&str>>()
    );

    drop(ex);
    db.close().await;
}

pub(crate) async fn test_get_order_ids_corrupted(db: Arc<dyn Db + Send + Sync>) {
    let db = setup_schema(db).await;
    let mut ex = db.ex().await.unwrap();

    exec(
        &mut ex,
        "INSERT INTO orders (id, status, street, city, zip, country, payment, version)
        VALUES ('bad id', 'RECEIVED', 's', 'c', 'z', 'c', NULL, 1)",
    )
    .await;
    match get_order_ids(&mut ex).await {
        Err(DbError::DataIntegrityError(e)) => assert!(e.contains("invalid character")),
        e => panic!("Unexpected result {:?}", e),
    }

    drop(ex);
    db.close().await;
}

pub(crate) async fn test_update_ok(db: Arc<dyn Db + Send + Sync>) {
    let db = setup_schema(db).await;
    let mut ex = db.ex().await.unwrap();

    let order = simple_order("o");
    create_order(&mut ex, &order).await.unwrap();

    let expected = order.version();
    let order = order.apply(Action::Review).with_version(expected.next().unwrap());
    assert!(update_order(&mut ex, &order, expected).await.unwrap());

    let stored = get_order(&mut ex, order.id()).await.unwrap();
    assert_eq!(Status::Reviewed, stored.status());
    assert_eq!(2, stored.version().as_u32());

    drop(ex);
    db.close().await;
}

pub(crate) async fn test_update_stale_version(db: Arc<dyn Db + Send + Sync>) {
    let db = setup_schema(db).await;
    let mut ex = db.ex().await.unwrap();

    let order = simple_order("o");
    create_order(&mut ex, &order).await.unwrap();

    let first = order.clone().apply(Action::Review).with_version(Version::from_u32(2).unwrap());
    assert!(update_order(&mut ex, &first, order.version()).await.unwrap());

    // A second writer that read the order before the first write lands must lose.
    let second = order.clone().apply(Action::Cancel).with_version(Version::from_u32(2).unwrap());
    assert!(!update_order(&mut ex, &second, order.version()).await.unwrap());

    assert_eq!(first, get_order(&mut ex, order.id()).await.unwrap());

    drop(ex);
    db.close().await;
}

pub(crate) async fn test_update_not_found(db: Arc<dyn Db + Send + Sync>) {
    let db = setup_schema(db).await;
    let mut ex = db.ex().await.unwrap();

    let order = simple_order("ghost");
    assert_eq!(
        DbError::NotFound,
        update_order(&mut ex, &order, Version::initial()).await.unwrap_err()
    );

    drop(ex);
    db.close().await;
}

pub(crate) async fn test_tx_rollback_discards_orders(db: Arc<dyn Db + Send + Sync>) {
    let db = setup_schema(db).await;

    {
        let mut tx = db.begin().await.unwrap();
        create_order(tx.ex(), &simple_order("gone")).await.unwrap();
    }

    let mut tx = db.begin().await.unwrap();
    create_order(tx.ex(), &simple_order("kept")).await.unwrap();
    tx.commit().await.unwrap();

    let mut ex = db.ex().await.unwrap();
    let ids = get_order_ids(&mut ex).await.unwrap();
    assert_eq!(vec!["kept"], ids.iter().map(OrderId::as_str).collect::<Vec<&str>>());

    drop(ex);
    db.close().await;
}

/// Instantiates the order store tests for the database returned by `setup`.
macro_rules! generate_db_tests [
    ( $setup:expr $(, #[$extra:meta] )? ) => {
        hypermedia_core::db::testutils::generate_tests!(
            $(#[$extra],)?
            $setup,
            $crate::db::tests,
            test_create_and_get,
            test_create_already_exists,
            test_get_not_found,
            test_get_order_ids,
            test_get_order_ids_corrupted,
            test_update_ok,
            test_update_stale_version,
            test_update_not_found,
            test_tx_rollback_discards_orders
        );
    }
];

#[cfg(feature = "postgres")]
mod postgres {
    use super::*;

    generate_db_tests!(
        Arc::new(hypermedia_core::db::postgres::testutils::setup().await),
        #[ignore = "Requires environment configuration and is expensive"]
    );
}

mod sqlite {
    use super::*;

    generate_db_tests!(Arc::new(hypermedia_core::db::sqlite::testutils::setup().await));
}
