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

//! Test utilities for the business logic layer.

use crate::db;
use crate::driver::{Driver, DriverOptions};
use crate::model::{Address, Order, OrderId, Status};
use hypermedia_core::db::{Db, DbError, Executor};
use std::sync::Arc;

/// Builds the address used by orders created in tests.
pub(crate) fn test_address() -> Address {
    Address::new("1 Main St", "Springfield", "12345", "US").unwrap()
}

/// State of a running test.
pub(crate) struct TestContext {
    /// The database backing the driver.
    db: Arc<dyn Db + Send + Sync>,

    /// The driver under test.
    driver: Driver,
}

impl TestContext {
    /// Initializes the driver with default options on top of an in-memory database.
    pub(crate) async fn setup() -> Self {
        Self::setup_with(DriverOptions::default()).await
    }

    /// Initializes the driver with `opts` on top of an in-memory database.
    pub(crate) async fn setup_with(opts: DriverOptions) -> Self {
        let db: Arc<dyn Db + Send + Sync> =
            Arc::new(hypermedia_core::db::sqlite::testutils::setup().await);
        db::init_schema(&mut db.ex().await.unwrap()).await.unwrap();
        let driver = Driver::new(db.clone(), opts);
        Self { db, driver }
    }

    /// Returns a fresh copy of the driver to run one operation.
    pub(crate) fn driver(&self) -> Driver {
        self.driver.clone()
    }

    /// Returns the database backing the driver.
    pub(crate) fn db(&self) -> Arc<dyn Db + Send + Sync> {
        self.db.clone()
    }

    /// Returns a direct executor against the test database.
    pub(crate) async fn ex(&self) -> Executor {
        self.db.ex().await.unwrap()
    }

    /// Stores an order named `id` in `status` bypassing the driver.
    pub(crate) async fn create_order(&self, id: &'static str, status: Status) -> Order {
        let order = Order::new(OrderId::new(id).unwrap(), test_address()).with_status(status);
        db::create_order(&mut self.ex().await, &order).await.unwrap();
        order
    }

    /// Fetches the stored contents of order `id`, which must exist.
    pub(crate) async fn get_order(&self, id: &str) -> Order {
        db::get_order(&mut self.ex().await, &OrderId::new(id).unwrap()).await.unwrap()
    }

    /// Checks whether order `id` exists.
    pub(crate) async fn has_order(&self, id: &str) -> bool {
        match db::get_order(&mut self.ex().await, &OrderId::new(id).unwrap()).await {
            Ok(_) => true,
            Err(DbError::NotFound) => false,
            Err(e) => panic!("{:?}", e),
        }
    }
}
