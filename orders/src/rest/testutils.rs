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

//! Test utilities for the REST layer.

use crate::driver::DriverOptions;
use crate::driver::testutils::TestContext as DriverTestContext;
use crate::model::{Order, Status};
use crate::rest::app;
use axum::Router;
use hypermedia_core::rest::BaseUrls;
use std::sync::Arc;

/// Base URL of the backend under test, which prefixes every advertised link.
pub(crate) const BACKEND_BASE_URL: &str = "http://localhost:1234/";

/// State of a running test.
pub(crate) struct TestContext {
    /// Context of the business logic layer, for direct database access.
    driver_context: DriverTestContext,

    /// The app under test.
    app: Router,
}

impl TestContext {
    /// Initializes the app with default options on top of an in-memory database.
    pub(crate) async fn setup() -> Self {
        Self::setup_with(DriverOptions::default()).await
    }

    /// Initializes the app with `opts` on top of an in-memory database.
    pub(crate) async fn setup_with(opts: DriverOptions) -> Self {
        let driver_context = DriverTestContext::setup_with(opts).await;
        let base_urls = Arc::new(BaseUrls::from_static(BACKEND_BASE_URL));
        let app = app(driver_context.driver(), base_urls);
        Self { driver_context, app }
    }

    /// Returns a copy of the app to send one request to.
    pub(crate) fn app(&self) -> Router {
        self.app.clone()
    }

    /// Consumes the context and returns the app, for tests that don't inspect the database.
    pub(crate) fn into_app(self) -> Router {
        self.app
    }

    /// Stores an order named `id` in `status` bypassing the app.
    pub(crate) async fn create_order(&self, id: &'static str, status: Status) -> Order {
        self.driver_context.create_order(id, status).await
    }

    /// Fetches the stored contents of order `id`, which must exist.
    pub(crate) async fn get_order(&self, id: &str) -> Order {
        self.driver_context.get_order(id).await
    }

    /// Checks whether order `id` exists.
    pub(crate) async fn has_order(&self, id: &str) -> bool {
        self.driver_context.has_order(id).await
    }
}
