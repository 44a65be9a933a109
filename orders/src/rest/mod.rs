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

//! REST interface for the order service.
//!
//! Every action in the workflow gets its own route under the order it applies to, registered from
//! the action's own name and method.  Responses that describe a single order advertise the
//! actions that make sense next via `Link` headers.

use crate::driver::Driver;
use crate::model::Action;
use axum::Router;
use axum::routing::{MethodFilter, MethodRouter, get, on};
use hypermedia_core::rest::BaseUrls;
use hypermedia_core::template::Templates;
use log::error;
use std::sync::Arc;

mod actions_get;
mod cancel_post;
mod hypermedia;
mod order_get;
mod order_put;
mod order_view_get;
mod orders_get;
mod orders_post;
mod pay_post;
mod review_post;
mod ship_put;
#[cfg(test)]
mod testutils;

/// Path to the collection of orders.
const ORDERS_PATH: &str = "/api/v1/orders";

/// State shared by the handlers that return JSON.
pub(crate) type AppState = (Driver, Arc<BaseUrls>);

/// State shared by the handlers that render HTML.
pub(crate) type ViewState = (Driver, Arc<BaseUrls>, Templates);

/// Returns the HTML templates compiled into the service.
fn templates() -> Templates {
    Templates::new(&[("order.html", include_str!("../templates/order.html"))])
}

/// Returns the handler that implements `action`, reachable only via `filter`.
fn action_handler(action: Action, filter: MethodFilter) -> MethodRouter<AppState> {
    match action {
        Action::Refresh => on(filter, order_get::handler),
        Action::Update => on(filter, order_put::handler),
        Action::Review => on(filter, review_post::handler),
        Action::Pay => on(filter, pay_post::handler),
        Action::Ship => on(filter, ship_put::handler),
        Action::Cancel => on(filter, cancel_post::handler),
    }
}

/// Creates the router for the application.
pub(crate) fn app(driver: Driver, base_urls: Arc<BaseUrls>) -> Router {
    let view_router = Router::new()
        .route(&format!("{}/:id/view", ORDERS_PATH), get(order_view_get::handler))
        .with_state((driver.clone(), base_urls.clone(), templates()));

    let mut router = Router::new()
        .route(ORDERS_PATH, get(orders_get::handler).post(orders_post::handler))
        .route(&format!("{}/:id", ORDERS_PATH), get(order_get::handler).put(order_put::handler))
        .route(&format!("{}/:id/actions", ORDERS_PATH), get(actions_get::handler));

    for action in Action::ALL {
        let filter = match MethodFilter::try_from(action.method()) {
            Ok(filter) => filter,
            Err(e) => {
                error!("Cannot route action {}: {}", action, e);
                continue;
            }
        };
        let path = format!("{}/:id/{}", ORDERS_PATH, action.name());
        router = router.route(&path, action_handler(action, filter));
    }

    router.with_state((driver, base_urls)).merge(view_router)
}
