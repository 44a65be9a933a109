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

//! API to execute the `ship` action on an order.

use crate::model::{Address, Order, OrderId};
use crate::rest::AppState;
use crate::rest::hypermedia::order_headers;
use axum::Json;
use axum::extract::{Path, State};
use axum::http::HeaderMap;
use hypermedia_core::rest::RestError;

/// PUT handler for this API.
pub(crate) async fn handler(
    State((driver, base_urls)): State<AppState>,
    Path(id): Path<OrderId>,
    Json(shipping_address): Json<Address>,
) -> Result<(HeaderMap, Json<Order>), RestError> {
    let order = driver.ship(&id, shipping_address).await?;
    Ok((order_headers(&base_urls, &order), Json(order)))
}
