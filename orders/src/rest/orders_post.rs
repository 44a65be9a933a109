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

//! API to place a new order.

use crate::model::{Address, Order, PaymentRef};
use crate::rest::AppState;
use crate::rest::hypermedia::{order_headers, order_url};
use axum::Json;
use axum::extract::State;
use axum::http::header::LOCATION;
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use hypermedia_core::rest::RestError;
use serde::{Deserialize, Serialize};

/// Message sent to the server to place an order.
#[derive(Deserialize, Serialize)]
pub(crate) struct CreateOrderRequest {
    /// Where to ship the order to.
    pub(crate) shipping_address: Address,

    /// Reference to the payment instrument, if already known.
    #[serde(default)]
    pub(crate) payment: Option<PaymentRef>,
}

/// POST handler for this API.
pub(crate) async fn handler(
    State((driver, base_urls)): State<AppState>,
    Json(request): Json<CreateOrderRequest>,
) -> Result<(StatusCode, HeaderMap, Json<Order>), RestError> {
    let order = driver.create_order(request.shipping_address, request.payment).await?;

    let mut headers = order_headers(&base_urls, &order);
    let location = order_url(&base_urls, order.id(), None);
    let location = HeaderValue::from_str(location.as_str())
        .map_err(|e| RestError::InternalError(format!("Invalid location {}: {}", location, e)))?;
    headers.insert(LOCATION, location);

    Ok((StatusCode::CREATED, headers, Json(order)))
}
