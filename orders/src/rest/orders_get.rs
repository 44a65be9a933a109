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

//! API to list the identifiers of all orders.

use crate::model::OrderId;
use crate::rest::AppState;
use axum::Json;
use axum::extract::State;
use hypermedia_core::rest::{EmptyBody, RestError};
use std::collections::BTreeSet;

/// GET handler for this API.
pub(crate) async fn handler(
    State((driver, _base_urls)): State<AppState>,
    _: EmptyBody,
) -> Result<Json<BTreeSet<OrderId>>, RestError> {
    let ids = driver.get_order_ids().await?;
    Ok(Json(ids))
}
