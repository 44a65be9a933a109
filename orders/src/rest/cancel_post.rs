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

//! API to execute the `cancel` action on an order.

use crate::model::OrderId;
use crate::rest::AppState;
use crate::rest::hypermedia::order_headers;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use hypermedia_core::rest::{EmptyBody, RestError};
use serde::{Deserialize, Serialize};

/// Query parameters accepted by this API.
#[derive(Default, Deserialize, Serialize)]
pub(crate) struct CancelQuery {
    /// Free-form notes explaining the cancellation.
    pub(crate) notes: Option<String>,
}

/// POST handler for this API.
pub(crate) async fn handler(
    State((driver, base_urls)): State<AppState>,
    Path(id): Path<OrderId>,
    Query(query): Query<CancelQuery>,
    _: EmptyBody,
) -> Result<(StatusCode, HeaderMap), RestError> {
    let order = driver.cancel(&id, query.notes).await?;
    Ok((StatusCode::NO_CONTENT, order_headers(&base_urls, &order)))
}
