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

//! API to execute the `review` action on an order.

use crate::model::OrderId;
use crate::rest::AppState;
use crate::rest::hypermedia::order_headers;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use hypermedia_core::rest::{EmptyBody, RestError, get_unique_header_str};

/// Name of the request header that carries free-form review notes.
const NOTES_HEADER: &str = "notes";

/// POST handler for this API.
pub(crate) async fn handler(
    State((driver, base_urls)): State<AppState>,
    Path(id): Path<OrderId>,
    headers: HeaderMap,
    _: EmptyBody,
) -> Result<(StatusCode, HeaderMap), RestError> {
    let notes = get_unique_header_str(&headers, NOTES_HEADER)?;
    let order = driver.review(&id, notes).await?;
    Ok((StatusCode::NO_CONTENT, order_headers(&base_urls, &order)))
}
