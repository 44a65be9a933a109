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

//! API to describe the contextual action set of an order.

use crate::model::{OrderId, Status};
use crate::rest::AppState;
use crate::rest::hypermedia::{action_links, order_headers};
use axum::Json;
use axum::extract::{Path, State};
use axum::http::HeaderMap;
use hypermedia_core::rest::{EmptyBody, RestError};
use serde::{Deserialize, Serialize};

/// Description of one action that a client can invoke on an order.
#[derive(Debug, Deserialize, PartialEq, Serialize)]
pub(crate) struct ActionLink {
    /// Name of the action, which doubles as its link relation.
    pub(crate) name: String,

    /// HTTP method to invoke the action with.
    pub(crate) method: String,

    /// Absolute URL to invoke the action on.
    pub(crate) href: String,
}

/// Message returned by the server with the actions available for an order.
#[derive(Debug, Deserialize, Serialize)]
pub(crate) struct ActionsResponse {
    /// Current status of the order, from which the actions are derived.
    pub(crate) status: Status,

    /// Available actions.  Always an array, even if there is a single action.
    pub(crate) actions: Vec<ActionLink>,
}

/// GET handler for this API.
pub(crate) async fn handler(
    State((driver, base_urls)): State<AppState>,
    Path(id): Path<OrderId>,
    _: EmptyBody,
) -> Result<(HeaderMap, Json<ActionsResponse>), RestError> {
    let order = driver.get_order(&id).await?;

    let actions = action_links(&base_urls, &order)
        .into_iter()
        .map(|link| ActionLink {
            name: link.rel().to_owned(),
            method: link.method().to_string(),
            href: link.href().to_string(),
        })
        .collect();
    let response = ActionsResponse { status: order.status(), actions };

    Ok((order_headers(&base_urls, &order), Json(response)))
}
