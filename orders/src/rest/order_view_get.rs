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

//! API to render an order as an HTML page.

use crate::model::{Order, OrderId, PaymentRef};
use crate::rest::hypermedia::{action_links, order_headers};
use crate::rest::ViewState;
use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::response::Html;
use hypermedia_core::rest::{BaseUrls, EmptyBody, RestError, RestResult};
use hypermedia_core::template::{self, Templates, escape_html};
use std::fmt::Write;

/// Logical name of the template used to render orders.
const TEMPLATE_NAME: &str = "order";

/// Renders `order` into HTML using the template set in `templates`.
fn render(templates: &Templates, base_urls: &BaseUrls, order: &Order) -> RestResult<String> {
    let Some(input) = templates.resolve(TEMPLATE_NAME) else {
        return Err(RestError::InternalError(format!("Template {} not found", TEMPLATE_NAME)));
    };

    let mut actions = String::new();
    for link in action_links(base_urls, order) {
        writeln!(
            actions,
            "    <li><a href=\"{}\" data-method=\"{}\">{}</a></li>",
            escape_html(link.href().as_str()),
            link.method(),
            link.rel()
        )?;
    }

    let address = order.shipping_address();
    let id = escape_html(order.id().as_str());
    let status = order.status().to_string();
    let street = escape_html(address.street());
    let city = escape_html(address.city());
    let zip = escape_html(address.zip());
    let country = escape_html(address.country());
    let payment = escape_html(order.payment().map(PaymentRef::as_str).unwrap_or("none"));
    let version = order.version().to_string();
    template::apply(
        input,
        &[
            ("id", id.as_str()),
            ("status", status.as_str()),
            ("street", street.as_str()),
            ("city", city.as_str()),
            ("zip", zip.as_str()),
            ("country", country.as_str()),
            ("payment", payment.as_str()),
            ("version", version.as_str()),
            ("actions", actions.trim_end()),
        ],
    )
    .map_err(RestError::InternalError)
}

/// GET handler for this API.
pub(crate) async fn handler(
    State((driver, base_urls, templates)): State<ViewState>,
    Path(id): Path<OrderId>,
    _: EmptyBody,
) -> Result<(HeaderMap, Html<String>), RestError> {
    let order = driver.get_order(&id).await?;
    let html = render(&templates, &base_urls, &order)?;
    Ok((order_headers(&base_urls, &order), Html(html)))
}
