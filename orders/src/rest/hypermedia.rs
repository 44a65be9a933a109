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

//! Construction of the hypermedia controls attached to order responses.

use crate::model::{Order, OrderId};
use axum::http::HeaderMap;
use hypermedia_core::rest::{BaseUrls, Link, link_headers};
use url::Url;

/// Path segments under which the orders collection lives.
const ORDERS_SEGMENTS: [&str; 3] = ["api", "v1", "orders"];

/// Builds the absolute URL of order `id`, optionally pointing at one of its `subresource`s.
pub(crate) fn order_url(base_urls: &BaseUrls, id: &OrderId, subresource: Option<&str>) -> Url {
    let mut segments = ORDERS_SEGMENTS.to_vec();
    segments.push(id.as_str());
    if let Some(subresource) = subresource {
        segments.push(subresource);
    }
    base_urls.make_backend_url(&segments)
}

/// Computes one link per action in the contextual action set of `order`.
pub(crate) fn action_links(base_urls: &BaseUrls, order: &Order) -> Vec<Link> {
    order
        .actions()
        .iter()
        .map(|action| {
            let href = order_url(base_urls, order.id(), Some(action.name()));
            Link::new(href, action.name(), action.method())
        })
        .collect()
}

/// Computes the `Link` headers to attach to any response that describes `order`.
pub(crate) fn order_headers(base_urls: &BaseUrls, order: &Order) -> HeaderMap {
    link_headers(&action_links(base_urls, order))
}
