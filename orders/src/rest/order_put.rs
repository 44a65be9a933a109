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

//! API to overwrite the contents of an order.  Also backs the `update` action.

use crate::model::{OrderId, OrderUpdate};
use crate::rest::AppState;
use crate::rest::hypermedia::order_headers;
use axum::Json;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use hypermedia_core::rest::RestError;

/// PUT handler for this API.
pub(crate) async fn handler(
    State((driver, base_urls)): State<AppState>,
    Path(id): Path<OrderId>,
    Json(update): Json<OrderUpdate>,
) -> Result<(StatusCode, HeaderMap), RestError> {
    let order = driver.update_order(&id, update).await?;
    Ok((StatusCode::NO_CONTENT, order_headers(&base_urls, &order)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::DriverOptions;
    use crate::driver::testutils::test_address;
    use crate::model::{Address, PaymentRef, Status};
    use crate::rest::testutils::*;
    use axum::http;
    use hypermedia_core::rest::testutils::OneShotBuilder;
    use hypermedia_core::test_payload_must_be_json;

    fn route(id: &str) -> (http::Method, String) {
        (http::Method::PUT, format!("/api/v1/orders/{}", id))
    }

    fn update_route(id: &str) -> (http::Method, String) {
        (http::Method::PUT, format!("/api/v1/orders/{}/update", id))
    }

    /// Builds an update request for order `id` that moves it to `status`.
    fn update(id: &str, status: Status) -> OrderUpdate {
        OrderUpdate::new(
            OrderId::new(id).unwrap(),
            status,
            Address::new("2 Elm St", "Shelbyville", "54321", "US").unwrap(),
            Some(PaymentRef::new("card").unwrap()),
        )
    }

    #[tokio::test]
    async fn test_ok() {
        let context = TestContext::setup().await;
        context.create_order("abc", Status::Received).await;

        OneShotBuilder::new(context.app(), route("abc"))
            .send_json(update("abc", Status::Payed))
            .await
            .expect_status(StatusCode::NO_CONTENT)
            .expect_link_rels(&["refresh", "ship", "update"])
            .expect_empty()
            .await;

        let order = context.get_order("abc").await;
        assert_eq!(Status::Payed, order.status());
        assert_eq!("Shelbyville", order.shipping_address().city());
        assert_eq!("card", order.payment().unwrap().as_str());
    }

    #[tokio::test]
    async fn test_update_action_is_same_as_put() {
        let context = TestContext::setup().await;
        context.create_order("abc", Status::Reviewed).await;

        OneShotBuilder::new(context.app(), update_route("abc"))
            .send_json(update("abc", Status::Canceled))
            .await
            .expect_status(StatusCode::NO_CONTENT)
            .expect_link_rels(&["refresh"])
            .expect_empty()
            .await;

        assert_eq!(Status::Canceled, context.get_order("abc").await.status());
    }

    #[tokio::test]
    async fn test_id_mismatch() {
        let context = TestContext::setup().await;
        let order = context.create_order("abc", Status::Received).await;

        OneShotBuilder::new(context.app(), route("abc"))
            .send_json(update("other", Status::Payed))
            .await
            .expect_status(StatusCode::BAD_REQUEST)
            .expect_error("other in payload does not match abc")
            .await;

        assert_eq!(order, context.get_order("abc").await);
    }

    #[tokio::test]
    async fn test_not_found() {
        let context = TestContext::setup().await;

        OneShotBuilder::new(context.app(), route("abc"))
            .send_json(update("abc", Status::Payed))
            .await
            .expect_status(StatusCode::NOT_FOUND)
            .expect_error("Order abc not found")
            .await;

        assert!(!context.has_order("abc").await);
    }

    #[tokio::test]
    async fn test_terminal_conflict_when_strict() {
        let opts = DriverOptions { strict_transitions: true, ..Default::default() };
        let context = TestContext::setup_with(opts).await;
        context.create_order("abc", Status::Shipped).await;

        OneShotBuilder::new(context.app(), route("abc"))
            .send_json(update("abc", Status::Received))
            .await
            .expect_status(StatusCode::CONFLICT)
            .expect_error("Cannot update order abc in status SHIPPED")
            .await;

        assert_eq!(Status::Shipped, context.get_order("abc").await.status());
    }

    #[tokio::test]
    async fn test_bad_address() {
        let context = TestContext::setup().await;
        context.create_order("abc", Status::Received).await;

        let request = serde_json::json!({
            "id": "abc",
            "status": "PAYED",
            "shipping_address": { "street": "", "city": "c", "zip": "z", "country": "c" },
        });
        OneShotBuilder::new(context.app(), route("abc"))
            .send_json(request)
            .await
            .expect_status(StatusCode::UNPROCESSABLE_ENTITY)
            .expect_text("street cannot be empty")
            .await;

        assert_eq!(test_address(), *context.get_order("abc").await.shipping_address());
    }

    test_payload_must_be_json!(TestContext::setup().await.into_app(), route("abc"));
}
