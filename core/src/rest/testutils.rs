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

//! Helpers to exercise a `Router` in-process from tests.

use super::ErrorResponse;
use axum::Router;
use axum::body::{Body, Bytes};
use axum::http::{self, HeaderName, HeaderValue, Request, StatusCode};
use axum::response::Response;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::collections::BTreeSet;
use tower::util::ServiceExt;

/// Largest response body the checkers will read.
const MAX_BODY_SIZE: usize = 64 * 1024;

/// Builds and sends one request to an app.
#[must_use]
pub struct OneShotBuilder {
    /// App that will receive the request.
    app: Router,

    /// Request under construction.
    builder: http::request::Builder,
}

impl OneShotBuilder {
    /// Starts a request to `uri` with `method` against `app`.
    pub fn new<U: AsRef<str>>(app: Router, (method, uri): (http::Method, U)) -> Self {
        Self { app, builder: Request::builder().method(method).uri(uri.as_ref()) }
    }

    /// Appends the URL-encoded `query` to the request URI, which must not have a query yet.
    pub fn with_query<Q: Serialize>(mut self, query: Q) -> Self {
        let uri = self.builder.uri_ref().expect("URI must be valid").to_string();
        assert!(!uri.contains(['?', '#']), "URI {} already has a query or fragment", uri);
        let query = serde_urlencoded::to_string(query).expect("Query must be serializable");
        self.builder = self.builder.uri(format!("{}?{}", uri, query));
        self
    }

    /// Adds header `name` with `value` to the request.
    pub fn with_header<K, V>(mut self, name: K, value: V) -> Self
    where
        HeaderName: TryFrom<K>,
        <HeaderName as TryFrom<K>>::Error: Into<http::Error>,
        HeaderValue: TryFrom<V>,
        <HeaderValue as TryFrom<V>>::Error: Into<http::Error>,
    {
        self.builder = self.builder.header(name, value);
        self
    }

    /// Sends the request with `body` as its payload.
    async fn send(self, body: Body) -> ResponseChecker {
        let request = self.builder.body(body).expect("Request must be valid");
        let response = self.app.oneshot(request).await.expect("Router is infallible");
        ResponseChecker::from(response)
    }

    /// Sends the request without a payload.
    pub async fn send_empty(self) -> ResponseChecker {
        self.send(Body::empty()).await
    }

    /// Sends the request with a plain text payload.
    pub async fn send_text<T: Into<String>>(mut self, text: T) -> ResponseChecker {
        self.builder = self.builder.header(http::header::CONTENT_TYPE, mime::TEXT_PLAIN.as_ref());
        self.send(Body::from(text.into())).await
    }

    /// Sends the request with `request` serialized as a JSON payload.
    pub async fn send_json<T: Serialize>(mut self, request: T) -> ResponseChecker {
        let json = serde_json::to_vec(&request).expect("Request must be serializable");
        self.builder =
            self.builder.header(http::header::CONTENT_TYPE, mime::APPLICATION_JSON.as_ref());
        self.send(Body::from(json)).await
    }
}

/// Assertions on the response to a request sent by `OneShotBuilder`.
///
/// The status code is validated by every method that consumes the body.  It defaults to `200`.
#[must_use]
pub struct ResponseChecker {
    /// The response under test.
    response: Response,

    /// Status code the response must have.
    exp_status: StatusCode,
}

impl From<Response> for ResponseChecker {
    fn from(response: Response) -> Self {
        Self { response, exp_status: StatusCode::OK }
    }
}

impl ResponseChecker {
    /// Expects the response to have `status` instead of `200`.
    pub fn expect_status(mut self, status: StatusCode) -> Self {
        self.exp_status = status;
        self
    }

    /// Expects the `Link` headers to advertise exactly the relations in `exp_rels`, in any order.
    pub fn expect_link_rels(self, exp_rels: &[&str]) -> Self {
        let rels = self
            .response
            .headers()
            .get_all(http::header::LINK)
            .iter()
            .map(|value| {
                let value = value.to_str().expect("Link headers must be printable");
                let rel = value
                    .split(';')
                    .find_map(|param| param.trim().strip_prefix("rel="))
                    .unwrap_or_else(|| panic!("Link header without rel: {}", value));
                rel.trim_matches('"').to_owned()
            })
            .collect::<BTreeSet<String>>();
        let exp_rels = exp_rels.iter().map(|rel| (*rel).to_owned()).collect::<BTreeSet<String>>();
        assert_eq!(exp_rels, rels);
        self
    }

    /// Expects header `name` to be present with `exp_value`.
    pub fn expect_header(self, name: &str, exp_value: &str) -> Self {
        assert_eq!(
            Some(exp_value),
            self.header(name).as_deref(),
            "Unexpected value for header {}",
            name
        );
        self
    }

    /// Returns the first value of header `name`, if any.
    pub fn header(&self, name: &str) -> Option<String> {
        self.response
            .headers()
            .get(name)
            .map(|value| value.to_str().expect("Header must be printable").to_owned())
    }

    /// Checks the status code without consuming the body.
    pub fn verify(&self) {
        assert_eq!(self.exp_status, self.response.status());
    }

    /// Checks the status code and reads the whole body.
    async fn take_body(self) -> Bytes {
        self.verify();
        axum::body::to_bytes(self.response.into_body(), MAX_BODY_SIZE)
            .await
            .expect("Body must fit in MAX_BODY_SIZE")
    }

    /// Expects an empty body.
    pub async fn expect_empty(self) {
        let body = self.take_body().await;
        assert!(body.is_empty(), "Body not empty; got {}", String::from_utf8_lossy(&body));
    }

    /// Expects an `ErrorResponse` body whose message matches `exp_re`.
    pub async fn expect_error(self, exp_re: &str) {
        let body = self.take_body().await;
        let response: ErrorResponse = serde_json::from_slice(&body).unwrap_or_else(|e| {
            panic!("Invalid error response ({}): {}", e, String::from_utf8_lossy(&body))
        });
        let re = regex::Regex::new(exp_re).expect("Regex must be valid");
        assert!(
            re.is_match(&response.message),
            "Error message '{}' does not match re '{}'",
            response.message,
            exp_re
        );
    }

    /// Expects a JSON body that deserializes into `T` and returns it.
    pub async fn expect_json<T: DeserializeOwned>(self) -> T {
        let body = self.take_body().await;
        serde_json::from_slice::<T>(&body).unwrap_or_else(|e| {
            panic!("Invalid JSON response ({}): {}", e, String::from_utf8_lossy(&body))
        })
    }

    /// Expects a text body that matches `exp_re` and that is not an `ErrorResponse`.
    pub async fn expect_text(self, exp_re: &str) {
        let body = self.take_body_as_text().await;
        assert!(!body.contains("\"message\":"), "Use expect_error for error responses");
        let re = regex::Regex::new(exp_re).expect("Regex must be valid");
        assert!(re.is_match(&body), "Body '{}' does not match re '{}'", body, exp_re);
    }

    /// Returns the body, which must be valid UTF-8.
    pub async fn take_body_as_text(self) -> String {
        let body = self.take_body().await;
        String::from_utf8(body.to_vec()).expect("Body must be UTF-8")
    }
}

/// Generates `test_payload_must_be_json`, which checks that the API at `route` rejects
/// non-JSON payloads.
///
/// These rejections come from axum's `Json` extractor, not from `RestError`, so they are plain
/// text.
#[macro_export]
macro_rules! test_payload_must_be_json {
    ( $app:expr, $route:expr $(, $query:expr)? ) => {
        #[tokio::test]
        async fn test_payload_must_be_json() {
            $crate::rest::testutils::OneShotBuilder::new($app, $route)
                $( .with_query($query) )?
                .send_text("this is not json")
                .await
                .expect_status(axum::http::StatusCode::UNSUPPORTED_MEDIA_TYPE)
                .expect_text("Content-Type")
                .await;

            $crate::rest::testutils::OneShotBuilder::new($app, $route)
                $( .with_query($query) )?
                .with_header(axum::http::header::CONTENT_TYPE, "application/json")
                .send_text("this is not json")
                .await
                .expect_status(axum::http::StatusCode::BAD_REQUEST)
                .expect_text("expected ident")
                .await;
        }
    };
}

pub use test_payload_must_be_json;

/// Generates `test_payload_must_be_empty`, which checks that the API at `route` rejects any
/// payload.
#[macro_export]
macro_rules! test_payload_must_be_empty {
    ( $app:expr, $route:expr $(, $query:expr)? ) => {
        #[tokio::test]
        async fn test_payload_must_be_empty() {
            $crate::rest::testutils::OneShotBuilder::new($app, $route)
                $( .with_query($query) )?
                .send_text("should not be here")
                .await
                .expect_status(axum::http::StatusCode::PAYLOAD_TOO_LARGE)
                .expect_error("should be empty")
                .await;
        }
    };
}

pub use test_payload_must_be_empty;
