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

//! REST building blocks shared by all services.
//!
//! Services expose an `app` function that builds their `Router` and put every API in its own
//! `<entity>_<method>.rs` file.  Each such file has a `tests` module whose `route` function returns
//! the method and path under test, so that all tests in the file exercise the same API.
//!
//! Errors from lower layers convert into `RestError`, which renders as a JSON `ErrorResponse` with
//! a status code that matches the failure.

use crate::driver::DriverError;
use crate::model::ModelError;
use async_trait::async_trait;
use axum::Json;
use axum::body::HttpBody;
use axum::extract::{FromRequest, Request};
use axum::http::header::AsHeaderName;
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use std::fmt;

mod base_urls;
pub use base_urls::BaseUrls;
mod links;
pub use links::{Link, link_headers};
#[cfg(feature = "testutils")]
pub mod testutils;

/// Errors reported to API clients.
#[derive(Debug, PartialEq, thiserror::Error)]
pub enum RestError {
    /// The request cannot be applied to the entity in its current state.
    #[error("{0}")]
    Conflict(String),

    /// Something failed on our side.
    #[error("{0}")]
    InternalError(String),

    /// The request is malformed or carries invalid data.
    #[error("{0}")]
    InvalidRequest(String),

    /// The entity named by the request does not exist.
    #[error("{0}")]
    NotFound(String),

    /// The request carried a body where none is accepted.
    #[error("Content should be empty")]
    PayloadNotEmpty,
}

impl RestError {
    /// Returns the HTTP status code that represents this error.
    pub fn status(&self) -> StatusCode {
        match self {
            RestError::Conflict(_) => StatusCode::CONFLICT,
            RestError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            RestError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            RestError::NotFound(_) => StatusCode::NOT_FOUND,
            RestError::PayloadNotEmpty => StatusCode::PAYLOAD_TOO_LARGE,
        }
    }
}

impl From<DriverError> for RestError {
    fn from(e: DriverError) -> Self {
        let message = e.to_string();
        match e {
            DriverError::AlreadyExists(_) | DriverError::InvalidInput(_) => {
                RestError::InvalidRequest(message)
            }
            DriverError::BackendError(_) => RestError::InternalError(message),
            DriverError::Conflict(_) => RestError::Conflict(message),
            DriverError::NotFound(_) => RestError::NotFound(message),
        }
    }
}

impl From<fmt::Error> for RestError {
    fn from(e: fmt::Error) -> Self {
        RestError::InternalError(e.to_string())
    }
}

impl From<ModelError> for RestError {
    fn from(e: ModelError) -> Self {
        RestError::InvalidRequest(e.to_string())
    }
}

impl From<serde_json::Error> for RestError {
    fn from(e: serde_json::Error) -> Self {
        RestError::InvalidRequest(e.to_string())
    }
}

impl IntoResponse for RestError {
    fn into_response(self) -> Response {
        let status = self.status();
        (status, Json(ErrorResponse { message: self.to_string() })).into_response()
    }
}

/// Result type for this module.
pub type RestResult<T> = Result<T, RestError>;

/// JSON body of every error response.
#[derive(Debug, Deserialize, Serialize)]
pub(crate) struct ErrorResponse {
    /// Human-readable description of the failure.
    pub(crate) message: String,
}

/// Extractor for APIs that take no request body.  Any content is rejected with `PayloadNotEmpty`.
pub struct EmptyBody {}

#[async_trait]
impl<S> FromRequest<S> for EmptyBody
where
    S: Send + Sync,
{
    type Rejection = RestError;

    async fn from_request(req: Request, _state: &S) -> Result<Self, Self::Rejection> {
        if !req.into_body().is_end_stream() {
            return Err(RestError::PayloadNotEmpty);
        }
        Ok(EmptyBody {})
    }
}

/// Gets the value of header `name`, failing if the request carries the header more than once.
pub fn get_unique_header<K: AsHeaderName + Copy>(
    headers: &HeaderMap,
    name: K,
) -> RestResult<Option<&HeaderValue>> {
    let mut values = headers.get_all(name).iter();
    match (values.next(), values.next()) {
        (value, None) => Ok(value),
        (_, Some(_)) => Err(RestError::InvalidRequest(format!(
            "Header {} cannot have more than one value",
            name.as_str()
        ))),
    }
}

/// Like `get_unique_header` but also requires the value to be printable text.
pub fn get_unique_header_str<K: AsHeaderName + Copy>(
    headers: &HeaderMap,
    name: K,
) -> RestResult<Option<String>> {
    get_unique_header(headers, name)?
        .map(|value| {
            value.to_str().map(str::to_owned).map_err(|_| {
                RestError::InvalidRequest(format!(
                    "Header {} has a non-printable value",
                    name.as_str()
                ))
            })
        })
        .transpose()
}
