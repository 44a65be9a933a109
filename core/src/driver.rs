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

//! Errors of the business logic layer.
//!
//! Services define their own `Driver`, typically a `Clone` type that holds an
//! `Arc<dyn Db + Send + Sync>`.  Its operations take `self` by value: an operation that needs
//! several database calls coordinates them itself instead of leaving that to the caller.

use crate::db::DbError;
use crate::model::ModelError;

/// Errors returned by driver operations.  The payload is the message for the client.
#[derive(Debug, PartialEq, thiserror::Error)]
pub enum DriverError {
    /// The entity to create already exists.
    #[error("{0}")]
    AlreadyExists(String),

    /// The database failed or returned data we cannot make sense of.
    #[error("{0}")]
    BackendError(String),

    /// The operation is not possible given the current state of the entity.
    #[error("{0}")]
    Conflict(String),

    /// The caller supplied invalid data.
    #[error("{0}")]
    InvalidInput(String),

    /// The entity does not exist.
    #[error("{0}")]
    NotFound(String),
}

impl From<DbError> for DriverError {
    fn from(e: DbError) -> Self {
        let message = e.to_string();
        match e {
            DbError::AlreadyExists => DriverError::AlreadyExists(message),
            DbError::NotFound => DriverError::NotFound(message),
            DbError::BackendError(_) | DbError::DataIntegrityError(_) | DbError::Unavailable => {
                DriverError::BackendError(message)
            }
        }
    }
}

impl From<ModelError> for DriverError {
    fn from(e: ModelError) -> Self {
        DriverError::InvalidInput(e.to_string())
    }
}

/// Result type for this module.
pub type DriverResult<T> = Result<T, DriverError>;
