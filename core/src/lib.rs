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

//! Shared plumbing for hypermedia web services.
//!
//! A service built on this crate is split into layers, each in a module of the same name:
//!
//! -   `model`: domain types.  Mostly newtypes that validate their contents on construction, plus
//!     pure functions derived from them.
//! -   `db`: persistence.  Free functions that receive an `Executor` and run one query per
//!     supported backend.
//! -   `driver`: business logic.  A cloneable `Driver` owns the database and any shared state, and
//!     each operation consumes it.
//! -   `rest`: the HTTP API as an `axum::Router` whose state carries the `Driver`.
//! -   `main`: reads configuration from the environment and starts the server.
//!
//! Each layer has its own error type, and each error type converts into the one of the layer above
//! it, so `?` carries failures up to the REST layer where they become status codes.

#![warn(anonymous_parameters, bad_style, clippy::missing_docs_in_private_items, missing_docs)]
#![warn(unused, unused_extern_crates, unused_import_braces, unused_qualifications)]
#![warn(unsafe_code)]

pub mod db;
pub mod driver;
pub mod env;
pub mod model;
pub mod rest;
pub mod template;
