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

//! Order management service that exposes orders as hypermedia resources.

#![warn(anonymous_parameters, bad_style, clippy::missing_docs_in_private_items, missing_docs)]
#![warn(unused, unused_extern_crates, unused_import_braces, unused_qualifications)]
#![warn(unsafe_code)]

use hypermedia_core::db::Db;
use hypermedia_core::rest::BaseUrls;
use log::{error, info};
use std::error::Error;
use std::net::SocketAddr;
use std::sync::Arc;

pub mod db;
pub mod driver;
use driver::{Driver, DriverOptions};
pub mod model;
mod rest;
use rest::app;

/// Serves the order API on `bind_addr` until Ctrl-C is received.
pub async fn serve(
    bind_addr: impl Into<SocketAddr>,
    db: Arc<dyn Db + Send + Sync>,
    opts: DriverOptions,
    base_urls: Arc<BaseUrls>,
) -> Result<(), Box<dyn Error>> {
    let driver = Driver::new(db.clone(), opts);
    let app = app(driver, base_urls);

    let listener = tokio::net::TcpListener::bind(bind_addr.into()).await?;
    info!("Listening on {}", listener.local_addr()?);
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!("Cannot wait for Ctrl-C: {}", e);
            }
        })
        .await?;

    info!("Shutting down");
    db.close().await;
    Ok(())
}
