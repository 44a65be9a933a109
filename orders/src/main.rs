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

//! Entry point to the order management service.

#![warn(anonymous_parameters, bad_style, clippy::missing_docs_in_private_items, missing_docs)]
#![warn(unused, unused_extern_crates, unused_import_braces, unused_qualifications)]
#![warn(unsafe_code)]

use hypermedia_core::db::Db;
use hypermedia_core::db::postgres::{PostgresDb, PostgresOptions};
use hypermedia_core::env::get_optional_var;
use hypermedia_core::rest::BaseUrls;
use hypermedia_orders::db::init_schema;
use hypermedia_orders::driver::{Driver, DriverOptions};
use hypermedia_orders::serve;
use std::error::Error;
use std::net::Ipv4Addr;
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();

    let port = get_optional_var::<u16>("ORDERS", "PORT")?.unwrap_or(3000);
    let seed_samples = get_optional_var::<bool>("ORDERS", "SEED_SAMPLES")?.unwrap_or(false);
    let opts = DriverOptions::from_env("ORDERS")?;
    let base_urls = Arc::new(BaseUrls::from_env("ORDERS")?);

    let db_opts = PostgresOptions::from_env("PGSQL_PROD")?;
    let db: Arc<dyn Db + Send + Sync> = Arc::new(PostgresDb::connect(db_opts)?);
    init_schema(&mut db.ex().await?).await?;

    if seed_samples {
        Driver::new(db.clone(), opts.clone()).seed_samples().await?;
    }

    serve((Ipv4Addr::LOCALHOST, port), db, opts, base_urls).await
}
