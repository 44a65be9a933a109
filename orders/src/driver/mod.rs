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

//! Business logic for the order workflow.

use hypermedia_core::db::Db;
use hypermedia_core::env::get_optional_var;
use std::sync::Arc;

mod actions;
mod orders;
#[cfg(test)]
pub(crate) mod testutils;

/// Default value for the `MAX_UPDATE_ATTEMPTS` setting when not specified.
const DEFAULT_MAX_UPDATE_ATTEMPTS: u16 = 5;

/// Configuration options for the order driver.
#[derive(Clone, Debug)]
#[cfg_attr(test, derive(PartialEq))]
pub struct DriverOptions {
    /// Whether actions outside of an order's contextual action set are rejected.  When false,
    /// they are logged and executed anyway.
    pub strict_transitions: bool,

    /// Number of times to retry a write that lost a race against a concurrent writer before
    /// giving up.
    pub max_update_attempts: u16,
}

impl Default for DriverOptions {
    fn default() -> Self {
        Self { strict_transitions: false, max_update_attempts: DEFAULT_MAX_UPDATE_ATTEMPTS }
    }
}

impl DriverOptions {
    /// Creates a new set of options from environment variables whose name is prefixed with the
    /// given `prefix`.
    ///
    /// This will use variables such as `<prefix>_STRICT_TRANSITIONS` and
    /// `<prefix>_MAX_UPDATE_ATTEMPTS`.
    pub fn from_env(prefix: &str) -> Result<Self, String> {
        let max_update_attempts = get_optional_var::<u16>(prefix, "MAX_UPDATE_ATTEMPTS")?
            .unwrap_or(DEFAULT_MAX_UPDATE_ATTEMPTS);
        if max_update_attempts == 0 {
            return Err(format!("{}_MAX_UPDATE_ATTEMPTS must be positive", prefix));
        }
        Ok(Self {
            strict_transitions: get_optional_var::<bool>(prefix, "STRICT_TRANSITIONS")?
                .unwrap_or(false),
            max_update_attempts,
        })
    }
}

/// Business logic.
///
/// The public operations exposed by the driver are all "one shot": they consume the driver so
/// that callers cannot accidentally chain two of them without re-reading the order in between.
#[derive(Clone)]
pub struct Driver {
    /// The database that the driver uses for persistence.
    db: Arc<dyn Db + Send + Sync>,

    /// Options for the driver.
    opts: DriverOptions,
}

impl Driver {
    /// Creates a new driver backed by the given injected components.
    pub fn new(db: Arc<dyn Db + Send + Sync>, opts: DriverOptions) -> Self {
        Self { db, opts }
    }
}
