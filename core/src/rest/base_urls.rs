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

//! The `BaseUrls` type.

use crate::env::get_required_var;
use url::Url;

/// Checks if `base` can act as a base URL, which requires a trailing slash in its path.
fn ensure_valid_base(base: &Url) -> Result<(), String> {
    if base.cannot_be_a_base() || !base.path().ends_with('/') {
        return Err(format!("URL '{}' cannot be a base: missing trailing slash", base));
    }
    Ok(())
}

/// Base URL under which clients reach the service.
///
/// Hypermedia responses embed absolute URLs to the resources they reference, so the service must
/// know the address under which clients reach it, which may differ from the address it binds to.
/// The HTML views are served by the service itself and live under the same base.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct BaseUrls {
    /// The base URL to the backend service (ourselves).
    backend: Url,
}

impl BaseUrls {
    /// Creates the base URLs from an already-parsed URL.
    pub fn new(backend: Url) -> Result<Self, String> {
        ensure_valid_base(&backend)?;
        Ok(Self { backend })
    }

    /// Creates the base URLs from `<prefix>_BACKEND_BASE_URL`.
    pub fn from_env(prefix: &str) -> Result<Self, String> {
        let backend = get_required_var::<Url>(prefix, "BACKEND_BASE_URL")?;
        Self::new(backend)
    }

    /// Creates the base URLs from a fixed string, which must represent a valid base URL.
    #[cfg(any(test, feature = "testutils"))]
    pub fn from_static(backend: &'static str) -> Self {
        Self::new(Url::parse(backend).unwrap()).unwrap()
    }

    /// Builds an absolute backend URL by appending the path `segments` to the base.
    ///
    /// Each segment is percent-encoded on its own, so callers can pass untrusted identifiers.
    pub fn make_backend_url(&self, segments: &[&str]) -> Url {
        extend(&self.backend, segments)
    }
}

/// Appends `segments` to the path of `base`, which has already been validated as a base.
fn extend(base: &Url, segments: &[&str]) -> Url {
    let mut url = base.clone();
    if let Ok(mut path) = url.path_segments_mut() {
        path.pop_if_empty().extend(segments);
        if segments.is_empty() {
            path.push("");
        }
    }
    url
}
