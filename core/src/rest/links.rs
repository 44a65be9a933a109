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

//! Hypermedia links advertised through `Link` response headers.

use axum::http::header::LINK;
use axum::http::{HeaderMap, HeaderValue, Method};
use std::fmt;
use url::Url;

/// A single web link pointing at a resource and the method to invoke on it.
#[derive(Clone, Debug, PartialEq)]
pub struct Link {
    /// Absolute target of the link.
    href: Url,

    /// Relation of the target to the current resource.
    rel: &'static str,

    /// HTTP method that clients must use when following the link.
    method: Method,
}

impl Link {
    /// Creates a new link to `href` with relation `rel`, followed with `method`.
    pub fn new(href: Url, rel: &'static str, method: Method) -> Self {
        Self { href, rel, method }
    }

    /// Returns the absolute target of the link.
    pub fn href(&self) -> &Url {
        &self.href
    }

    /// Returns the relation name of the link.
    pub fn rel(&self) -> &'static str {
        self.rel
    }

    /// Returns the method to use when following the link.
    pub fn method(&self) -> &Method {
        &self.method
    }
}

impl fmt::Display for Link {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}>; rel=\"{}\"; method=\"{}\"", self.href, self.rel, self.method)
    }
}

/// Builds a header map with one `Link` header per entry in `links`.
pub fn link_headers<'a, I>(links: I) -> HeaderMap
where
    I: IntoIterator<Item = &'a Link>,
{
    let mut headers = HeaderMap::new();
    for link in links {
        // URLs are serialized in ASCII and rels are static names, so this cannot fail.
        if let Ok(value) = HeaderValue::from_str(&link.to_string()) {
            headers.append(LINK, value);
        }
    }
    headers
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_link_display() {
        let link = Link::new(
            Url::parse("http://localhost:3000/api/v1/orders/1/pay").unwrap(),
            "pay",
            Method::POST,
        );
        assert_eq!(
            "<http://localhost:3000/api/v1/orders/1/pay>; rel=\"pay\"; method=\"POST\"",
            link.to_string()
        );
    }

    #[test]
    fn test_link_headers_one_per_link() {
        let links = [
            Link::new(Url::parse("http://x/a").unwrap(), "refresh", Method::GET),
            Link::new(Url::parse("http://x/b").unwrap(), "ship", Method::PUT),
        ];
        let headers = link_headers(&links);
        let values = headers
            .get_all(LINK)
            .iter()
            .map(|v| v.to_str().unwrap().to_owned())
            .collect::<Vec<String>>();
        assert_eq!(
            vec![
                "<http://x/a>; rel=\"refresh\"; method=\"GET\"".to_owned(),
                "<http://x/b>; rel=\"ship\"; method=\"PUT\"".to_owned(),
            ],
            values
        );
    }

    #[test]
    fn test_link_headers_empty() {
        assert!(link_headers(&Vec::<Link>::new()).is_empty());
    }
}
