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

//! Trivial templating engine.
//!
//! Templates are compiled into the binary and registered by name in a `Templates` set.  Callers
//! ask the set to resolve a logical name, which may omit the `.html` extension, and then expand
//! the resolved template with `apply`.

/// Extension tried when a template name does not resolve as given.
const DEFAULT_EXTENSION: &str = ".html";

/// Expands every `%key%` in `input` with the value of `key` in `replacements`.
///
/// `%%` yields a literal `%`.  Values are inserted verbatim and are not expanded again.  Fails if
/// a key has no replacement or more than one, or if a `%` is left unpaired.
pub fn apply(input: &str, replacements: &[(&str, &str)]) -> Result<String, String> {
    if input.matches('%').count() % 2 != 0 {
        return Err("Template has an unpaired %".to_owned());
    }

    let mut output = String::with_capacity(input.len());
    for (i, chunk) in input.split('%').enumerate() {
        if i % 2 == 0 {
            output.push_str(chunk);
        } else if chunk.is_empty() {
            output.push('%');
        } else {
            let mut values = replacements.iter().filter(|(key, _)| *key == chunk);
            match (values.next(), values.next()) {
                (Some((_, value)), None) => output.push_str(value),
                (None, _) => return Err(format!("No replacement for template key {}", chunk)),
                (Some(_), Some(_)) => {
                    return Err(format!("Many replacements for template key {}", chunk));
                }
            }
        }
    }
    Ok(output)
}

/// Escapes `input` so that it can be embedded in HTML text or in a quoted attribute value.
pub fn escape_html(input: &str) -> String {
    let mut output = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '&' => output.push_str("&amp;"),
            '<' => output.push_str("&lt;"),
            '>' => output.push_str("&gt;"),
            '"' => output.push_str("&quot;"),
            '\'' => output.push_str("&#39;"),
            ch => output.push(ch),
        }
    }
    output
}

/// Collection of named templates.
#[derive(Clone, Default)]
pub struct Templates {
    /// Pairs of template names and their contents.
    entries: Vec<(&'static str, &'static str)>,
}

impl Templates {
    /// Creates a new template set from `(name, contents)` pairs.
    pub fn new(entries: &[(&'static str, &'static str)]) -> Self {
        Self { entries: entries.to_vec() }
    }

    /// Looks up a template by its exact `name`.
    fn get(&self, name: &str) -> Option<&'static str> {
        self.entries.iter().find(|(candidate, _)| *candidate == name).map(|(_, contents)| *contents)
    }

    /// Resolves the logical template `name` to its contents.
    ///
    /// The name is first looked up as is.  If that fails and the name does not carry the default
    /// extension, the lookup is retried with the extension appended.
    pub fn resolve(&self, name: &str) -> Option<&'static str> {
        if let Some(contents) = self.get(name) {
            return Some(contents);
        }
        if !name.ends_with(DEFAULT_EXTENSION) {
            return self.get(&format!("{}{}", name, DEFAULT_EXTENSION));
        }
        None
    }
}
