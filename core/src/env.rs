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

//! Typed access to configuration in environment variables.
//!
//! Variables are named `<prefix>_<suffix>` so that one process can hold several configurations
//! side by side, such as `PGSQL_PROD_HOST` and `PGSQL_TEST_HOST`.

use std::env;
use std::str::FromStr;
use url::Url;

/// Result type for this module.  Errors are ready to show to the operator.
type Result<T> = std::result::Result<T, String>;

/// Raw value of an environment variable, which types convert from via `TryFrom`.
pub struct Value(String);

impl TryFrom<Value> for String {
    type Error = String;

    fn try_from(value: Value) -> Result<Self> {
        Ok(value.0)
    }
}

/// Parses `value` with `FromStr`, naming the target `type_name` in errors.
fn parse_value<T>(value: Value, type_name: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value.0.parse::<T>().map_err(|e| format!("Invalid {}: {}", type_name, e))
}

/// Implements `TryFrom<Value>` for types that implement `FromStr`.
macro_rules! impl_tryfrom_value [
    ( $( $t:ty ),+ ) => {
        $(
            impl TryFrom<Value> for $t {
                type Error = String;

                fn try_from(value: Value) -> Result<Self> {
                    parse_value(value, stringify!($t))
                }
            }
        )+
    }
];

impl_tryfrom_value!(bool, u16, u32, u64, usize, Url);

/// Reads `<prefix>_<suffix>` as a `T`, or `None` if the variable is unset.
pub fn get_optional_var<T: TryFrom<Value, Error = String>>(
    prefix: &str,
    suffix: &str,
) -> Result<Option<T>> {
    let name = format!("{}_{}", prefix, suffix);
    let raw = match env::var(&name) {
        Ok(raw) => raw,
        Err(env::VarError::NotPresent) => return Ok(None),
        Err(env::VarError::NotUnicode(_)) => {
            return Err(format!("Invalid value in environment variable {}", name));
        }
    };
    T::try_from(Value(raw))
        .map(Some)
        .map_err(|e| format!("Invalid type in environment variable {}: {}", name, e))
}

/// Reads `<prefix>_<suffix>` as a `T`, failing if the variable is unset.
pub fn get_required_var<T: TryFrom<Value, Error = String>>(
    prefix: &str,
    suffix: &str,
) -> Result<T> {
    get_optional_var::<T>(prefix, suffix)?.ok_or_else(|| {
        format!("Required environment variable {}_{} not present", prefix, suffix)
    })
}
