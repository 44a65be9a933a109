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

//! The `Order` data type and its building blocks.

use crate::model::{Action, ActionSet, Status};
use derive_getters::Getters;
use derive_more::{AsRef, Display};
use hypermedia_core::model::{ModelError, ModelResult};
use serde::{Deserialize, Serialize};

/// Maximum length of an order identifier.  Must match the database schema.
const MAX_ORDER_ID_LENGTH: usize = 64;

/// Maximum length of a payment reference.  Must match the database schema.
const MAX_PAYMENT_REF_LENGTH: usize = 64;

/// Maximum length of any field in a shipping address.
const MAX_ADDRESS_FIELD_LENGTH: usize = 256;

/// Opaque identifier of an order.
///
/// Identifiers are restricted to a URL-safe alphabet because they appear as path segments in the
/// links advertised to clients.
#[derive(AsRef, Clone, Debug, Deserialize, Display, Eq, Hash, Ord, PartialEq, PartialOrd)]
#[derive(Serialize)]
#[serde(try_from = "String")]
pub struct OrderId(String);

impl OrderId {
    /// Creates a new identifier after validating its contents.
    pub fn new<S: Into<String>>(id: S) -> ModelResult<Self> {
        let id = id.into();
        if id.is_empty() {
            return Err(ModelError("Order identifier cannot be empty".to_owned()));
        }
        if id.len() > MAX_ORDER_ID_LENGTH {
            return Err(ModelError(format!(
                "Order identifier cannot be longer than {} characters",
                MAX_ORDER_ID_LENGTH
            )));
        }
        for ch in id.chars() {
            if !(ch.is_ascii_alphanumeric() || ch == '-' || ch == '_') {
                return Err(ModelError(format!(
                    "Order identifier '{}' contains invalid character '{}'",
                    id, ch
                )));
            }
        }
        Ok(Self(id))
    }

    /// Generates a new random identifier.
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    /// Returns the string representation of the identifier.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for OrderId {
    type Error = ModelError;

    fn try_from(id: String) -> ModelResult<Self> {
        Self::new(id)
    }
}

/// Opaque reference to the payment instrument used for an order.
#[derive(Clone, Debug, Deserialize, Display, Eq, PartialEq, Serialize)]
#[serde(try_from = "String")]
pub struct PaymentRef(String);

impl PaymentRef {
    /// Creates a new payment reference after validating its contents.
    pub fn new<S: Into<String>>(reference: S) -> ModelResult<Self> {
        let reference = reference.into();
        if reference.is_empty() {
            return Err(ModelError("Payment reference cannot be empty".to_owned()));
        }
        if reference.chars().count() > MAX_PAYMENT_REF_LENGTH {
            return Err(ModelError(format!(
                "Payment reference cannot be longer than {} characters",
                MAX_PAYMENT_REF_LENGTH
            )));
        }
        if reference.chars().any(char::is_control) {
            return Err(ModelError("Payment reference must be printable".to_owned()));
        }
        Ok(Self(reference))
    }

    /// Returns the string representation of the reference.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for PaymentRef {
    type Error = ModelError;

    fn try_from(reference: String) -> ModelResult<Self> {
        Self::new(reference)
    }
}

/// Raw shape of an `Address` as received from clients, before validation.
#[derive(Deserialize)]
struct RawAddress {
    /// Street and number.
    street: String,

    /// City name.
    city: String,

    /// Postal code.
    zip: String,

    /// Country name.
    country: String,
}

/// Shipping address of an order.
#[derive(Clone, Debug, Deserialize, Eq, Getters, PartialEq, Serialize)]
#[serde(try_from = "RawAddress")]
pub struct Address {
    /// Street and number.
    street: String,

    /// City name.
    city: String,

    /// Postal code.
    zip: String,

    /// Country name.
    country: String,
}

impl Address {
    /// Creates a new address after checking that no field is blank or too long.
    pub fn new<S1, S2, S3, S4>(street: S1, city: S2, zip: S3, country: S4) -> ModelResult<Self>
    where
        S1: Into<String>,
        S2: Into<String>,
        S3: Into<String>,
        S4: Into<String>,
    {
        let address = Self {
            street: street.into(),
            city: city.into(),
            zip: zip.into(),
            country: country.into(),
        };
        for (name, value) in [
            ("street", &address.street),
            ("city", &address.city),
            ("zip", &address.zip),
            ("country", &address.country),
        ] {
            if value.trim().is_empty() {
                return Err(ModelError(format!("Address {} cannot be empty", name)));
            }
            if value.chars().count() > MAX_ADDRESS_FIELD_LENGTH {
                return Err(ModelError(format!(
                    "Address {} cannot be longer than {} characters",
                    name, MAX_ADDRESS_FIELD_LENGTH
                )));
            }
        }
        Ok(address)
    }
}

impl TryFrom<RawAddress> for Address {
    type Error = ModelError;

    fn try_from(raw: RawAddress) -> ModelResult<Self> {
        Self::new(raw.street, raw.city, raw.zip, raw.country)
    }
}

/// An order's current version number, bumped on every write.
///
/// We store this as an u32 but guarantee that it is usable in an i32 context because the
/// PostgreSQL database backend needs it.
#[derive(Clone, Copy, Debug, Deserialize, Display, Eq, PartialEq, Serialize)]
#[serde(try_from = "u32")]
pub struct Version(u32);

impl Version {
    /// Returns the initial version assigned to new orders.
    pub fn initial() -> Version {
        Version(1)
    }

    /// Returns the version that follows this one.
    pub fn next(self) -> ModelResult<Version> {
        match self.0.checked_add(1) {
            Some(next) if i32::try_from(next).is_ok() => Ok(Version(next)),
            _ => Err(ModelError(format!("Version {} cannot be incremented", self.0))),
        }
    }

    /// Creates a version from an `i32` with range validation.
    pub fn from_i32(version: i32) -> ModelResult<Version> {
        match u32::try_from(version) {
            Ok(version) => Ok(Version(version)),
            Err(e) => Err(ModelError(format!("Version cannot be represented: {}", e))),
        }
    }

    /// Creates a version from a `u32` with range validation.
    pub fn from_u32(version: u32) -> ModelResult<Version> {
        match i32::try_from(version) {
            Ok(_) => Ok(Version(version)),
            Err(e) => Err(ModelError(format!("Version cannot be represented: {}", e))),
        }
    }

    /// Returns the version as an `i32`.
    pub fn as_i32(&self) -> i32 {
        // Construction guarantees that the value fits.
        i32::try_from(self.0).unwrap_or(i32::MAX)
    }

    /// Returns the version as a `u32`.
    pub fn as_u32(&self) -> u32 {
        self.0
    }
}

impl TryFrom<u32> for Version {
    type Error = ModelError;

    fn try_from(value: u32) -> ModelResult<Self> {
        Version::from_u32(value)
    }
}

/// An order and its position in the workflow.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct Order {
    /// Unique identifier of the order.
    id: OrderId,

    /// Current status of the order.
    status: Status,

    /// Where to ship the order to.
    shipping_address: Address,

    /// Reference to the payment instrument, if known.
    payment: Option<PaymentRef>,

    /// Version of the stored record, for optimistic concurrency control.
    version: Version,
}

impl Order {
    /// Creates a new order that has just been received.
    pub fn new(id: OrderId, shipping_address: Address) -> Self {
        Self {
            id,
            status: Status::Received,
            shipping_address,
            payment: None,
            version: Version::initial(),
        }
    }

    /// Modifies the order to set its status.
    pub fn with_status(mut self, status: Status) -> Self {
        self.status = status;
        self
    }

    /// Modifies the order to set its shipping address.
    pub fn with_shipping_address(mut self, shipping_address: Address) -> Self {
        self.shipping_address = shipping_address;
        self
    }

    /// Modifies the order to set or clear its payment reference.
    pub fn with_payment(mut self, payment: Option<PaymentRef>) -> Self {
        self.payment = payment;
        self
    }

    /// Modifies the order to set its version.
    pub fn with_version(mut self, version: Version) -> Self {
        self.version = version;
        self
    }

    /// Gets the order's identifier.
    pub fn id(&self) -> &OrderId {
        &self.id
    }

    /// Gets the order's status.
    pub fn status(&self) -> Status {
        self.status
    }

    /// Gets the order's shipping address.
    pub fn shipping_address(&self) -> &Address {
        &self.shipping_address
    }

    /// Gets the order's payment reference, if any.
    pub fn payment(&self) -> Option<&PaymentRef> {
        self.payment.as_ref()
    }

    /// Gets the order's version.
    pub fn version(&self) -> Version {
        self.version
    }

    /// Gets the contextual action set of the order, derived from its status.
    pub fn actions(&self) -> ActionSet {
        self.status.actions()
    }

    /// Moves the order to the target status of `action`, if it has one.
    ///
    /// This does not check whether the action is part of the current action set.
    pub fn apply(self, action: Action) -> Self {
        match action.target() {
            Some(status) => self.with_status(status),
            None => self,
        }
    }
}

/// Client-provided replacement for the contents of an order.
#[derive(Clone, Debug, Deserialize, Getters, PartialEq, Serialize)]
pub struct OrderUpdate {
    /// Identifier of the order, which must match the one being updated.
    id: OrderId,

    /// New status of the order.
    status: Status,

    /// New shipping address of the order.
    shipping_address: Address,

    /// New payment reference of the order.
    #[serde(default)]
    payment: Option<PaymentRef>,
}

impl OrderUpdate {
    /// Creates a new update request.
    pub fn new(
        id: OrderId,
        status: Status,
        shipping_address: Address,
        payment: Option<PaymentRef>,
    ) -> Self {
        Self { id, status, shipping_address, payment }
    }

    /// Applies the update on top of `order`, preserving its identity and version.
    pub fn merge_into(self, order: Order) -> Order {
        order
            .with_status(self.status)
            .with_shipping_address(self.shipping_address)
            .with_payment(self.payment)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Builds a valid address for testing purposes.
    fn address() -> Address {
        Address::new("1 Main St", "Springfield", "12345", "US").unwrap()
    }

    #[test]
    fn test_order_id_ok() {
        assert_eq!("abc-123_X", OrderId::new("abc-123_X").unwrap().as_str());
        OrderId::new("x".repeat(MAX_ORDER_ID_LENGTH)).unwrap();
    }

    #[test]
    fn test_order_id_errors() {
        assert!(OrderId::new("").unwrap_err().0.contains("cannot be empty"));
        assert!(
            OrderId::new("x".repeat(MAX_ORDER_ID_LENGTH + 1)).unwrap_err().0.contains("longer")
        );
        assert!(OrderId::new("a/b").unwrap_err().0.contains("invalid character '/'"));
        assert!(OrderId::new("a b").unwrap_err().0.contains("invalid character ' '"));
    }

    #[test]
    fn test_order_id_generate_is_valid() {
        let id = OrderId::generate();
        assert_eq!(id, OrderId::new(id.as_str()).unwrap());
        assert_ne!(id, OrderId::generate());
    }

    #[test]
    fn test_order_id_deserialize_validates() {
        assert_eq!(OrderId::new("ok").unwrap(), serde_json::from_str("\"ok\"").unwrap());
        serde_json::from_str::<OrderId>("\"not ok\"").unwrap_err();
    }

    #[test]
    fn test_payment_ref() {
        assert_eq!("4111-xxxx", PaymentRef::new("4111-xxxx").unwrap().as_str());
        PaymentRef::new("").unwrap_err();
        PaymentRef::new("a\nb").unwrap_err();
        PaymentRef::new("9".repeat(MAX_PAYMENT_REF_LENGTH + 1)).unwrap_err();
    }

    #[test]
    fn test_address_validation() {
        assert_eq!("Springfield", address().city());
        assert!(Address::new("", "c", "z", "c").unwrap_err().0.contains("street cannot be empty"));
        assert!(Address::new("s", "c", "  ", "c").unwrap_err().0.contains("zip cannot be empty"));
        assert!(
            serde_json::from_str::<Address>(
                r#"{"street": "s", "city": "", "zip": "z", "country": "c"}"#
            )
            .unwrap_err()
            .to_string()
            .contains("city cannot be empty")
        );
    }

    #[test]
    fn test_version() {
        assert_eq!(1, Version::initial().as_u32());
        assert_eq!(2, Version::initial().next().unwrap().as_i32());
        Version::from_i32(-1).unwrap_err();
        Version::from_u32(u32::MAX).unwrap_err();
        Version::from_u32(i32::MAX as u32).unwrap().next().unwrap_err();
    }

    #[test]
    fn test_version_deserialize_checks_range() {
        assert_eq!(Version::initial(), serde_json::from_str::<Version>("1").unwrap());
        assert_eq!(
            Version::from_u32(i32::MAX as u32).unwrap(),
            serde_json::from_str::<Version>("2147483647").unwrap()
        );
        let err = serde_json::from_str::<Version>("2147483648").unwrap_err();
        assert!(err.to_string().contains("Version cannot be represented"));
    }

    #[test]
    fn test_order_new() {
        let order = Order::new(OrderId::new("o1").unwrap(), address());
        assert_eq!(Status::Received, order.status());
        assert_eq!(&address(), order.shipping_address());
        assert!(order.payment().is_none());
        assert_eq!(Version::initial(), order.version());
    }

    #[test]
    fn test_order_apply() {
        let order = Order::new(OrderId::new("o1").unwrap(), address());

        let order = order.apply(Action::Refresh);
        assert_eq!(Status::Received, order.status());

        let order = order.apply(Action::Review);
        assert_eq!(Status::Reviewed, order.status());

        let order = order.apply(Action::Pay);
        assert_eq!(Status::Payed, order.status());
        assert!(order.actions().contains(Action::Ship));

        // Applying an action outside of the set still moves the order.
        let order = order.apply(Action::Cancel);
        assert_eq!(Status::Canceled, order.status());
        assert_eq!(1, order.actions().len());
    }

    #[test]
    fn test_order_update_merge_into() {
        let order = Order::new(OrderId::new("o1").unwrap(), address())
            .with_version(Version::from_u32(7).unwrap());
        let other = Address::new("2 Elm St", "Shelbyville", "54321", "US").unwrap();
        let update = OrderUpdate::new(
            OrderId::new("o1").unwrap(),
            Status::Payed,
            other.clone(),
            Some(PaymentRef::new("card").unwrap()),
        );

        let order = update.merge_into(order);
        assert_eq!(Status::Payed, order.status());
        assert_eq!(&other, order.shipping_address());
        assert_eq!(Some(&PaymentRef::new("card").unwrap()), order.payment());
        assert_eq!(7, order.version().as_u32());
    }

    #[test]
    fn test_order_json() {
        let order = Order::new(OrderId::new("o1").unwrap(), address());
        let json = serde_json::to_value(&order).unwrap();
        assert_eq!("o1", json["id"]);
        assert_eq!("RECEIVED", json["status"]);
        assert_eq!("Springfield", json["shipping_address"]["city"]);
        assert!(json["payment"].is_null());
        assert_eq!(1, json["version"]);
    }
}
