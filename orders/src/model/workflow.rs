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

//! The order workflow: statuses, actions, and the contextual action set.

use http::Method;
use hypermedia_core::model::{ModelError, ModelResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::iter;
use std::str::FromStr;

/// Status of an order in its workflow.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Status {
    /// The order has been placed and awaits review.
    Received,

    /// The order has been reviewed and awaits payment.
    Reviewed,

    /// The order has been paid for and awaits shipment.
    Payed,

    /// The order has left the warehouse.  Terminal.
    Shipped,

    /// The order was abandoned.  Terminal.
    Canceled,
}

impl Status {
    /// Returns the canonical textual representation of the status.
    pub fn as_str(self) -> &'static str {
        match self {
            Status::Received => "RECEIVED",
            Status::Reviewed => "REVIEWED",
            Status::Payed => "PAYED",
            Status::Shipped => "SHIPPED",
            Status::Canceled => "CANCELED",
        }
    }

    /// Returns true if no transition can leave this status.
    pub fn is_terminal(self) -> bool {
        matches!(self, Status::Shipped | Status::Canceled)
    }

    /// Computes the set of actions that are valid next steps from this status.
    pub fn actions(self) -> ActionSet {
        let extra: &[Action] = match self {
            Status::Received => &[Action::Review, Action::Cancel, Action::Update],
            Status::Reviewed => &[Action::Cancel, Action::Pay, Action::Update],
            Status::Payed => &[Action::Ship, Action::Update],
            Status::Shipped | Status::Canceled => &[],
        };
        iter::once(Action::Refresh).chain(extra.iter().copied()).collect()
    }

    /// Returns true if `action` belongs to the action set of this status.
    pub fn permits(self, action: Action) -> bool {
        self.actions().contains(action)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Status {
    type Err = ModelError;

    fn from_str(s: &str) -> ModelResult<Self> {
        match s {
            "RECEIVED" => Ok(Status::Received),
            "REVIEWED" => Ok(Status::Reviewed),
            "PAYED" => Ok(Status::Payed),
            "SHIPPED" => Ok(Status::Shipped),
            "CANCELED" => Ok(Status::Canceled),
            s => Err(ModelError(format!("Unknown order status '{}'", s))),
        }
    }
}

/// An operation that clients can invoke on an order.
///
/// The declaration order defines the order in which actions appear in an `ActionSet`.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    /// Re-reads the order without changing it.
    Refresh,

    /// Overwrites the order with client-provided contents.
    Update,

    /// Marks the order as reviewed.
    Review,

    /// Marks the order as paid.
    Pay,

    /// Marks the order as shipped.
    Ship,

    /// Marks the order as canceled.
    Cancel,
}

impl Action {
    /// All known actions.
    pub const ALL: [Action; 6] = [
        Action::Refresh,
        Action::Update,
        Action::Review,
        Action::Pay,
        Action::Ship,
        Action::Cancel,
    ];

    /// Returns the name of the action, which is also its path segment and link relation.
    pub fn name(self) -> &'static str {
        match self {
            Action::Refresh => "refresh",
            Action::Update => "update",
            Action::Review => "review",
            Action::Pay => "pay",
            Action::Ship => "ship",
            Action::Cancel => "cancel",
        }
    }

    /// Returns the HTTP method used to invoke the action.
    pub fn method(self) -> Method {
        match self {
            Action::Refresh => Method::GET,
            Action::Update | Action::Ship => Method::PUT,
            Action::Review | Action::Pay | Action::Cancel => Method::POST,
        }
    }

    /// Returns the status an order moves to after this action, or `None` if the action does not
    /// go through the workflow.
    pub fn target(self) -> Option<Status> {
        match self {
            Action::Refresh | Action::Update => None,
            Action::Review => Some(Status::Reviewed),
            Action::Pay => Some(Status::Payed),
            Action::Ship => Some(Status::Shipped),
            Action::Cancel => Some(Status::Canceled),
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Action {
    type Err = ModelError;

    fn from_str(s: &str) -> ModelResult<Self> {
        Action::ALL
            .into_iter()
            .find(|action| action.name() == s)
            .ok_or_else(|| ModelError(format!("Unknown action '{}'", s)))
    }
}

/// Ordered set of actions.  Always serialized as an array, even if it holds a single action.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ActionSet(BTreeSet<Action>);

impl ActionSet {
    /// Returns true if `action` is in the set.
    pub fn contains(&self, action: Action) -> bool {
        self.0.contains(&action)
    }

    /// Iterates over the actions in the set in their natural order.
    pub fn iter(&self) -> impl Iterator<Item = Action> + '_ {
        self.0.iter().copied()
    }

    /// Returns the number of actions in the set.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if the set has no actions.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<Action> for ActionSet {
    fn from_iter<I: IntoIterator<Item = Action>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}
