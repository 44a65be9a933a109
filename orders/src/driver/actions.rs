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

//! Extends the driver with the workflow actions that move orders between statuses.

use crate::db;
use crate::driver::Driver;
use crate::driver::orders::fetch_order;
use crate::model::{Action, Address, Order, OrderId, PaymentRef};
use hypermedia_core::driver::{DriverError, DriverResult};
use log::{debug, info, warn};

impl Driver {
    /// Executes `action` on order `id`, letting `mutate` adjust the order after its status moved.
    ///
    /// The write is a compare-and-swap against the version that was read, and lost races are
    /// retried from scratch up to the configured number of attempts.  The read and the write
    /// check out separate connections so that no connection is held while `mutate` runs.
    pub(super) async fn transition<F>(
        self,
        id: &OrderId,
        action: Action,
        mutate: F,
    ) -> DriverResult<Order>
    where
        F: Fn(Order) -> Order + Send,
    {
        for attempt in 1..=self.opts.max_update_attempts {
            let order = fetch_order(&mut self.db.ex().await?, id).await?;
            let status = order.status();
            if !status.permits(action) {
                if self.opts.strict_transitions {
                    return Err(DriverError::Conflict(format!(
                        "Cannot {} order {} in status {}",
                        action, id, status
                    )));
                }
                warn!(
                    "Executing {} on order {} in status {} outside of its action set",
                    action, id, status
                );
            }

            let expected = order.version();
            let next = expected.next().map_err(|e| DriverError::BackendError(e.to_string()))?;
            let order = mutate(order.apply(action)).with_version(next);
            if db::update_order(&mut self.db.ex().await?, &order, expected).await? {
                info!("Order {} moved from {} to {} via {}", id, status, order.status(), action);
                return Ok(order);
            }
            debug!("Order {} changed while executing {} (attempt {})", id, action, attempt);
        }

        Err(DriverError::Conflict(format!(
            "Order {} kept changing while executing {}; gave up after {} attempts",
            id, action, self.opts.max_update_attempts
        )))
    }

    /// Marks order `id` as reviewed.
    pub(crate) async fn review(self, id: &OrderId, notes: Option<String>) -> DriverResult<Order> {
        if let Some(notes) = notes {
            debug!("Review notes for order {}: {}", id, notes);
        }
        self.transition(id, Action::Review, |order| order).await
    }

    /// Marks order `id` as paid, replacing its payment reference if a new one is given.
    pub(crate) async fn pay(
        self,
        id: &OrderId,
        payment: Option<PaymentRef>,
    ) -> DriverResult<Order> {
        self.transition(id, Action::Pay, move |order| match payment.clone() {
            Some(payment) => order.with_payment(Some(payment)),
            None => order,
        })
        .await
    }

    /// Marks order `id` as shipped to `shipping_address`.
    pub(crate) async fn ship(self, id: &OrderId, shipping_address: Address) -> DriverResult<Order> {
        self.transition(id, Action::Ship, move |order| {
            order.with_shipping_address(shipping_address.clone())
        })
        .await
    }

    /// Marks order `id` as canceled.
    pub(crate) async fn cancel(self, id: &OrderId, notes: Option<String>) -> DriverResult<Order> {
        if let Some(notes) = notes {
            debug!("Cancellation notes for order {}: {}", id, notes);
        }
        self.transition(id, Action::Cancel, |order| order).await
    }
}
