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

//! Extends the driver with operations to create, read and overwrite orders.

use crate::db;
use crate::driver::Driver;
use crate::model::{Action, Address, Order, OrderId, OrderUpdate, PaymentRef, Status};
use hypermedia_core::db::{DbError, Executor};
use hypermedia_core::driver::{DriverError, DriverResult};
use log::info;
use std::collections::BTreeSet;

/// Fetches order `id` from `ex`, turning a missing order into a descriptive error.
pub(super) async fn fetch_order(ex: &mut Executor, id: &OrderId) -> DriverResult<Order> {
    match db::get_order(ex, id).await {
        Ok(order) => Ok(order),
        Err(DbError::NotFound) => Err(DriverError::NotFound(format!("Order {} not found", id))),
        Err(e) => Err(e.into()),
    }
}

/// Returns the fixed collection of orders used to populate an empty deployment.
fn sample_orders() -> Vec<Order> {
    /// Raw definitions of the samples: identifier, status, street, city, zip, country, payment.
    const SAMPLES: &[(&str, Status, &str, &str, &str, &str, Option<&str>)] = &[
        ("1", Status::Received, "4140 Network Circle", "Santa Clara", "95054", "USA", None),
        ("2", Status::Reviewed, "1 Infinite Loop", "Cupertino", "95014", "USA", None),
        (
            "3",
            Status::Payed,
            "500 Oracle Parkway",
            "Redwood Shores",
            "94065",
            "USA",
            Some("4111-1111-1111-1111"),
        ),
        ("4", Status::Canceled, "10 Downing Street", "London", "SW1A 2AA", "UK", None),
    ];

    SAMPLES
        .iter()
        .filter_map(|(id, status, street, city, zip, country, payment)| {
            let id = OrderId::new(*id).ok()?;
            let address = Address::new(*street, *city, *zip, *country).ok()?;
            let payment = match payment {
                Some(payment) => Some(PaymentRef::new(*payment).ok()?),
                None => None,
            };
            Some(Order::new(id, address).with_status(*status).with_payment(payment))
        })
        .collect()
}

impl Driver {
    /// Gets the current contents of order `id`.  This backs the `refresh` action.
    pub(crate) async fn get_order(self, id: &OrderId) -> DriverResult<Order> {
        let mut ex = self.db.ex().await?;
        fetch_order(&mut ex, id).await
    }

    /// Gets the identifiers of all orders.
    pub(crate) async fn get_order_ids(self) -> DriverResult<BTreeSet<OrderId>> {
        let mut ex = self.db.ex().await?;
        Ok(db::get_order_ids(&mut ex).await?)
    }

    /// Places a new order shipping to `shipping_address`, optionally paid with `payment`.
    pub(crate) async fn create_order(
        self,
        shipping_address: Address,
        payment: Option<PaymentRef>,
    ) -> DriverResult<Order> {
        let order = Order::new(OrderId::generate(), shipping_address).with_payment(payment);

        let mut ex = self.db.ex().await?;
        db::create_order(&mut ex, &order).await?;

        info!("Created order {}", order.id());
        Ok(order)
    }

    /// Overwrites the contents of order `id` with `update`.
    ///
    /// The new status is taken verbatim from `update`, without consulting the workflow.
    pub(crate) async fn update_order(
        self,
        id: &OrderId,
        update: OrderUpdate,
    ) -> DriverResult<Order> {
        if update.id() != id {
            return Err(DriverError::InvalidInput(format!(
                "Order identifier {} in payload does not match {}",
                update.id(),
                id
            )));
        }

        self.transition(id, Action::Update, move |order| update.clone().merge_into(order)).await
    }

    /// Stores the sample orders that do not exist yet and returns how many were created.
    pub async fn seed_samples(self) -> DriverResult<usize> {
        let mut tx = self.db.begin().await?;

        let mut created = 0;
        for order in sample_orders() {
            match db::get_order(tx.ex(), order.id()).await {
                Ok(_) => continue,
                Err(DbError::NotFound) => (),
                Err(e) => return Err(e.into()),
            }
            db::create_order(tx.ex(), &order).await?;
            created += 1;
        }

        tx.commit().await?;

        info!("Seeded {} sample orders", created);
        Ok(created)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::DriverOptions;
    use crate::driver::testutils::*;

    #[tokio::test]
    async fn test_get_order_ok() {
        let context = TestContext::setup().await;
        let order = context.create_order("abc", Status::Reviewed).await;

        assert_eq!(order, context.driver().get_order(order.id()).await.unwrap());
    }

    #[tokio::test]
    async fn test_get_order_not_found() {
        let context = TestContext::setup().await;
        context.create_order("abc", Status::Reviewed).await;

        assert_eq!(
            DriverError::NotFound("Order xyz not found".to_owned()),
            context.driver().get_order(&OrderId::new("xyz").unwrap()).await.unwrap_err()
        );
    }

    #[tokio::test]
    async fn test_get_order_ids() {
        let context = TestContext::setup().await;
        assert!(context.driver().get_order_ids().await.unwrap().is_empty());

        context.create_order("b", Status::Received).await;
        context.create_order("a", Status::Shipped).await;

        let ids = context.driver().get_order_ids().await.unwrap();
        assert_eq!(
            vec![OrderId::new("a").unwrap(), OrderId::new("b").unwrap()],
            ids.into_iter().collect::<Vec<OrderId>>()
        );
    }

    #[tokio::test]
    async fn test_create_order() {
        let context = TestContext::setup().await;

        let payment = Some(PaymentRef::new("card").unwrap());
        let order = context.driver().create_order(test_address(), payment.clone()).await.unwrap();
        assert_eq!(Status::Received, order.status());
        assert_eq!(payment.as_ref(), order.payment());
        assert_eq!(1, order.version().as_u32());

        assert_eq!(order, context.get_order(order.id().as_str()).await);
    }

    #[tokio::test]
    async fn test_create_order_unique_ids() {
        let context = TestContext::setup().await;

        let order1 = context.driver().create_order(test_address(), None).await.unwrap();
        let order2 = context.driver().create_order(test_address(), None).await.unwrap();
        assert_ne!(order1.id(), order2.id());
    }

    #[tokio::test]
    async fn test_update_order_overwrites() {
        let context = TestContext::setup().await;
        let order = context.create_order("abc", Status::Received).await;

        let address = Address::new("2 Elm St", "Shelbyville", "54321", "US").unwrap();
        let update = OrderUpdate::new(
            order.id().clone(),
            Status::Payed,
            address.clone(),
            Some(PaymentRef::new("card").unwrap()),
        );
        let updated = context.driver().update_order(order.id(), update).await.unwrap();

        let stored = context.get_order("abc").await;
        assert_eq!(Status::Payed, stored.status());
        assert_eq!(&address, stored.shipping_address());
        assert_eq!("card", stored.payment().unwrap().as_str());
        assert_eq!(2, stored.version().as_u32());
        assert_eq!(updated, stored);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_update_order_concurrent_writers() {
        const WRITERS: u16 = 8;

        // A writer can only lose its compare-and-swap once to each of the others.
        let opts = DriverOptions { max_update_attempts: WRITERS, ..Default::default() };
        let context = TestContext::setup_with(opts).await;
        let order = context.create_order("abc", Status::Received).await;

        let mut tasks = Vec::with_capacity(usize::from(WRITERS));
        for i in 0..WRITERS {
            let driver = context.driver();
            let id = order.id().clone();
            let update = OrderUpdate::new(
                id.clone(),
                Status::Received,
                test_address(),
                Some(PaymentRef::new(format!("card-{}", i)).unwrap()),
            );
            tasks.push(tokio::spawn(async move { driver.update_order(&id, update).await }));
        }
        let mut versions = BTreeSet::default();
        for task in tasks {
            let updated = task.await.unwrap().unwrap();
            assert!(versions.insert(updated.version().as_u32()));
        }

        assert_eq!((2..=1 + u32::from(WRITERS)).collect::<BTreeSet<u32>>(), versions);
        let stored = context.get_order("abc").await;
        assert_eq!(1 + u32::from(WRITERS), stored.version().as_u32());
    }

    #[tokio::test]
    async fn test_update_order_id_mismatch() {
        let context = TestContext::setup().await;
        let order = context.create_order("abc", Status::Received).await;

        let update = OrderUpdate::new(
            OrderId::new("other").unwrap(),
            Status::Payed,
            test_address(),
            None,
        );
        assert_eq!(
            DriverError::InvalidInput(
                "Order identifier other in payload does not match abc".to_owned()
            ),
            context.driver().update_order(order.id(), update).await.unwrap_err()
        );
        assert_eq!(order, context.get_order("abc").await);
    }

    #[tokio::test]
    async fn test_update_order_not_found() {
        let context = TestContext::setup().await;

        let id = OrderId::new("abc").unwrap();
        let update = OrderUpdate::new(id.clone(), Status::Payed, test_address(), None);
        assert_eq!(
            DriverError::NotFound("Order abc not found".to_owned()),
            context.driver().update_order(&id, update).await.unwrap_err()
        );
    }

    #[tokio::test]
    async fn test_update_order_terminal_strict() {
        let opts = DriverOptions { strict_transitions: true, ..Default::default() };
        let context = TestContext::setup_with(opts).await;
        let order = context.create_order("abc", Status::Shipped).await;

        let update =
            OrderUpdate::new(order.id().clone(), Status::Received, test_address(), None);
        match context.driver().update_order(order.id(), update).await {
            Err(DriverError::Conflict(e)) => assert!(e.contains("Cannot update order abc")),
            e => panic!("Unexpected result {:?}", e),
        }
        assert_eq!(order, context.get_order("abc").await);
    }

    #[tokio::test]
    async fn test_seed_samples() {
        let context = TestContext::setup().await;

        assert_eq!(4, context.driver().seed_samples().await.unwrap());
        assert_eq!(Status::Payed, context.get_order("3").await.status());
        assert_eq!(
            "4111-1111-1111-1111",
            context.get_order("3").await.payment().unwrap().as_str()
        );

        assert_eq!(0, context.driver().seed_samples().await.unwrap());
    }

    #[tokio::test]
    async fn test_seed_samples_keeps_existing() {
        let context = TestContext::setup().await;
        let existing = context.create_order("2", Status::Shipped).await;

        assert_eq!(3, context.driver().seed_samples().await.unwrap());
        assert_eq!(existing, context.get_order("2").await);
        assert!(context.has_order("1").await);
        assert!(context.has_order("4").await);
    }

    #[test]
    fn test_sample_orders_are_valid() {
        assert_eq!(4, sample_orders().len());
    }
}
