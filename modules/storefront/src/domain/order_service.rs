use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use tracing::{debug, info, instrument};
use uuid::Uuid;

use crate::contract::model::{NewOrder, Order, OrderListing, OrderStatus, Principal};
use crate::domain::catalog::CatalogService;
use crate::domain::error::DomainError;
use crate::domain::repo::OrdersRepository;

/// Group key for orders placed without a known e-mail.
pub const UNKNOWN_USER: &str = "Unknown User";

/// Order lifecycle. Stock is only touched when an order is cancelled.
#[derive(Clone)]
pub struct OrderService {
    orders: Arc<dyn OrdersRepository>,
    catalog: Arc<CatalogService>,
}

impl OrderService {
    pub fn new(orders: Arc<dyn OrdersRepository>, catalog: Arc<CatalogService>) -> Self {
        Self { orders, catalog }
    }

    #[instrument(
        name = "storefront.orders.place_order",
        skip(self, principal, new),
        fields(user_id = %principal.user_id, lines = new.products.len())
    )]
    pub async fn place_order(&self, principal: &Principal, new: NewOrder) -> Result<Order, DomainError> {
        if new.products.is_empty() {
            return Err(DomainError::empty_order());
        }
        if let Some(line) = new.products.iter().find(|l| l.quantity == 0) {
            return Err(DomainError::validation(
                "products",
                format!("quantity for product {} must be at least 1", line.product_id),
            ));
        }
        if new.total_price < Decimal::ZERO {
            return Err(DomainError::validation("totalPrice", "must not be negative"));
        }

        let now = Utc::now();
        let order = Order {
            id: Uuid::new_v4(),
            user_id: principal.user_id,
            user_email: principal.email.clone(),
            products: new.products,
            total_price: new.total_price,
            status: OrderStatus::Pending,
            created_at: now,
            updated_at: now,
        };
        self.orders
            .insert(order.clone())
            .await
            .map_err(|e| DomainError::database(e.to_string()))?;

        info!("Placed order {}", order.id);
        Ok(order)
    }

    /// Admins get every order grouped by owner e-mail; everyone else their own.
    #[instrument(name = "storefront.orders.list_orders", skip(self, principal), fields(user_id = %principal.user_id))]
    pub async fn list_orders(&self, principal: &Principal) -> Result<OrderListing, DomainError> {
        if !principal.is_admin() {
            let own = self
                .orders
                .list_by_user(principal.user_id)
                .await
                .map_err(|e| DomainError::database(e.to_string()))?;
            debug!("Listed {} own order(s)", own.len());
            return Ok(OrderListing::Own(own));
        }

        let all = self
            .orders
            .list_all()
            .await
            .map_err(|e| DomainError::database(e.to_string()))?;
        debug!("Listed {} order(s) across all users", all.len());
        Ok(OrderListing::Grouped(group_by_email(all)))
    }

    #[instrument(name = "storefront.orders.get_order", skip(self, principal), fields(order_id = %id))]
    pub async fn get_order(&self, principal: &Principal, id: Uuid) -> Result<Order, DomainError> {
        self.visible(principal, id).await
    }

    /// Move an order to `next`. A move to `Cancelled` takes the cancel path.
    ///
    /// Callers gate this on the admin role.
    #[instrument(
        name = "storefront.orders.update_status",
        skip(self, principal),
        fields(order_id = %id, status = %next)
    )]
    pub async fn update_status(
        &self,
        principal: &Principal,
        id: Uuid,
        next: OrderStatus,
    ) -> Result<Order, DomainError> {
        if next == OrderStatus::Cancelled {
            return self.cancel(principal, id).await;
        }

        let order = self.visible(principal, id).await?;
        if !order.status.can_transition_to(next) {
            return Err(DomainError::invalid_transition(order.status, next));
        }

        let updated = self.claim(&order, next).await?;
        info!("Order moved from {} to {}", order.status, next);
        Ok(updated)
    }

    /// Cancel a pending order: persist `Cancelled`, then restore stock for
    /// every line. Lines whose product is gone are skipped.
    #[instrument(name = "storefront.orders.cancel", skip(self, principal), fields(order_id = %id))]
    pub async fn cancel(&self, principal: &Principal, id: Uuid) -> Result<Order, DomainError> {
        let order = self.visible(principal, id).await?;
        if !order.status.can_transition_to(OrderStatus::Cancelled) {
            return Err(DomainError::invalid_transition(
                order.status,
                OrderStatus::Cancelled,
            ));
        }

        // Only the caller that wins the Pending -> Cancelled swap returns stock
        let cancelled = self.claim(&order, OrderStatus::Cancelled).await?;
        for line in &order.products {
            self.catalog.release(line.product_id, line.quantity).await?;
        }

        info!("Cancelled order, {} line(s) returned to stock", order.products.len());
        Ok(cancelled)
    }

    /// Delete an order. Stock is never restored here.
    #[instrument(name = "storefront.orders.delete", skip(self, principal), fields(order_id = %id))]
    pub async fn delete(&self, principal: &Principal, id: Uuid) -> Result<Order, DomainError> {
        self.visible(principal, id).await?;
        let deleted = self
            .orders
            .delete(id)
            .await
            .map_err(|e| DomainError::database(e.to_string()))?
            .ok_or_else(|| DomainError::order_not_found(id))?;
        info!("Deleted order");
        Ok(deleted)
    }

    /// Load an order the principal may see. Missing and foreign orders are
    /// indistinguishable to the caller.
    async fn visible(&self, principal: &Principal, id: Uuid) -> Result<Order, DomainError> {
        let order = self
            .orders
            .find_by_id(id)
            .await
            .map_err(|e| DomainError::database(e.to_string()))?
            .ok_or_else(|| DomainError::order_not_found(id))?;
        if !principal.can_see(order.user_id) {
            debug!(owner = %order.user_id, "Order belongs to another user");
            return Err(DomainError::order_not_found(id));
        }
        Ok(order)
    }

    /// Move `order` to `next` if its stored status is still the one we read.
    /// Losing to a concurrent change is reported from the status it holds now.
    async fn claim(&self, order: &Order, next: OrderStatus) -> Result<Order, DomainError> {
        let moved = self
            .orders
            .transition(order.id, order.status, next)
            .await
            .map_err(|e| DomainError::database(e.to_string()))?;
        if let Some(updated) = moved {
            return Ok(updated);
        }

        let current = self
            .orders
            .find_by_id(order.id)
            .await
            .map_err(|e| DomainError::database(e.to_string()))?
            .ok_or_else(|| DomainError::order_not_found(order.id))?;
        debug!(status = %current.status, "Order changed concurrently");
        Err(DomainError::invalid_transition(current.status, next))
    }
}

/// Parse a status value from the wire.
pub fn parse_status(value: &str) -> Result<OrderStatus, DomainError> {
    value
        .parse::<OrderStatus>()
        .map_err(|e| DomainError::invalid_status(e.0))
}

/// Group orders by owner e-mail, keeping the incoming order inside each group.
fn group_by_email(orders: Vec<Order>) -> BTreeMap<String, Vec<Order>> {
    let mut grouped: BTreeMap<String, Vec<Order>> = BTreeMap::new();
    for order in orders {
        let key = order
            .user_email
            .clone()
            .unwrap_or_else(|| UNKNOWN_USER.to_string());
        grouped.entry(key).or_default().push(order);
    }
    grouped
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use async_trait::async_trait;

    use crate::contract::model::{NewProduct, OrderLine};
    use crate::domain::catalog::CatalogConfig;
    use crate::infra::storage::MemoryStore;

    /// Orders repository whose reads take a while, so concurrent callers
    /// all see the same snapshot before either writes.
    struct SlowReads(MemoryStore);

    #[async_trait]
    impl OrdersRepository for SlowReads {
        async fn insert(&self, order: Order) -> anyhow::Result<()> {
            OrdersRepository::insert(&self.0, order).await
        }
        async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<Order>> {
            tokio::time::sleep(Duration::from_millis(50)).await;
            OrdersRepository::find_by_id(&self.0, id).await
        }
        async fn list_all(&self) -> anyhow::Result<Vec<Order>> {
            self.0.list_all().await
        }
        async fn list_by_user(&self, user_id: Uuid) -> anyhow::Result<Vec<Order>> {
            self.0.list_by_user(user_id).await
        }
        async fn transition(
            &self,
            id: Uuid,
            from: OrderStatus,
            to: OrderStatus,
        ) -> anyhow::Result<Option<Order>> {
            self.0.transition(id, from, to).await
        }
        async fn delete(&self, id: Uuid) -> anyhow::Result<Option<Order>> {
            OrdersRepository::delete(&self.0, id).await
        }
    }

    /// Stock 5, three units held by a cart and ordered.
    async fn pending_order() -> (OrderService, Arc<CatalogService>, Principal, Order) {
        let store = MemoryStore::new();
        let catalog = Arc::new(CatalogService::new(
            Arc::new(store.clone()),
            CatalogConfig::default(),
        ));
        let service = OrderService::new(Arc::new(SlowReads(store)), catalog.clone());

        let product = catalog
            .create_product(NewProduct {
                name: "Toddler hoodie".to_string(),
                description: None,
                category: "Kids Clothes".to_string(),
                price: Decimal::new(999, 2),
                stock: 5,
            })
            .await
            .unwrap();
        catalog.reserve(product.id, 3).await.unwrap();

        let owner = Principal::user(Uuid::new_v4());
        let order = service
            .place_order(
                &owner,
                NewOrder {
                    products: vec![OrderLine {
                        product_id: product.id,
                        quantity: 3,
                    }],
                    total_price: Decimal::new(2997, 2),
                },
            )
            .await
            .unwrap();
        (service, catalog, owner, order)
    }

    fn stock_product(order: &Order) -> Uuid {
        order.products[0].product_id
    }

    #[tokio::test]
    async fn double_cancel_restores_stock_once() {
        let (service, catalog, owner, order) = pending_order().await;

        let (first, second) = tokio::join!(
            service.cancel(&owner, order.id),
            service.cancel(&owner, order.id)
        );

        assert_eq!(
            u8::from(first.is_ok()) + u8::from(second.is_ok()),
            1,
            "exactly one cancel wins"
        );
        let loser = first.err().or(second.err()).unwrap();
        assert!(matches!(
            loser,
            DomainError::InvalidTransition {
                from: OrderStatus::Cancelled,
                to: OrderStatus::Cancelled
            }
        ));
        assert_eq!(catalog.get_product(stock_product(&order)).await.unwrap().stock, 5);
    }

    #[tokio::test]
    async fn cancel_racing_processing_keeps_stock_consistent() {
        let (service, catalog, owner, order) = pending_order().await;
        let boss = Principal::admin(Uuid::new_v4());

        let (cancelled, processing) = tokio::join!(
            service.cancel(&owner, order.id),
            service.update_status(&boss, order.id, OrderStatus::Processing)
        );
        assert!(cancelled.is_ok() != processing.is_ok(), "exactly one move wins");

        let stored = service.get_order(&boss, order.id).await.unwrap();
        let stock = catalog.get_product(stock_product(&order)).await.unwrap().stock;
        if cancelled.is_ok() {
            assert_eq!(stored.status, OrderStatus::Cancelled);
            assert_eq!(stock, 5);
        } else {
            assert_eq!(stored.status, OrderStatus::Processing);
            assert_eq!(stock, 2);
        }
    }

    fn order(email: Option<&str>) -> Order {
        let now = Utc::now();
        Order {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            user_email: email.map(str::to_string),
            products: vec![OrderLine {
                product_id: Uuid::new_v4(),
                quantity: 1,
            }],
            total_price: Decimal::ONE,
            status: OrderStatus::Pending,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn grouping_falls_back_to_unknown_user() {
        let a1 = order(Some("a@example.com"));
        let anon = order(None);
        let a2 = order(Some("a@example.com"));
        let grouped = group_by_email(vec![a1.clone(), anon.clone(), a2.clone()]);

        assert_eq!(grouped.len(), 2);
        assert_eq!(grouped["a@example.com"], vec![a1, a2]);
        assert_eq!(grouped[UNKNOWN_USER], vec![anon]);
    }

    #[test]
    fn unknown_status_is_rejected() {
        assert_eq!(parse_status("Shipped").ok(), Some(OrderStatus::Shipped));
        assert!(matches!(
            parse_status("Returned"),
            Err(DomainError::InvalidStatus { value }) if value == "Returned"
        ));
    }
}
