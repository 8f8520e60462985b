//! In-process document store backed by `DashMap`.
//!
//! Each map entry is one document. Stock adjustments run under the entry's
//! write lock, which makes them atomic per product.

use std::sync::Arc;

use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use uuid::Uuid;

use crate::contract::model::{Cart, Order, OrderStatus, Product, ProductPatch};
use crate::domain::repo::{CartsRepository, OrdersRepository, ProductsRepository, Reservation};

/// Shared collections; clone freely, all clones see the same data.
#[derive(Clone, Default)]
pub struct MemoryStore {
    products: Arc<DashMap<Uuid, Product>>,
    carts: Arc<DashMap<Uuid, Cart>>,
    orders: Arc<DashMap<Uuid, Order>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ProductsRepository for MemoryStore {
    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<Product>> {
        Ok(self.products.get(&id).map(|p| p.value().clone()))
    }

    async fn list(&self, category: Option<&str>) -> anyhow::Result<Vec<Product>> {
        let mut out: Vec<Product> = self
            .products
            .iter()
            .filter(|p| category.map_or(true, |c| p.category == c))
            .map(|p| p.value().clone())
            .collect();
        out.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.name.cmp(&b.name)));
        Ok(out)
    }

    async fn name_taken(&self, name: &str, except: Option<Uuid>) -> anyhow::Result<bool> {
        Ok(self
            .products
            .iter()
            .any(|p| p.name == name && Some(p.id) != except))
    }

    async fn insert(&self, p: Product) -> anyhow::Result<()> {
        match self.products.entry(p.id) {
            Entry::Occupied(_) => anyhow::bail!("product {} already exists", p.id),
            Entry::Vacant(slot) => {
                slot.insert(p);
                Ok(())
            }
        }
    }

    async fn update(&self, id: Uuid, patch: &ProductPatch) -> anyhow::Result<Option<Product>> {
        let Some(mut p) = self.products.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(name) = &patch.name {
            p.name = name.clone();
        }
        if let Some(description) = &patch.description {
            p.description = Some(description.clone());
        }
        if let Some(category) = &patch.category {
            p.category = category.clone();
        }
        if let Some(price) = patch.price {
            p.price = price;
        }
        if let Some(stock) = patch.stock {
            p.stock = stock;
        }
        p.updated_at = chrono::Utc::now();
        Ok(Some(p.value().clone()))
    }

    async fn delete(&self, id: Uuid) -> anyhow::Result<Option<Product>> {
        Ok(self.products.remove(&id).map(|(_, p)| p))
    }

    async fn delete_all(&self) -> anyhow::Result<u64> {
        let count = self.products.len() as u64;
        self.products.clear();
        Ok(count)
    }

    async fn reserve(&self, id: Uuid, qty: u32) -> anyhow::Result<Reservation> {
        let Some(mut product) = self.products.get_mut(&id) else {
            return Ok(Reservation::Missing);
        };
        if product.stock < qty {
            return Ok(Reservation::Insufficient {
                available: product.stock,
            });
        }
        product.stock -= qty;
        Ok(Reservation::Reserved)
    }

    async fn release(&self, id: Uuid, qty: u32) -> anyhow::Result<bool> {
        match self.products.get_mut(&id) {
            Some(mut product) => {
                product.stock = product.stock.saturating_add(qty);
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[async_trait]
impl CartsRepository for MemoryStore {
    async fn find_by_user(&self, user_id: Uuid) -> anyhow::Result<Option<Cart>> {
        Ok(self.carts.get(&user_id).map(|c| c.value().clone()))
    }

    async fn save(&self, cart: Cart) -> anyhow::Result<()> {
        self.carts.insert(cart.user_id, cart);
        Ok(())
    }
}

#[async_trait]
impl OrdersRepository for MemoryStore {
    async fn insert(&self, order: Order) -> anyhow::Result<()> {
        self.orders.insert(order.id, order);
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<Order>> {
        Ok(self.orders.get(&id).map(|o| o.value().clone()))
    }

    async fn list_all(&self) -> anyhow::Result<Vec<Order>> {
        Ok(newest_first(self.orders.iter().map(|o| o.value().clone()).collect()))
    }

    async fn list_by_user(&self, user_id: Uuid) -> anyhow::Result<Vec<Order>> {
        Ok(newest_first(
            self.orders
                .iter()
                .filter(|o| o.user_id == user_id)
                .map(|o| o.value().clone())
                .collect(),
        ))
    }

    async fn transition(
        &self,
        id: Uuid,
        from: OrderStatus,
        to: OrderStatus,
    ) -> anyhow::Result<Option<Order>> {
        let Some(mut o) = self.orders.get_mut(&id) else {
            return Ok(None);
        };
        if o.status != from {
            return Ok(None);
        }
        o.status = to;
        o.updated_at = chrono::Utc::now();
        Ok(Some(o.value().clone()))
    }

    async fn delete(&self, id: Uuid) -> anyhow::Result<Option<Order>> {
        Ok(self.orders.remove(&id).map(|(_, o)| o))
    }
}

fn newest_first(mut orders: Vec<Order>) -> Vec<Order> {
    orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    orders
}
