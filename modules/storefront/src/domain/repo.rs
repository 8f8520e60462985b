use async_trait::async_trait;
use uuid::Uuid;

use crate::contract::model::{Cart, Order, OrderStatus, Product, ProductPatch};

/// Outcome of an atomic stock reservation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reservation {
    /// Stock was decremented.
    Reserved,
    /// Stock was left untouched because fewer than the requested units remain.
    Insufficient { available: u32 },
    /// No such product.
    Missing,
}

/// Port for the product documents, including the stock-adjustment contract.
///
/// `reserve` and `release` must be single-document atomic updates at the
/// storage layer: two concurrent reservations of the last unit must not both
/// succeed.
#[async_trait]
pub trait ProductsRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<Product>>;
    /// All products, optionally restricted to one category, oldest first.
    async fn list(&self, category: Option<&str>) -> anyhow::Result<Vec<Product>>;
    /// Check name uniqueness, ignoring `except` (the product being renamed).
    async fn name_taken(&self, name: &str, except: Option<Uuid>) -> anyhow::Result<bool>;
    async fn insert(&self, p: Product) -> anyhow::Result<()>;
    /// Write the fields set in `patch` and nothing else; stock is only
    /// overwritten when `patch.stock` is set. Returns the stored product, or
    /// None if it is gone.
    async fn update(&self, id: Uuid, patch: &ProductPatch) -> anyhow::Result<Option<Product>>;
    /// Delete by id, returning the removed document.
    async fn delete(&self, id: Uuid) -> anyhow::Result<Option<Product>>;
    /// Delete every product. Returns the number removed.
    async fn delete_all(&self) -> anyhow::Result<u64>;
    /// Atomically decrement stock by `qty` if at least `qty` units remain.
    async fn reserve(&self, id: Uuid, qty: u32) -> anyhow::Result<Reservation>;
    /// Atomically increment stock by `qty`. Returns false if the product is gone.
    ///
    /// There is no upper bound: releasing more than was reserved is accepted.
    async fn release(&self, id: Uuid, qty: u32) -> anyhow::Result<bool>;
}

/// Port for cart documents (one per user).
#[async_trait]
pub trait CartsRepository: Send + Sync {
    async fn find_by_user(&self, user_id: Uuid) -> anyhow::Result<Option<Cart>>;
    /// Insert or replace the whole cart document.
    async fn save(&self, cart: Cart) -> anyhow::Result<()>;
}

/// Port for order documents.
#[async_trait]
pub trait OrdersRepository: Send + Sync {
    async fn insert(&self, order: Order) -> anyhow::Result<()>;
    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<Order>>;
    /// Every order, newest first.
    async fn list_all(&self) -> anyhow::Result<Vec<Order>>;
    /// Orders owned by `user_id`, newest first.
    async fn list_by_user(&self, user_id: Uuid) -> anyhow::Result<Vec<Order>>;
    /// Atomically move the order from `from` to `to`. Returns the updated
    /// order, or None when it is gone or no longer in `from`.
    async fn transition(
        &self,
        id: Uuid,
        from: OrderStatus,
        to: OrderStatus,
    ) -> anyhow::Result<Option<Order>>;
    /// Delete by id, returning the removed document.
    async fn delete(&self, id: Uuid) -> anyhow::Result<Option<Order>>;
}
