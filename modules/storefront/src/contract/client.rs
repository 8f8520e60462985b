use async_trait::async_trait;
use uuid::Uuid;

use crate::contract::{
    error::StorefrontError,
    model::{
        CartView, NewOrder, NewProduct, Order, OrderListing, OrderStatus, Principal, Product,
        ProductPatch,
    },
};

/// Public API trait for the storefront module that other modules can use.
///
/// Every call carries the acting principal; role-restricted operations
/// fail with `Forbidden` for non-admins.
#[async_trait]
pub trait StorefrontApi: Send + Sync {
    /// List products, optionally within one category
    async fn list_products(&self, category: Option<String>) -> Result<Vec<Product>, StorefrontError>;

    /// Get a product by ID
    async fn get_product(&self, id: Uuid) -> Result<Product, StorefrontError>;

    /// Create one or more products (admin)
    async fn create_products(
        &self,
        principal: &Principal,
        batch: Vec<NewProduct>,
    ) -> Result<Vec<Product>, StorefrontError>;

    /// Update a product with partial data (admin)
    async fn update_product(
        &self,
        principal: &Principal,
        id: Uuid,
        patch: ProductPatch,
    ) -> Result<Product, StorefrontError>;

    /// Delete a product by ID (admin)
    async fn delete_product(&self, principal: &Principal, id: Uuid) -> Result<Product, StorefrontError>;

    /// Delete every product (admin)
    async fn delete_all_products(&self, principal: &Principal) -> Result<u64, StorefrontError>;

    async fn get_cart(&self, principal: &Principal) -> Result<CartView, StorefrontError>;

    async fn add_to_cart(
        &self,
        principal: &Principal,
        product_id: Uuid,
        quantity: u32,
    ) -> Result<CartView, StorefrontError>;

    async fn remove_from_cart(
        &self,
        principal: &Principal,
        product_id: Uuid,
        quantity: u32,
    ) -> Result<CartView, StorefrontError>;

    async fn clear_cart(&self, principal: &Principal) -> Result<CartView, StorefrontError>;

    async fn place_order(&self, principal: &Principal, order: NewOrder) -> Result<Order, StorefrontError>;

    async fn list_orders(&self, principal: &Principal) -> Result<OrderListing, StorefrontError>;

    async fn get_order(&self, principal: &Principal, id: Uuid) -> Result<Order, StorefrontError>;

    /// Move an order through its lifecycle (admin)
    async fn update_order_status(
        &self,
        principal: &Principal,
        id: Uuid,
        status: OrderStatus,
    ) -> Result<Order, StorefrontError>;

    async fn cancel_order(&self, principal: &Principal, id: Uuid) -> Result<Order, StorefrontError>;

    async fn delete_order(&self, principal: &Principal, id: Uuid) -> Result<Order, StorefrontError>;
}
