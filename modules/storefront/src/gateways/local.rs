use async_trait::async_trait;
use std::sync::Arc;
use uuid::Uuid;

use crate::contract::{
    client::StorefrontApi,
    error::StorefrontError,
    model::{
        CartView, NewOrder, NewProduct, Order, OrderListing, OrderStatus, Principal, Product,
        ProductPatch, Role,
    },
};
use crate::domain::access::require_role;
use crate::domain::cart_service::CartService;
use crate::domain::catalog::CatalogService;
use crate::domain::order_service::OrderService;

/// Local implementation of the StorefrontApi trait that delegates to the domain services
pub struct StorefrontLocalClient {
    catalog: Arc<CatalogService>,
    carts: Arc<CartService>,
    orders: Arc<OrderService>,
}

impl StorefrontLocalClient {
    pub fn new(catalog: Arc<CatalogService>, carts: Arc<CartService>, orders: Arc<OrderService>) -> Self {
        Self {
            catalog,
            carts,
            orders,
        }
    }
}

fn admin_only(principal: &Principal) -> Result<(), StorefrontError> {
    require_role(principal, Role::Admin).map_err(Into::into)
}

#[async_trait]
impl StorefrontApi for StorefrontLocalClient {
    async fn list_products(&self, category: Option<String>) -> Result<Vec<Product>, StorefrontError> {
        self.catalog
            .list_products(category.as_deref())
            .await
            .map_err(Into::into)
    }

    async fn get_product(&self, id: Uuid) -> Result<Product, StorefrontError> {
        self.catalog.get_product(id).await.map_err(Into::into)
    }

    async fn create_products(
        &self,
        principal: &Principal,
        batch: Vec<NewProduct>,
    ) -> Result<Vec<Product>, StorefrontError> {
        admin_only(principal)?;
        self.catalog.create_products(batch).await.map_err(Into::into)
    }

    async fn update_product(
        &self,
        principal: &Principal,
        id: Uuid,
        patch: ProductPatch,
    ) -> Result<Product, StorefrontError> {
        admin_only(principal)?;
        self.catalog
            .update_product(id, patch)
            .await
            .map_err(Into::into)
    }

    async fn delete_product(&self, principal: &Principal, id: Uuid) -> Result<Product, StorefrontError> {
        admin_only(principal)?;
        self.catalog.delete_product(id).await.map_err(Into::into)
    }

    async fn delete_all_products(&self, principal: &Principal) -> Result<u64, StorefrontError> {
        admin_only(principal)?;
        self.catalog.delete_all_products().await.map_err(Into::into)
    }

    async fn get_cart(&self, principal: &Principal) -> Result<CartView, StorefrontError> {
        self.carts
            .get_cart(principal.user_id)
            .await
            .map_err(Into::into)
    }

    async fn add_to_cart(
        &self,
        principal: &Principal,
        product_id: Uuid,
        quantity: u32,
    ) -> Result<CartView, StorefrontError> {
        self.carts
            .add_item(principal.user_id, product_id, quantity)
            .await
            .map_err(Into::into)
    }

    async fn remove_from_cart(
        &self,
        principal: &Principal,
        product_id: Uuid,
        quantity: u32,
    ) -> Result<CartView, StorefrontError> {
        self.carts
            .remove_item(principal.user_id, product_id, quantity)
            .await
            .map_err(Into::into)
    }

    async fn clear_cart(&self, principal: &Principal) -> Result<CartView, StorefrontError> {
        self.carts
            .clear_cart(principal.user_id)
            .await
            .map_err(Into::into)
    }

    async fn place_order(&self, principal: &Principal, order: NewOrder) -> Result<Order, StorefrontError> {
        self.orders
            .place_order(principal, order)
            .await
            .map_err(Into::into)
    }

    async fn list_orders(&self, principal: &Principal) -> Result<OrderListing, StorefrontError> {
        self.orders.list_orders(principal).await.map_err(Into::into)
    }

    async fn get_order(&self, principal: &Principal, id: Uuid) -> Result<Order, StorefrontError> {
        self.orders.get_order(principal, id).await.map_err(Into::into)
    }

    async fn update_order_status(
        &self,
        principal: &Principal,
        id: Uuid,
        status: OrderStatus,
    ) -> Result<Order, StorefrontError> {
        admin_only(principal)?;
        self.orders
            .update_status(principal, id, status)
            .await
            .map_err(Into::into)
    }

    async fn cancel_order(&self, principal: &Principal, id: Uuid) -> Result<Order, StorefrontError> {
        self.orders.cancel(principal, id).await.map_err(Into::into)
    }

    async fn delete_order(&self, principal: &Principal, id: Uuid) -> Result<Order, StorefrontError> {
        self.orders.delete(principal, id).await.map_err(Into::into)
    }
}
