use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, instrument};
use uuid::Uuid;

use crate::contract::model::{Cart, CartLine, CartLineView, CartView};
use crate::domain::catalog::CatalogService;
use crate::domain::error::DomainError;
use crate::domain::repo::CartsRepository;

/// Per-user cart with stock pre-reservation.
///
/// Every mutation is a two-step saga over the product and cart documents.
/// Each step is atomic on its own; nothing rolls back a completed step when
/// the next one fails.
#[derive(Clone)]
pub struct CartService {
    carts: Arc<dyn CartsRepository>,
    catalog: Arc<CatalogService>,
}

impl CartService {
    pub fn new(carts: Arc<dyn CartsRepository>, catalog: Arc<CatalogService>) -> Self {
        Self { carts, catalog }
    }

    /// Return the user's cart, creating an empty one on first access.
    #[instrument(name = "storefront.cart.get_cart", skip(self), fields(user_id = %user_id))]
    pub async fn get_cart(&self, user_id: Uuid) -> Result<CartView, DomainError> {
        let cart = match self.load(user_id).await? {
            Some(cart) => cart,
            None => {
                debug!("No cart yet, creating an empty one");
                let cart = Cart::empty(user_id);
                self.save(cart.clone()).await?;
                cart
            }
        };
        self.view(cart).await
    }

    /// Reserve `quantity` units, then add them to the cart line.
    #[instrument(
        name = "storefront.cart.add_item",
        skip(self),
        fields(user_id = %user_id, product_id = %product_id)
    )]
    pub async fn add_item(
        &self,
        user_id: Uuid,
        product_id: Uuid,
        quantity: u32,
    ) -> Result<CartView, DomainError> {
        if quantity == 0 {
            return Err(DomainError::validation("quantity", "must be at least 1"));
        }

        self.catalog.reserve(product_id, quantity).await?;

        let mut cart = self
            .load(user_id)
            .await?
            .unwrap_or_else(|| Cart::empty(user_id));
        match cart.items.iter_mut().find(|l| l.product_id == product_id) {
            Some(line) => line.quantity = line.quantity.saturating_add(quantity),
            None => cart.items.push(CartLine {
                product_id,
                quantity,
            }),
        }
        cart.updated_at = Utc::now();
        self.save(cart.clone()).await?;

        info!("Added {} unit(s) to cart", quantity);
        self.view(cart).await
    }

    /// Take `quantity` units off a cart line and give them back to stock.
    ///
    /// The line is dropped once it reaches zero. At most the line's quantity
    /// is released, and nothing when the product no longer exists.
    #[instrument(
        name = "storefront.cart.remove_item",
        skip(self),
        fields(user_id = %user_id, product_id = %product_id)
    )]
    pub async fn remove_item(
        &self,
        user_id: Uuid,
        product_id: Uuid,
        quantity: u32,
    ) -> Result<CartView, DomainError> {
        if quantity == 0 {
            return Err(DomainError::validation("quantity", "must be at least 1"));
        }

        let mut cart = self
            .load(user_id)
            .await?
            .ok_or_else(|| DomainError::cart_not_found(user_id))?;
        let idx = cart
            .items
            .iter()
            .position(|l| l.product_id == product_id)
            .ok_or_else(|| DomainError::item_not_in_cart(product_id))?;

        let held = cart.items[idx].quantity;
        let released = quantity.min(held);
        if held <= quantity {
            cart.items.remove(idx);
        } else {
            cart.items[idx].quantity = held - quantity;
        }
        cart.updated_at = Utc::now();
        self.save(cart.clone()).await?;

        self.catalog.release(product_id, released).await?;

        info!("Removed {} unit(s) from cart", released);
        self.view(cart).await
    }

    /// Give every reserved unit back to stock and empty the cart.
    #[instrument(name = "storefront.cart.clear_cart", skip(self), fields(user_id = %user_id))]
    pub async fn clear_cart(&self, user_id: Uuid) -> Result<CartView, DomainError> {
        let mut cart = self
            .load(user_id)
            .await?
            .ok_or_else(|| DomainError::cart_not_found(user_id))?;

        for line in &cart.items {
            self.catalog.release(line.product_id, line.quantity).await?;
        }

        let lines = cart.items.len();
        cart.items.clear();
        cart.updated_at = Utc::now();
        self.save(cart.clone()).await?;

        info!("Cleared {} line(s) from cart", lines);
        self.view(cart).await
    }

    async fn load(&self, user_id: Uuid) -> Result<Option<Cart>, DomainError> {
        self.carts
            .find_by_user(user_id)
            .await
            .map_err(|e| DomainError::database(e.to_string()))
    }

    async fn save(&self, cart: Cart) -> Result<(), DomainError> {
        self.carts
            .save(cart)
            .await
            .map_err(|e| DomainError::database(e.to_string()))
    }

    /// Join each line with the current product record.
    async fn view(&self, cart: Cart) -> Result<CartView, DomainError> {
        let mut items = Vec::with_capacity(cart.items.len());
        for line in cart.items {
            let product = self.catalog.find(line.product_id).await?;
            items.push(CartLineView {
                product_id: line.product_id,
                quantity: line.quantity,
                product,
            });
        }
        Ok(CartView {
            user_id: cart.user_id,
            items,
            updated_at: cart.updated_at,
        })
    }
}
