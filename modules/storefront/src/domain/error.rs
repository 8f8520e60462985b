use thiserror::Error;
use uuid::Uuid;

use crate::contract::error::StorefrontError;
use crate::contract::model::OrderStatus;

/// Domain-specific errors using thiserror
#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Product not found: {id}")]
    ProductNotFound { id: Uuid },

    #[error("No products found in category '{category}'")]
    EmptyCategory { category: String },

    #[error("Catalog is empty")]
    EmptyCatalog,

    #[error("Product with name '{name}' already exists")]
    ProductNameConflict { name: String },

    #[error("Cart not found for user {user_id}")]
    CartNotFound { user_id: Uuid },

    #[error("Product {product_id} is not in the cart")]
    ItemNotInCart { product_id: Uuid },

    #[error(
        "Product {product_id} not available in requested quantity: requested {requested}, available {available}"
    )]
    InsufficientStock {
        product_id: Uuid,
        requested: u32,
        available: u32,
    },

    #[error("Order must contain at least one product")]
    EmptyOrder,

    #[error("Order not found: {id}")]
    OrderNotFound { id: Uuid },

    #[error("Access denied: {reason}")]
    Forbidden { reason: String },

    #[error("Invalid order status '{value}'")]
    InvalidStatus { value: String },

    #[error("Cannot move order from {from} to {to}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },

    #[error("Validation failed: {field}: {message}")]
    Validation { field: String, message: String },

    #[error("Database error: {message}")]
    Database { message: String },
}

impl DomainError {
    pub fn product_not_found(id: Uuid) -> Self {
        Self::ProductNotFound { id }
    }

    pub fn empty_category(category: impl Into<String>) -> Self {
        Self::EmptyCategory {
            category: category.into(),
        }
    }

    pub fn name_conflict(name: impl Into<String>) -> Self {
        Self::ProductNameConflict { name: name.into() }
    }

    pub fn cart_not_found(user_id: Uuid) -> Self {
        Self::CartNotFound { user_id }
    }

    pub fn item_not_in_cart(product_id: Uuid) -> Self {
        Self::ItemNotInCart { product_id }
    }

    pub fn insufficient_stock(product_id: Uuid, requested: u32, available: u32) -> Self {
        Self::InsufficientStock {
            product_id,
            requested,
            available,
        }
    }

    pub fn empty_order() -> Self {
        Self::EmptyOrder
    }

    pub fn order_not_found(id: Uuid) -> Self {
        Self::OrderNotFound { id }
    }

    pub fn forbidden(reason: impl Into<String>) -> Self {
        Self::Forbidden {
            reason: reason.into(),
        }
    }

    pub fn invalid_status(value: impl Into<String>) -> Self {
        Self::InvalidStatus {
            value: value.into(),
        }
    }

    pub fn invalid_transition(from: OrderStatus, to: OrderStatus) -> Self {
        Self::InvalidTransition { from, to }
    }

    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn database(message: impl Into<String>) -> Self {
        Self::Database {
            message: message.into(),
        }
    }
}

impl From<DomainError> for StorefrontError {
    fn from(e: DomainError) -> Self {
        let message = e.to_string();
        match e {
            DomainError::ProductNotFound { .. }
            | DomainError::EmptyCategory { .. }
            | DomainError::EmptyCatalog
            | DomainError::CartNotFound { .. }
            | DomainError::ItemNotInCart { .. }
            | DomainError::OrderNotFound { .. } => StorefrontError::not_found(message),
            DomainError::ProductNameConflict { .. } => StorefrontError::conflict(message),
            DomainError::InsufficientStock { .. } => StorefrontError::insufficient_stock(message),
            DomainError::EmptyOrder
            | DomainError::InvalidStatus { .. }
            | DomainError::Validation { .. } => StorefrontError::invalid_input(message),
            DomainError::Forbidden { .. } => StorefrontError::forbidden(message),
            DomainError::InvalidTransition { .. } => StorefrontError::invalid_transition(message),
            DomainError::Database { .. } => StorefrontError::internal(),
        }
    }
}
