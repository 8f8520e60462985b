use api_errors::ProblemResponse;

use crate::domain::error::DomainError;
use crate::errors::ErrorCode;

/// Map domain error to RFC9457 ProblemResponse
pub fn map_domain_error(e: &DomainError, instance: &str) -> ProblemResponse {
    let code = match e {
        DomainError::ProductNotFound { .. } => ErrorCode::ProductNotFound,
        DomainError::EmptyCategory { .. } => ErrorCode::CategoryEmpty,
        DomainError::EmptyCatalog => ErrorCode::CatalogEmpty,
        DomainError::ProductNameConflict { .. } => ErrorCode::ProductNameConflict,
        DomainError::CartNotFound { .. } => ErrorCode::CartNotFound,
        DomainError::ItemNotInCart { .. } => ErrorCode::ItemNotInCart,
        DomainError::InsufficientStock { .. } => ErrorCode::InsufficientStock,
        DomainError::EmptyOrder => ErrorCode::EmptyOrder,
        DomainError::OrderNotFound { .. } => ErrorCode::OrderNotFound,
        DomainError::Forbidden { .. } => ErrorCode::Forbidden,
        DomainError::InvalidStatus { .. } => ErrorCode::InvalidStatus,
        DomainError::InvalidTransition { .. } => ErrorCode::InvalidTransition,
        DomainError::Validation { .. } => ErrorCode::Validation,
        DomainError::Database { .. } => {
            // Log the internal error details but don't expose them to the client
            tracing::error!(error = ?e, "Database error occurred");
            return ErrorCode::InternalDatabase
                .respond("An internal database error occurred", instance);
        }
    };
    code.respond(e.to_string(), instance)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contract::model::OrderStatus;
    use uuid::Uuid;

    #[test]
    fn not_found_kinds_keep_distinct_codes() {
        let no_cart = map_domain_error(&DomainError::cart_not_found(Uuid::nil()), "/cart/remove");
        let no_item =
            map_domain_error(&DomainError::item_not_in_cart(Uuid::nil()), "/cart/remove");
        assert_eq!(no_cart.0.status, 404);
        assert_eq!(no_item.0.status, 404);
        assert_ne!(no_cart.0.code, no_item.0.code);
        assert_eq!(no_item.0.instance, "/cart/remove");
    }

    #[test]
    fn stock_and_transition_failures_are_bad_requests() {
        let p = map_domain_error(&DomainError::insufficient_stock(Uuid::nil(), 3, 1), "/cart/add");
        assert_eq!(p.0.status, 400);
        assert_eq!(p.0.code, "STOREFRONT_INSUFFICIENT_STOCK");

        let p = map_domain_error(
            &DomainError::invalid_transition(OrderStatus::Shipped, OrderStatus::Cancelled),
            "/orders/x/cancel",
        );
        assert_eq!(p.0.status, 400);
        assert_eq!(p.0.code, "STOREFRONT_INVALID_TRANSITION");
    }

    #[test]
    fn database_details_are_not_leaked() {
        let p = map_domain_error(&DomainError::database("disk on fire"), "/products");
        assert_eq!(p.0.status, 500);
        assert!(!p.0.detail.contains("disk"));
    }
}
