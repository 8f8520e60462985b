//! Error catalog for the storefront module.
//!
//! Each code has a fixed HTTP status, title and type URL; handlers pick a
//! code and supply only the occurrence-specific detail.

use api_errors::{ErrDef, ProblemResponse};

macro_rules! catalog {
    ($( $variant:ident => ($status:literal, $title:literal, $code:literal) ),+ $(,)?) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        pub enum ErrorCode {
            $( $variant, )+
        }

        impl ErrorCode {
            pub const ALL: &'static [ErrorCode] = &[ $( ErrorCode::$variant, )+ ];

            pub const fn def(&self) -> ErrDef {
                match self {
                    $( ErrorCode::$variant => ErrDef {
                        status: $status,
                        title: $title,
                        code: $code,
                        type_url: concat!("https://errors.example.com/", $code),
                    }, )+
                }
            }
        }
    };
}

catalog! {
    ProductNotFound => (404, "Product Not Found", "STOREFRONT_PRODUCT_NOT_FOUND"),
    CategoryEmpty => (404, "No Products In Category", "STOREFRONT_CATEGORY_EMPTY"),
    CatalogEmpty => (404, "Catalog Empty", "STOREFRONT_CATALOG_EMPTY"),
    ProductNameConflict => (409, "Product Name Already Exists", "STOREFRONT_PRODUCT_NAME_CONFLICT"),
    CartNotFound => (404, "Cart Not Found", "STOREFRONT_CART_NOT_FOUND"),
    ItemNotInCart => (404, "Item Not In Cart", "STOREFRONT_ITEM_NOT_IN_CART"),
    InsufficientStock => (400, "Insufficient Stock", "STOREFRONT_INSUFFICIENT_STOCK"),
    EmptyOrder => (400, "Empty Order", "STOREFRONT_EMPTY_ORDER"),
    OrderNotFound => (404, "Order Not Found", "STOREFRONT_ORDER_NOT_FOUND"),
    InvalidStatus => (400, "Invalid Order Status", "STOREFRONT_INVALID_STATUS"),
    InvalidTransition => (400, "Invalid Status Transition", "STOREFRONT_INVALID_TRANSITION"),
    Validation => (400, "Validation Error", "STOREFRONT_VALIDATION"),
    BadRequest => (400, "Bad Request", "STOREFRONT_BAD_REQUEST"),
    Unauthorized => (401, "Unauthorized", "STOREFRONT_UNAUTHORIZED"),
    Forbidden => (403, "Forbidden", "STOREFRONT_FORBIDDEN"),
    InternalDatabase => (500, "Internal Error", "STOREFRONT_INTERNAL_DATABASE"),
    Internal => (500, "Internal Error", "STOREFRONT_INTERNAL"),
}

impl ErrorCode {
    /// Response for `instance`, tagged with the current span id when inside one.
    pub fn respond(&self, detail: impl Into<String>, instance: &str) -> ProblemResponse {
        self.def().respond(detail, instance)
    }
}
