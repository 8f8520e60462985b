use std::sync::Arc;

use axum::http::{header, HeaderValue};
use axum::routing::{get, patch, post};
use axum::{Extension, Router};
use tower_http::set_header::SetResponseHeaderLayer;

use crate::api::rest::handlers;
use crate::domain::cart_service::CartService;
use crate::domain::catalog::CatalogService;
use crate::domain::order_service::OrderService;
use crate::domain::ports::TokenVerifier;

/// Services the REST layer hands to its handlers.
#[derive(Clone)]
pub struct RestServices {
    pub catalog: Arc<CatalogService>,
    pub carts: Arc<CartService>,
    pub orders: Arc<OrderService>,
    pub verifier: Arc<dyn TokenVerifier>,
}

pub fn register_routes(router: Router, services: RestServices) -> Router {
    let catalog = Router::new()
        .route(
            "/products",
            get(handlers::list_products)
                .post(handlers::create_products)
                .delete(handlers::delete_all_products),
        )
        .route(
            "/products/{id}",
            get(handlers::get_product)
                .patch(handlers::update_product)
                .delete(handlers::delete_product),
        );

    // Per-user documents must never be served from a shared cache
    let private = Router::new()
        .route("/cart", get(handlers::get_cart))
        .route("/cart/add", post(handlers::add_to_cart))
        .route("/cart/remove", post(handlers::remove_from_cart))
        .route("/cart/clear", post(handlers::clear_cart))
        .route(
            "/orders",
            get(handlers::list_orders).post(handlers::place_order),
        )
        .route(
            "/orders/{id}",
            get(handlers::get_order).delete(handlers::delete_order),
        )
        .route("/orders/{id}/status", patch(handlers::update_order_status))
        .route("/orders/{id}/cancel", patch(handlers::cancel_order))
        .layer(SetResponseHeaderLayer::overriding(
            header::CACHE_CONTROL,
            HeaderValue::from_static("no-store"),
        ));

    router
        .merge(catalog)
        .merge(private)
        .layer(Extension(services.catalog))
        .layer(Extension(services.carts))
        .layer(Extension(services.orders))
        .layer(Extension(services.verifier))
}
