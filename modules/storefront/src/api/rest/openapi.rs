use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::api::rest::handlers;

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::list_products,
        handlers::get_product,
        handlers::create_products,
        handlers::update_product,
        handlers::delete_product,
        handlers::delete_all_products,
        handlers::get_cart,
        handlers::add_to_cart,
        handlers::remove_from_cart,
        handlers::clear_cart,
        handlers::place_order,
        handlers::list_orders,
        handlers::get_order,
        handlers::update_order_status,
        handlers::cancel_order,
        handlers::delete_order,
    ),
    modifiers(&BearerAuth),
    tags(
        (name = "products", description = "Product catalog"),
        (name = "cart", description = "Per-user cart with stock reservation"),
        (name = "orders", description = "Orders and their lifecycle"),
    )
)]
pub struct StorefrontApiDoc;

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}
