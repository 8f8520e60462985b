use std::sync::Arc;

use axum::{
    extract::Query,
    http::{StatusCode, Uri},
    response::Json,
    Extension,
};
use tracing::{debug, info};
use uuid::Uuid;

use api_errors::{Problem, ProblemResponse};

use crate::api::rest::auth::Authenticated;
use crate::api::rest::dto::{
    CartDto, CartItemReq, CreateProductsReq, CreatedProductsDto, DeletedCountDto,
    ListProductsQuery, OrderDto, OrdersDto, PlaceOrderReq, ProductDto, UpdateProductReq,
    UpdateStatusReq,
};
use crate::api::rest::error::map_domain_error;
use crate::api::rest::extract::{JsonBody, PathId};
use crate::contract::model::Role;
use crate::domain::access::require_role;
use crate::domain::cart_service::CartService;
use crate::domain::catalog::CatalogService;
use crate::domain::error::DomainError;
use crate::domain::order_service::{parse_status, OrderService};

fn fail(e: DomainError, uri: &Uri) -> ProblemResponse {
    debug!(error = %e, path = %uri.path(), "Request failed");
    map_domain_error(&e, uri.path())
}

// ---------------------------------------------------------------- products

/// List products, optionally within one category
#[utoipa::path(
    get,
    path = "/products",
    tag = "products",
    params(ListProductsQuery),
    responses(
        (status = 200, description = "Products, oldest first", body = Vec<ProductDto>),
        (status = 400, description = "Unknown category", body = Problem),
        (status = 404, description = "No products in category", body = Problem),
    )
)]
pub async fn list_products(
    Extension(catalog): Extension<Arc<CatalogService>>,
    Query(query): Query<ListProductsQuery>,
    uri: Uri,
) -> Result<Json<Vec<ProductDto>>, ProblemResponse> {
    let products = catalog
        .list_products(query.category.as_deref())
        .await
        .map_err(|e| fail(e, &uri))?;
    Ok(Json(products.into_iter().map(ProductDto::from).collect()))
}

/// Get a product by ID
#[utoipa::path(
    get,
    path = "/products/{id}",
    tag = "products",
    params(("id" = Uuid, Path, description = "Product UUID")),
    responses(
        (status = 200, description = "Product found", body = ProductDto),
        (status = 400, description = "Malformed id", body = Problem),
        (status = 404, description = "Not found", body = Problem),
    )
)]
pub async fn get_product(
    Extension(catalog): Extension<Arc<CatalogService>>,
    PathId(id): PathId,
    uri: Uri,
) -> Result<Json<ProductDto>, ProblemResponse> {
    let product = catalog.get_product(id).await.map_err(|e| fail(e, &uri))?;
    Ok(Json(product.into()))
}

/// Create one product (object body) or several (array body)
#[utoipa::path(
    post,
    path = "/products",
    tag = "products",
    request_body = CreateProductsReq,
    security(("bearer_auth" = [])),
    responses(
        (status = 201, description = "Created product(s)", body = CreatedProductsDto),
        (status = 400, description = "Bad Request", body = Problem),
        (status = 401, description = "Unauthorized", body = Problem),
        (status = 403, description = "Admins only", body = Problem),
        (status = 409, description = "Duplicate name", body = Problem),
    )
)]
pub async fn create_products(
    Extension(catalog): Extension<Arc<CatalogService>>,
    Authenticated(principal): Authenticated,
    uri: Uri,
    JsonBody(req): JsonBody<CreateProductsReq>,
) -> Result<(StatusCode, Json<CreatedProductsDto>), ProblemResponse> {
    require_role(&principal, Role::Admin).map_err(|e| fail(e, &uri))?;

    let single = req.is_single();
    let mut created: Vec<ProductDto> = catalog
        .create_products(req.into_batch())
        .await
        .map_err(|e| fail(e, &uri))?
        .into_iter()
        .map(ProductDto::from)
        .collect();
    info!("Created {} product(s)", created.len());

    let body = if single && created.len() == 1 {
        CreatedProductsDto::One(created.remove(0))
    } else {
        CreatedProductsDto::Many(created)
    };
    Ok((StatusCode::CREATED, Json(body)))
}

/// Update a product with partial data
#[utoipa::path(
    patch,
    path = "/products/{id}",
    tag = "products",
    params(("id" = Uuid, Path, description = "Product UUID")),
    request_body = UpdateProductReq,
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Updated product", body = ProductDto),
        (status = 400, description = "Bad Request", body = Problem),
        (status = 403, description = "Admins only", body = Problem),
        (status = 404, description = "Not found", body = Problem),
        (status = 409, description = "Duplicate name", body = Problem),
    )
)]
pub async fn update_product(
    Extension(catalog): Extension<Arc<CatalogService>>,
    Authenticated(principal): Authenticated,
    PathId(id): PathId,
    uri: Uri,
    JsonBody(req): JsonBody<UpdateProductReq>,
) -> Result<Json<ProductDto>, ProblemResponse> {
    require_role(&principal, Role::Admin).map_err(|e| fail(e, &uri))?;
    let product = catalog
        .update_product(id, req.into())
        .await
        .map_err(|e| fail(e, &uri))?;
    Ok(Json(product.into()))
}

/// Delete a product by ID
#[utoipa::path(
    delete,
    path = "/products/{id}",
    tag = "products",
    params(("id" = Uuid, Path, description = "Product UUID")),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Deleted product", body = ProductDto),
        (status = 403, description = "Admins only", body = Problem),
        (status = 404, description = "Not found", body = Problem),
    )
)]
pub async fn delete_product(
    Extension(catalog): Extension<Arc<CatalogService>>,
    Authenticated(principal): Authenticated,
    PathId(id): PathId,
    uri: Uri,
) -> Result<Json<ProductDto>, ProblemResponse> {
    require_role(&principal, Role::Admin).map_err(|e| fail(e, &uri))?;
    let product = catalog.delete_product(id).await.map_err(|e| fail(e, &uri))?;
    Ok(Json(product.into()))
}

/// Delete every product
#[utoipa::path(
    delete,
    path = "/products",
    tag = "products",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Number of deleted products", body = DeletedCountDto),
        (status = 403, description = "Admins only", body = Problem),
        (status = 404, description = "Catalog already empty", body = Problem),
    )
)]
pub async fn delete_all_products(
    Extension(catalog): Extension<Arc<CatalogService>>,
    Authenticated(principal): Authenticated,
    uri: Uri,
) -> Result<Json<DeletedCountDto>, ProblemResponse> {
    require_role(&principal, Role::Admin).map_err(|e| fail(e, &uri))?;
    let deleted = catalog
        .delete_all_products()
        .await
        .map_err(|e| fail(e, &uri))?;
    Ok(Json(DeletedCountDto { deleted }))
}

// ---------------------------------------------------------------- cart

/// Get the caller's cart, creating it on first access
#[utoipa::path(
    get,
    path = "/cart",
    tag = "cart",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Cart", body = CartDto),
        (status = 401, description = "Unauthorized", body = Problem),
    )
)]
pub async fn get_cart(
    Extension(carts): Extension<Arc<CartService>>,
    Authenticated(principal): Authenticated,
    uri: Uri,
) -> Result<Json<CartDto>, ProblemResponse> {
    let cart = carts
        .get_cart(principal.user_id)
        .await
        .map_err(|e| fail(e, &uri))?;
    Ok(Json(cart.into()))
}

/// Reserve stock and add it to the cart
#[utoipa::path(
    post,
    path = "/cart/add",
    tag = "cart",
    request_body = CartItemReq,
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Updated cart", body = CartDto),
        (status = 400, description = "Insufficient stock or bad quantity", body = Problem),
        (status = 404, description = "Unknown product", body = Problem),
    )
)]
pub async fn add_to_cart(
    Extension(carts): Extension<Arc<CartService>>,
    Authenticated(principal): Authenticated,
    uri: Uri,
    JsonBody(req): JsonBody<CartItemReq>,
) -> Result<Json<CartDto>, ProblemResponse> {
    let cart = carts
        .add_item(principal.user_id, req.product_id, req.quantity)
        .await
        .map_err(|e| fail(e, &uri))?;
    Ok(Json(cart.into()))
}

/// Remove units from a cart line and return them to stock
#[utoipa::path(
    post,
    path = "/cart/remove",
    tag = "cart",
    request_body = CartItemReq,
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Updated cart", body = CartDto),
        (status = 404, description = "No cart, or item not in cart", body = Problem),
    )
)]
pub async fn remove_from_cart(
    Extension(carts): Extension<Arc<CartService>>,
    Authenticated(principal): Authenticated,
    uri: Uri,
    JsonBody(req): JsonBody<CartItemReq>,
) -> Result<Json<CartDto>, ProblemResponse> {
    let cart = carts
        .remove_item(principal.user_id, req.product_id, req.quantity)
        .await
        .map_err(|e| fail(e, &uri))?;
    Ok(Json(cart.into()))
}

/// Return every reserved unit to stock and empty the cart
#[utoipa::path(
    post,
    path = "/cart/clear",
    tag = "cart",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Empty cart", body = CartDto),
        (status = 404, description = "No cart", body = Problem),
    )
)]
pub async fn clear_cart(
    Extension(carts): Extension<Arc<CartService>>,
    Authenticated(principal): Authenticated,
    uri: Uri,
) -> Result<Json<CartDto>, ProblemResponse> {
    let cart = carts
        .clear_cart(principal.user_id)
        .await
        .map_err(|e| fail(e, &uri))?;
    Ok(Json(cart.into()))
}

// ---------------------------------------------------------------- orders

/// Place an order
#[utoipa::path(
    post,
    path = "/orders",
    tag = "orders",
    request_body = PlaceOrderReq,
    security(("bearer_auth" = [])),
    responses(
        (status = 201, description = "Created order", body = OrderDto),
        (status = 400, description = "Empty order or bad input", body = Problem),
    )
)]
pub async fn place_order(
    Extension(orders): Extension<Arc<OrderService>>,
    Authenticated(principal): Authenticated,
    uri: Uri,
    JsonBody(req): JsonBody<PlaceOrderReq>,
) -> Result<(StatusCode, Json<OrderDto>), ProblemResponse> {
    let order = orders
        .place_order(&principal, req.into())
        .await
        .map_err(|e| fail(e, &uri))?;
    Ok((StatusCode::CREATED, Json(order.into())))
}

/// List orders: grouped by e-mail for admins, own orders otherwise
#[utoipa::path(
    get,
    path = "/orders",
    tag = "orders",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Orders, newest first", body = OrdersDto),
        (status = 401, description = "Unauthorized", body = Problem),
    )
)]
pub async fn list_orders(
    Extension(orders): Extension<Arc<OrderService>>,
    Authenticated(principal): Authenticated,
    uri: Uri,
) -> Result<Json<OrdersDto>, ProblemResponse> {
    let listing = orders
        .list_orders(&principal)
        .await
        .map_err(|e| fail(e, &uri))?;
    Ok(Json(listing.into()))
}

/// Get an order by ID
#[utoipa::path(
    get,
    path = "/orders/{id}",
    tag = "orders",
    params(("id" = Uuid, Path, description = "Order UUID")),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Order", body = OrderDto),
        (status = 400, description = "Malformed id", body = Problem),
        (status = 404, description = "Not found", body = Problem),
    )
)]
pub async fn get_order(
    Extension(orders): Extension<Arc<OrderService>>,
    Authenticated(principal): Authenticated,
    PathId(id): PathId,
    uri: Uri,
) -> Result<Json<OrderDto>, ProblemResponse> {
    let order = orders
        .get_order(&principal, id)
        .await
        .map_err(|e| fail(e, &uri))?;
    Ok(Json(order.into()))
}

/// Move an order through its lifecycle
#[utoipa::path(
    patch,
    path = "/orders/{id}/status",
    tag = "orders",
    params(("id" = Uuid, Path, description = "Order UUID")),
    request_body = UpdateStatusReq,
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Updated order", body = OrderDto),
        (status = 400, description = "Invalid status or transition", body = Problem),
        (status = 403, description = "Admins only", body = Problem),
        (status = 404, description = "Not found", body = Problem),
    )
)]
pub async fn update_order_status(
    Extension(orders): Extension<Arc<OrderService>>,
    Authenticated(principal): Authenticated,
    PathId(id): PathId,
    uri: Uri,
    JsonBody(req): JsonBody<UpdateStatusReq>,
) -> Result<Json<OrderDto>, ProblemResponse> {
    require_role(&principal, Role::Admin).map_err(|e| fail(e, &uri))?;
    let next = parse_status(&req.status).map_err(|e| fail(e, &uri))?;
    let order = orders
        .update_status(&principal, id, next)
        .await
        .map_err(|e| fail(e, &uri))?;
    Ok(Json(order.into()))
}

/// Cancel a pending order and restore its stock
#[utoipa::path(
    patch,
    path = "/orders/{id}/cancel",
    tag = "orders",
    params(("id" = Uuid, Path, description = "Order UUID")),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Cancelled order", body = OrderDto),
        (status = 400, description = "Order is not pending", body = Problem),
        (status = 404, description = "Not found", body = Problem),
    )
)]
pub async fn cancel_order(
    Extension(orders): Extension<Arc<OrderService>>,
    Authenticated(principal): Authenticated,
    PathId(id): PathId,
    uri: Uri,
) -> Result<Json<OrderDto>, ProblemResponse> {
    let order = orders
        .cancel(&principal, id)
        .await
        .map_err(|e| fail(e, &uri))?;
    Ok(Json(order.into()))
}

/// Delete an order; stock is not restored
#[utoipa::path(
    delete,
    path = "/orders/{id}",
    tag = "orders",
    params(("id" = Uuid, Path, description = "Order UUID")),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Deleted order", body = OrderDto),
        (status = 404, description = "Not found", body = Problem),
    )
)]
pub async fn delete_order(
    Extension(orders): Extension<Arc<OrderService>>,
    Authenticated(principal): Authenticated,
    PathId(id): PathId,
    uri: Uri,
) -> Result<Json<OrderDto>, ProblemResponse> {
    let order = orders
        .delete(&principal, id)
        .await
        .map_err(|e| fail(e, &uri))?;
    Ok(Json(order.into()))
}
