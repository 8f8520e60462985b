use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::contract::model::{
    CartLineView, CartView, NewOrder, NewProduct, Order, OrderLine, OrderListing, Product,
    ProductPatch,
};

// ---------------------------------------------------------------- products

/// REST DTO for product representation
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProductDto {
    pub id: Uuid,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub category: String,
    pub price: Decimal,
    pub stock: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// REST DTO for creating a product
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CreateProductReq {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub category: String,
    pub price: Decimal,
    #[serde(default)]
    pub stock: u32,
}

/// Either a single product or a batch.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(untagged)]
pub enum CreateProductsReq {
    One(CreateProductReq),
    Many(Vec<CreateProductReq>),
}

/// Mirrors the shape of the request: one product in, one product out.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(untagged)]
pub enum CreatedProductsDto {
    One(ProductDto),
    Many(Vec<ProductDto>),
}

/// REST DTO for updating a product (partial)
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Default)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct UpdateProductReq {
    pub name: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub price: Option<Decimal>,
    pub stock: Option<u32>,
}

#[derive(Debug, Clone, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListProductsQuery {
    /// Restrict the listing to one category
    pub category: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DeletedCountDto {
    pub deleted: u64,
}

// ---------------------------------------------------------------- cart

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CartItemReq {
    pub product_id: Uuid,
    /// Defaults to 1 when omitted
    #[serde(default = "one")]
    #[schema(default = 1)]
    pub quantity: u32,
}

fn one() -> u32 {
    1
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CartLineDto {
    pub product_id: Uuid,
    pub quantity: u32,
    /// Current product record; `null` once the product has been deleted.
    pub product: Option<ProductDto>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CartDto {
    pub user_id: Uuid,
    pub items: Vec<CartLineDto>,
    pub updated_at: DateTime<Utc>,
}

// ---------------------------------------------------------------- orders

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderLineDto {
    pub product_id: Uuid,
    pub quantity: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PlaceOrderReq {
    pub products: Vec<OrderLineDto>,
    pub total_price: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderDto {
    pub id: Uuid,
    /// Owning user id
    pub user: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_email: Option<String>,
    pub products: Vec<OrderLineDto>,
    pub total_price: Decimal,
    /// One of Pending, Processing, Shipped, Delivered, Cancelled
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UpdateStatusReq {
    pub status: String,
}

/// Admins receive orders grouped by owner e-mail, users a flat list.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(untagged)]
pub enum OrdersDto {
    Grouped(BTreeMap<String, Vec<OrderDto>>),
    Own(Vec<OrderDto>),
}

// Conversion implementations between REST DTOs and contract models

impl From<Product> for ProductDto {
    fn from(p: Product) -> Self {
        Self {
            id: p.id,
            name: p.name,
            description: p.description,
            category: p.category,
            price: p.price,
            stock: p.stock,
            created_at: p.created_at,
            updated_at: p.updated_at,
        }
    }
}

impl From<CreateProductReq> for NewProduct {
    fn from(req: CreateProductReq) -> Self {
        Self {
            name: req.name,
            description: req.description,
            category: req.category,
            price: req.price,
            stock: req.stock,
        }
    }
}

impl CreateProductsReq {
    pub fn into_batch(self) -> Vec<NewProduct> {
        match self {
            CreateProductsReq::One(req) => vec![req.into()],
            CreateProductsReq::Many(reqs) => reqs.into_iter().map(Into::into).collect(),
        }
    }

    pub fn is_single(&self) -> bool {
        matches!(self, CreateProductsReq::One(_))
    }
}

impl From<UpdateProductReq> for ProductPatch {
    fn from(req: UpdateProductReq) -> Self {
        Self {
            name: req.name,
            description: req.description,
            category: req.category,
            price: req.price,
            stock: req.stock,
        }
    }
}

impl From<CartLineView> for CartLineDto {
    fn from(l: CartLineView) -> Self {
        Self {
            product_id: l.product_id,
            quantity: l.quantity,
            product: l.product.map(Into::into),
        }
    }
}

impl From<CartView> for CartDto {
    fn from(c: CartView) -> Self {
        Self {
            user_id: c.user_id,
            items: c.items.into_iter().map(Into::into).collect(),
            updated_at: c.updated_at,
        }
    }
}

impl From<OrderLine> for OrderLineDto {
    fn from(l: OrderLine) -> Self {
        Self {
            product_id: l.product_id,
            quantity: l.quantity,
        }
    }
}

impl From<OrderLineDto> for OrderLine {
    fn from(l: OrderLineDto) -> Self {
        Self {
            product_id: l.product_id,
            quantity: l.quantity,
        }
    }
}

impl From<PlaceOrderReq> for NewOrder {
    fn from(req: PlaceOrderReq) -> Self {
        Self {
            products: req.products.into_iter().map(Into::into).collect(),
            total_price: req.total_price,
        }
    }
}

impl From<Order> for OrderDto {
    fn from(o: Order) -> Self {
        Self {
            id: o.id,
            user: o.user_id,
            user_email: o.user_email,
            products: o.products.into_iter().map(Into::into).collect(),
            total_price: o.total_price,
            status: o.status.to_string(),
            created_at: o.created_at,
            updated_at: o.updated_at,
        }
    }
}

impl From<OrderListing> for OrdersDto {
    fn from(l: OrderListing) -> Self {
        match l {
            OrderListing::Grouped(groups) => OrdersDto::Grouped(
                groups
                    .into_iter()
                    .map(|(email, orders)| (email, orders.into_iter().map(Into::into).collect()))
                    .collect(),
            ),
            OrderListing::Own(orders) => OrdersDto::Own(orders.into_iter().map(Into::into).collect()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_request_accepts_object_or_array() {
        let one: CreateProductsReq = serde_json::from_str(
            r#"{"name":"Vest","category":"Men Vests","price":12.5,"stock":3}"#,
        )
        .unwrap();
        assert!(one.is_single());
        assert_eq!(one.into_batch()[0].price, Decimal::new(125, 1));

        let many: CreateProductsReq = serde_json::from_str(
            r#"[{"name":"A","category":"Men Vests","price":1},{"name":"B","category":"Men Vests","price":2}]"#,
        )
        .unwrap();
        assert!(!many.is_single());
        assert_eq!(many.into_batch().len(), 2);
    }

    #[test]
    fn cart_line_serializes_camel_case_with_null_product() {
        let dto = CartLineDto {
            product_id: Uuid::nil(),
            quantity: 2,
            product: None,
        };
        let v = serde_json::to_value(dto).unwrap();
        assert_eq!(v["productId"], Uuid::nil().to_string());
        assert!(v["product"].is_null());
    }

    #[test]
    fn missing_quantity_means_one_unit() {
        let req: CartItemReq =
            serde_json::from_str(&format!(r#"{{"productId":"{}"}}"#, Uuid::nil())).unwrap();
        assert_eq!(req.quantity, 1);
    }

    #[test]
    fn negative_quantity_does_not_deserialize() {
        let res: Result<CartItemReq, _> =
            serde_json::from_str(&format!(r#"{{"productId":"{}","quantity":-1}}"#, Uuid::nil()));
        assert!(res.is_err());
    }
}
