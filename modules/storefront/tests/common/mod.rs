#![allow(dead_code)]

use std::sync::Arc;

use rust_decimal::Decimal;
use uuid::Uuid;

use storefront::client::StorefrontApi;
use storefront::model::{NewProduct, Principal, Product};
use storefront::{StorageOptions, Storefront, StorefrontConfig};

pub const CATEGORY: &str = "Kids Clothes";

pub fn memory_storefront() -> Storefront {
    Storefront::in_memory(&StorefrontConfig::default())
}

/// Fresh migrated SQLite database, private to the calling test.
pub async fn sqlite_storefront() -> Storefront {
    let sf = Storefront::connect(
        &StorefrontConfig::default(),
        &StorageOptions::sqlite("sqlite::memory:"),
    )
    .await
    .expect("open sqlite");
    sf.migrate().await.expect("migrations");
    sf
}

pub fn admin() -> Principal {
    Principal::admin(Uuid::new_v4()).with_email("admin@example.com")
}

pub fn shopper(email: &str) -> Principal {
    Principal::user(Uuid::new_v4()).with_email(email)
}

pub fn new_product(name: &str, price: &str, stock: u32) -> NewProduct {
    NewProduct {
        name: name.to_string(),
        description: None,
        category: CATEGORY.to_string(),
        price: price.parse::<Decimal>().expect("price"),
        stock,
    }
}

pub async fn seed(api: &Arc<dyn StorefrontApi>, name: &str, stock: u32) -> Product {
    api.create_products(&admin(), vec![new_product(name, "9.99", stock)])
        .await
        .expect("seed product")
        .remove(0)
}

pub async fn stock_of(api: &Arc<dyn StorefrontApi>, id: Uuid) -> u32 {
    api.get_product(id).await.expect("product").stock
}
