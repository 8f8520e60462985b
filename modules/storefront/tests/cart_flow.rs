mod common;

use std::sync::Arc;

use storefront::client::StorefrontApi;
use storefront::error::StorefrontError;
use storefront::Storefront;

use common::*;

async fn add_reserves_and_remove_releases(sf: Storefront) {
    let api = sf.client();
    let product = seed(&api, "Striped onesie", 5).await;
    let user = shopper("ann@example.com");

    let cart = api.add_to_cart(&user, product.id, 3).await.unwrap();
    assert_eq!(cart.items.len(), 1);
    assert_eq!(cart.items[0].quantity, 3);
    assert_eq!(cart.items[0].product.as_ref().map(|p| p.stock), Some(2));
    assert_eq!(stock_of(&api, product.id).await, 2);

    let cart = api.add_to_cart(&user, product.id, 1).await.unwrap();
    assert_eq!(cart.items[0].quantity, 4);
    assert_eq!(stock_of(&api, product.id).await, 1);

    let cart = api.remove_from_cart(&user, product.id, 1).await.unwrap();
    assert_eq!(cart.items[0].quantity, 3);
    assert_eq!(stock_of(&api, product.id).await, 2);

    // Asking for more than the line holds only gives back what was held
    let cart = api.remove_from_cart(&user, product.id, 10).await.unwrap();
    assert!(cart.items.is_empty());
    assert_eq!(stock_of(&api, product.id).await, 5);
}

#[tokio::test]
async fn add_and_remove_memory() {
    add_reserves_and_remove_releases(memory_storefront()).await;
}

#[tokio::test]
async fn add_and_remove_sqlite() {
    add_reserves_and_remove_releases(sqlite_storefront().await).await;
}

async fn shortfall_leaves_everything_untouched(sf: Storefront) {
    let api = sf.client();
    let product = seed(&api, "Maternity dress", 2).await;
    let user = shopper("bea@example.com");

    api.add_to_cart(&user, product.id, 1).await.unwrap();
    let err = api.add_to_cart(&user, product.id, 5).await.unwrap_err();
    assert!(matches!(err, StorefrontError::InsufficientStock { .. }));
    assert!(err.to_string().contains("available 1"));

    assert_eq!(stock_of(&api, product.id).await, 1);
    let cart = api.get_cart(&user).await.unwrap();
    assert_eq!(cart.items[0].quantity, 1);
}

#[tokio::test]
async fn shortfall_memory() {
    shortfall_leaves_everything_untouched(memory_storefront()).await;
}

#[tokio::test]
async fn shortfall_sqlite() {
    shortfall_leaves_everything_untouched(sqlite_storefront().await).await;
}

#[tokio::test]
async fn cart_is_created_lazily() {
    let api = memory_storefront().client();
    let user = shopper("cy@example.com");

    let cart = api.get_cart(&user).await.unwrap();
    assert_eq!(cart.user_id, user.user_id);
    assert!(cart.items.is_empty());
}

#[tokio::test]
async fn bad_cart_requests_are_rejected() {
    let api = memory_storefront().client();
    let product = seed(&api, "Wool vest", 3).await;
    let other = seed(&api, "Linen vest", 3).await;
    let user = shopper("dee@example.com");

    assert!(matches!(
        api.remove_from_cart(&user, product.id, 1).await,
        Err(StorefrontError::NotFound { .. })
    ));
    assert!(matches!(
        api.clear_cart(&user).await,
        Err(StorefrontError::NotFound { .. })
    ));
    assert!(matches!(
        api.add_to_cart(&user, uuid::Uuid::new_v4(), 1).await,
        Err(StorefrontError::NotFound { .. })
    ));
    assert!(matches!(
        api.add_to_cart(&user, product.id, 0).await,
        Err(StorefrontError::InvalidInput { .. })
    ));

    api.add_to_cart(&user, product.id, 1).await.unwrap();
    assert!(matches!(
        api.remove_from_cart(&user, other.id, 1).await,
        Err(StorefrontError::NotFound { .. })
    ));
    assert!(matches!(
        api.remove_from_cart(&user, product.id, 0).await,
        Err(StorefrontError::InvalidInput { .. })
    ));
    assert_eq!(stock_of(&api, product.id).await, 2);
    assert_eq!(stock_of(&api, other.id).await, 3);
}

async fn clear_returns_everything(sf: Storefront) {
    let api = sf.client();
    let a = seed(&api, "Kids raincoat", 4).await;
    let b = seed(&api, "Kids boots", 6).await;
    let user = shopper("eve@example.com");

    api.add_to_cart(&user, a.id, 4).await.unwrap();
    api.add_to_cart(&user, b.id, 2).await.unwrap();
    assert_eq!(stock_of(&api, a.id).await, 0);

    let cart = api.clear_cart(&user).await.unwrap();
    assert!(cart.items.is_empty());
    assert_eq!(stock_of(&api, a.id).await, 4);
    assert_eq!(stock_of(&api, b.id).await, 6);

    // Clearing an empty cart changes nothing
    api.clear_cart(&user).await.unwrap();
    assert_eq!(stock_of(&api, a.id).await, 4);
}

#[tokio::test]
async fn clear_memory() {
    clear_returns_everything(memory_storefront()).await;
}

#[tokio::test]
async fn clear_sqlite() {
    clear_returns_everything(sqlite_storefront().await).await;
}

#[tokio::test]
async fn deleted_product_leaves_dangling_line() {
    let api = memory_storefront().client();
    let product = seed(&api, "Puffer vest", 3).await;
    let user = shopper("fay@example.com");

    api.add_to_cart(&user, product.id, 2).await.unwrap();
    api.delete_product(&admin(), product.id).await.unwrap();

    let cart = api.get_cart(&user).await.unwrap();
    assert_eq!(cart.items.len(), 1);
    assert!(cart.items[0].product.is_none());

    let cart = api.remove_from_cart(&user, product.id, 2).await.unwrap();
    assert!(cart.items.is_empty());
}

/// Stock on the shelf plus units sitting in carts stays constant across any
/// mix of cart operations.
#[tokio::test]
async fn shelf_plus_carts_is_conserved() {
    let api = memory_storefront().client();
    let product = seed(&api, "Rib knit vest", 10).await;
    let users = [
        shopper("u1@example.com"),
        shopper("u2@example.com"),
        shopper("u3@example.com"),
    ];

    let ops: [(usize, i32); 8] = [(0, 3), (1, 2), (0, -1), (2, 4), (1, -5), (2, 1), (0, -2), (1, 3)];
    for (who, delta) in ops {
        let user = &users[who];
        if delta > 0 {
            let _ = api.add_to_cart(user, product.id, delta.unsigned_abs()).await;
        } else {
            let _ = api.remove_from_cart(user, product.id, delta.unsigned_abs()).await;
        }

        let mut in_carts = 0;
        for u in &users {
            in_carts += api
                .get_cart(u)
                .await
                .unwrap()
                .items
                .iter()
                .map(|l| l.quantity)
                .sum::<u32>();
        }
        assert_eq!(stock_of(&api, product.id).await + in_carts, 10);
    }
}

async fn last_units_go_to_exactly_one_buyer(sf: Storefront) {
    let api: Arc<dyn StorefrontApi> = sf.client();
    let product = seed(&api, "Limited vest", 10).await;

    let mut tasks = Vec::new();
    for i in 0..25 {
        let api = api.clone();
        let id = product.id;
        tasks.push(tokio::spawn(async move {
            let user = shopper(&format!("rush{i}@example.com"));
            api.add_to_cart(&user, id, 1).await.is_ok()
        }));
    }

    let mut won = 0;
    for t in tasks {
        if t.await.unwrap() {
            won += 1;
        }
    }
    assert_eq!(won, 10);
    assert_eq!(stock_of(&api, product.id).await, 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_adds_memory() {
    last_units_go_to_exactly_one_buyer(memory_storefront()).await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_adds_sqlite() {
    last_units_go_to_exactly_one_buyer(sqlite_storefront().await).await;
}
