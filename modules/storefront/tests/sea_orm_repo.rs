use std::sync::Arc;

use anyhow::Result;
use chrono::{Duration, Utc};
use rust_decimal::Decimal;
use sea_orm::{Database, DatabaseConnection};
use sea_orm_migration::MigratorTrait;
use uuid::Uuid;

use storefront::domain::repo::{CartsRepository, OrdersRepository, ProductsRepository, Reservation};
use storefront::infra::storage::migrations::Migrator;
use storefront::infra::storage::{
    SeaOrmCartsRepository, SeaOrmOrdersRepository, SeaOrmProductsRepository,
};
use storefront::model::{Cart, CartLine, Order, OrderLine, OrderStatus, Product, ProductPatch};

/// Create a fresh test database for each test
async fn create_test_db() -> DatabaseConnection {
    let db = Database::connect("sqlite::memory:")
        .await
        .expect("Failed to connect to test database");
    Migrator::up(&db, None)
        .await
        .expect("Failed to run migrations");
    db
}

fn product(name: &str, stock: u32) -> Product {
    let now = Utc::now();
    Product {
        id: Uuid::new_v4(),
        name: name.to_string(),
        description: Some("soft cotton".to_string()),
        category: "Kids Clothes".to_string(),
        price: Decimal::new(1999, 2),
        stock,
        created_at: now,
        updated_at: now,
    }
}

fn order(user_id: Uuid, age_secs: i64) -> Order {
    let at = Utc::now() - Duration::seconds(age_secs);
    Order {
        id: Uuid::new_v4(),
        user_id,
        user_email: Some("vic@example.com".to_string()),
        products: vec![OrderLine {
            product_id: Uuid::new_v4(),
            quantity: 2,
        }],
        total_price: Decimal::new(3998, 2),
        status: OrderStatus::Pending,
        created_at: at,
        updated_at: at,
    }
}

#[tokio::test]
async fn products_round_trip_with_exact_price() -> Result<()> {
    let repo = SeaOrmProductsRepository::new(create_test_db().await);
    let p = product("Cotton vest", 3);
    repo.insert(p.clone()).await?;

    let found = repo.find_by_id(p.id).await?.expect("stored");
    assert_eq!(found.price, Decimal::new(1999, 2));
    assert_eq!(found.description.as_deref(), Some("soft cotton"));
    assert!(repo.name_taken("Cotton vest", None).await?);
    assert!(!repo.name_taken("Cotton vest", Some(p.id)).await?);

    let restock = ProductPatch {
        name: Some("Linen vest".to_string()),
        stock: Some(7),
        ..Default::default()
    };
    let found = repo.update(p.id, &restock).await?.expect("stored");
    assert_eq!(found.name, "Linen vest");
    assert_eq!(found.stock, 7);
    assert_eq!(found.price, Decimal::new(1999, 2));

    assert_eq!(repo.list(Some("Men Vests")).await?.len(), 0);
    assert_eq!(repo.list(Some("Kids Clothes")).await?.len(), 1);

    assert_eq!(repo.delete(p.id).await?.map(|d| d.id), Some(p.id));
    assert!(repo.delete(p.id).await?.is_none());
    assert!(repo.update(p.id, &ProductPatch::default()).await?.is_none());
    Ok(())
}

#[tokio::test]
async fn patch_without_stock_leaves_reservations_alone() -> Result<()> {
    let repo = SeaOrmProductsRepository::new(create_test_db().await);
    let p = product("Rib vest", 5);
    repo.insert(p.clone()).await?;

    // The admin read stock 5, a shopper then takes 2
    let seen = repo.find_by_id(p.id).await?.expect("stored");
    assert_eq!(seen.stock, 5);
    assert_eq!(repo.reserve(p.id, 2).await?, Reservation::Reserved);

    let patch = ProductPatch {
        description: Some("ribbed cotton".to_string()),
        price: Some(Decimal::new(1750, 2)),
        ..Default::default()
    };
    let updated = repo.update(p.id, &patch).await?.expect("stored");
    assert_eq!(updated.stock, 3);
    assert_eq!(updated.description.as_deref(), Some("ribbed cotton"));
    assert_eq!(updated.price, Decimal::new(1750, 2));
    assert_eq!(updated.name, "Rib vest");
    Ok(())
}

#[tokio::test]
async fn over_release_is_not_capped() -> Result<()> {
    // Boundary: stock has no upper bound, releasing more than was reserved inflates it
    let repo = SeaOrmProductsRepository::new(create_test_db().await);
    let p = product("Spare vest", 1);
    repo.insert(p.clone()).await?;

    assert!(repo.release(p.id, 10).await?);
    assert_eq!(repo.find_by_id(p.id).await?.map(|p| p.stock), Some(11));
    Ok(())
}

#[tokio::test]
async fn reserve_is_conditional() -> Result<()> {
    let repo = SeaOrmProductsRepository::new(create_test_db().await);
    let p = product("Wool vest", 4);
    repo.insert(p.clone()).await?;

    assert_eq!(repo.reserve(p.id, 3).await?, Reservation::Reserved);
    assert_eq!(
        repo.reserve(p.id, 2).await?,
        Reservation::Insufficient { available: 1 }
    );
    assert_eq!(repo.reserve(Uuid::new_v4(), 1).await?, Reservation::Missing);
    assert_eq!(repo.find_by_id(p.id).await?.map(|p| p.stock), Some(1));

    assert!(repo.release(p.id, 3).await?);
    assert_eq!(repo.find_by_id(p.id).await?.map(|p| p.stock), Some(4));
    assert!(!repo.release(Uuid::new_v4(), 3).await?);
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_reservations_never_oversell() -> Result<()> {
    let repo = Arc::new(SeaOrmProductsRepository::new(create_test_db().await));
    let p = product("Last vest", 10);
    repo.insert(p.clone()).await?;

    let mut tasks = Vec::new();
    for _ in 0..30 {
        let repo = repo.clone();
        tasks.push(tokio::spawn(async move { repo.reserve(p.id, 1).await }));
    }
    let mut reserved = 0;
    for t in tasks {
        if t.await?? == Reservation::Reserved {
            reserved += 1;
        }
    }

    assert_eq!(reserved, 10);
    assert_eq!(repo.find_by_id(p.id).await?.map(|p| p.stock), Some(0));
    Ok(())
}

#[tokio::test]
async fn cart_save_replaces_document() -> Result<()> {
    let repo = SeaOrmCartsRepository::new(create_test_db().await);
    let user = Uuid::new_v4();
    assert!(repo.find_by_user(user).await?.is_none());

    let mut cart = Cart::empty(user);
    repo.save(cart.clone()).await?;

    let pid = Uuid::new_v4();
    cart.items.push(CartLine {
        product_id: pid,
        quantity: 2,
    });
    repo.save(cart.clone()).await?;

    let stored = repo.find_by_user(user).await?.expect("cart");
    assert_eq!(stored.items, cart.items);
    assert_eq!(stored.reserved_units(), 2);
    Ok(())
}

#[tokio::test]
async fn orders_list_newest_first_and_update_status() -> Result<()> {
    let repo = SeaOrmOrdersRepository::new(create_test_db().await);
    let user = Uuid::new_v4();
    let old = order(user, 60);
    let new = order(user, 0);
    let other = order(Uuid::new_v4(), 30);
    for o in [&old, &new, &other] {
        repo.insert(o.clone()).await?;
    }

    let mine: Vec<Uuid> = repo.list_by_user(user).await?.iter().map(|o| o.id).collect();
    assert_eq!(mine, vec![new.id, old.id]);
    let all: Vec<Uuid> = repo.list_all().await?.iter().map(|o| o.id).collect();
    assert_eq!(all, vec![new.id, other.id, old.id]);

    let updated = repo
        .transition(old.id, OrderStatus::Pending, OrderStatus::Processing)
        .await?
        .expect("order");
    assert_eq!(updated.status, OrderStatus::Processing);
    assert_eq!(updated.products, old.products);
    assert_eq!(updated.total_price, old.total_price);

    // Stale expected status: nothing is written
    assert!(repo
        .transition(old.id, OrderStatus::Pending, OrderStatus::Cancelled)
        .await?
        .is_none());
    assert_eq!(
        repo.find_by_id(old.id).await?.map(|o| o.status),
        Some(OrderStatus::Processing)
    );
    assert!(repo
        .transition(Uuid::new_v4(), OrderStatus::Pending, OrderStatus::Shipped)
        .await?
        .is_none());

    assert!(repo.delete(other.id).await?.is_some());
    assert!(repo.find_by_id(other.id).await?.is_none());
    Ok(())
}
