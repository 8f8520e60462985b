//! SeaORM-backed repository implementations for the domain ports.
//!
//! Each repository is generic over `C: ConnectionTrait`, so it can be built
//! on a `DatabaseConnection` or a transactional connection.

use anyhow::Context;
use async_trait::async_trait;
use chrono::Utc;
use sea_orm::sea_query::{Expr, OnConflict};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder,
};
use uuid::Uuid;

use crate::contract::model::{Cart, Order, OrderStatus, Product, ProductPatch};
use crate::domain::repo::{CartsRepository, OrdersRepository, ProductsRepository, Reservation};
use crate::infra::storage::entity::{cart, order, product};
use crate::infra::storage::mapper;

pub struct SeaOrmProductsRepository<C>
where
    C: ConnectionTrait + Send + Sync,
{
    conn: C,
}

impl<C> SeaOrmProductsRepository<C>
where
    C: ConnectionTrait + Send + Sync,
{
    pub fn new(conn: C) -> Self {
        Self { conn }
    }
}

#[async_trait]
impl<C> ProductsRepository for SeaOrmProductsRepository<C>
where
    C: ConnectionTrait + Send + Sync + 'static,
{
    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<Product>> {
        let found = product::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("find product failed")?;
        found.map(mapper::product_to_contract).transpose()
    }

    async fn list(&self, category: Option<&str>) -> anyhow::Result<Vec<Product>> {
        let mut query = product::Entity::find();
        if let Some(category) = category {
            query = query.filter(product::Column::Category.eq(category));
        }
        let rows = query
            .order_by_asc(product::Column::CreatedAt)
            .order_by_asc(product::Column::Name)
            .all(&self.conn)
            .await
            .context("list products failed")?;
        rows.into_iter().map(mapper::product_to_contract).collect()
    }

    async fn name_taken(&self, name: &str, except: Option<Uuid>) -> anyhow::Result<bool> {
        let mut query = product::Entity::find().filter(product::Column::Name.eq(name));
        if let Some(id) = except {
            query = query.filter(product::Column::Id.ne(id));
        }
        let count = query
            .count(&self.conn)
            .await
            .context("name_taken failed")?;
        Ok(count > 0)
    }

    async fn insert(&self, p: Product) -> anyhow::Result<()> {
        let _ = mapper::product_to_active(p)
            .insert(&self.conn)
            .await
            .context("insert product failed")?;
        Ok(())
    }

    async fn update(&self, id: Uuid, patch: &ProductPatch) -> anyhow::Result<Option<Product>> {
        // Only the columns present in the patch; stock stays with reserve/release otherwise.
        let mut query = product::Entity::update_many()
            .col_expr(product::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(product::Column::Id.eq(id));
        if let Some(name) = &patch.name {
            query = query.col_expr(product::Column::Name, Expr::value(name.clone()));
        }
        if let Some(description) = &patch.description {
            query = query.col_expr(product::Column::Description, Expr::value(description.clone()));
        }
        if let Some(category) = &patch.category {
            query = query.col_expr(product::Column::Category, Expr::value(category.clone()));
        }
        if let Some(price) = patch.price {
            query = query.col_expr(product::Column::Price, Expr::value(price.to_string()));
        }
        if let Some(stock) = patch.stock {
            query = query.col_expr(product::Column::Stock, Expr::value(i64::from(stock)));
        }

        let res = query
            .exec(&self.conn)
            .await
            .context("update product failed")?;
        if res.rows_affected == 0 {
            return Ok(None);
        }
        self.find_by_id(id).await
    }

    async fn delete(&self, id: Uuid) -> anyhow::Result<Option<Product>> {
        let Some(found) = self.find_by_id(id).await? else {
            return Ok(None);
        };
        let res = product::Entity::delete_by_id(id)
            .exec(&self.conn)
            .await
            .context("delete product failed")?;
        Ok((res.rows_affected > 0).then_some(found))
    }

    async fn delete_all(&self) -> anyhow::Result<u64> {
        let res = product::Entity::delete_many()
            .exec(&self.conn)
            .await
            .context("delete all products failed")?;
        Ok(res.rows_affected)
    }

    async fn reserve(&self, id: Uuid, qty: u32) -> anyhow::Result<Reservation> {
        let qty = i64::from(qty);
        // Single conditional UPDATE: the row is only touched while enough stock remains.
        let res = product::Entity::update_many()
            .col_expr(
                product::Column::Stock,
                Expr::col(product::Column::Stock).sub(qty),
            )
            .col_expr(product::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(product::Column::Id.eq(id))
            .filter(product::Column::Stock.gte(qty))
            .exec(&self.conn)
            .await
            .context("reserve stock failed")?;
        if res.rows_affected > 0 {
            return Ok(Reservation::Reserved);
        }

        Ok(match self.find_by_id(id).await? {
            Some(p) => Reservation::Insufficient { available: p.stock },
            None => Reservation::Missing,
        })
    }

    async fn release(&self, id: Uuid, qty: u32) -> anyhow::Result<bool> {
        let res = product::Entity::update_many()
            .col_expr(
                product::Column::Stock,
                Expr::col(product::Column::Stock).add(i64::from(qty)),
            )
            .col_expr(product::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(product::Column::Id.eq(id))
            .exec(&self.conn)
            .await
            .context("release stock failed")?;
        Ok(res.rows_affected > 0)
    }
}

pub struct SeaOrmCartsRepository<C>
where
    C: ConnectionTrait + Send + Sync,
{
    conn: C,
}

impl<C> SeaOrmCartsRepository<C>
where
    C: ConnectionTrait + Send + Sync,
{
    pub fn new(conn: C) -> Self {
        Self { conn }
    }
}

#[async_trait]
impl<C> CartsRepository for SeaOrmCartsRepository<C>
where
    C: ConnectionTrait + Send + Sync + 'static,
{
    async fn find_by_user(&self, user_id: Uuid) -> anyhow::Result<Option<Cart>> {
        let found = cart::Entity::find_by_id(user_id)
            .one(&self.conn)
            .await
            .context("find cart failed")?;
        found.map(mapper::cart_to_contract).transpose()
    }

    async fn save(&self, c: Cart) -> anyhow::Result<()> {
        let am = mapper::cart_to_active(&c)?;
        cart::Entity::insert(am)
            .on_conflict(
                OnConflict::column(cart::Column::UserId)
                    .update_columns([cart::Column::Items, cart::Column::UpdatedAt])
                    .to_owned(),
            )
            .exec(&self.conn)
            .await
            .context("save cart failed")?;
        Ok(())
    }
}

pub struct SeaOrmOrdersRepository<C>
where
    C: ConnectionTrait + Send + Sync,
{
    conn: C,
}

impl<C> SeaOrmOrdersRepository<C>
where
    C: ConnectionTrait + Send + Sync,
{
    pub fn new(conn: C) -> Self {
        Self { conn }
    }
}

#[async_trait]
impl<C> OrdersRepository for SeaOrmOrdersRepository<C>
where
    C: ConnectionTrait + Send + Sync + 'static,
{
    async fn insert(&self, o: Order) -> anyhow::Result<()> {
        let _ = mapper::order_to_active(&o)?
            .insert(&self.conn)
            .await
            .context("insert order failed")?;
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<Order>> {
        let found = order::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("find order failed")?;
        found.map(mapper::order_to_contract).transpose()
    }

    async fn list_all(&self) -> anyhow::Result<Vec<Order>> {
        let rows = order::Entity::find()
            .order_by_desc(order::Column::CreatedAt)
            .all(&self.conn)
            .await
            .context("list orders failed")?;
        rows.into_iter().map(mapper::order_to_contract).collect()
    }

    async fn list_by_user(&self, user_id: Uuid) -> anyhow::Result<Vec<Order>> {
        let rows = order::Entity::find()
            .filter(order::Column::UserId.eq(user_id))
            .order_by_desc(order::Column::CreatedAt)
            .all(&self.conn)
            .await
            .context("list user orders failed")?;
        rows.into_iter().map(mapper::order_to_contract).collect()
    }

    async fn transition(
        &self,
        id: Uuid,
        from: OrderStatus,
        to: OrderStatus,
    ) -> anyhow::Result<Option<Order>> {
        let res = order::Entity::update_many()
            .col_expr(order::Column::Status, Expr::value(to.as_str()))
            .col_expr(order::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(order::Column::Id.eq(id))
            .filter(order::Column::Status.eq(from.as_str()))
            .exec(&self.conn)
            .await
            .context("order status transition failed")?;
        if res.rows_affected == 0 {
            return Ok(None);
        }
        self.find_by_id(id).await
    }

    async fn delete(&self, id: Uuid) -> anyhow::Result<Option<Order>> {
        let Some(found) = self.find_by_id(id).await? else {
            return Ok(None);
        };
        let res = order::Entity::delete_by_id(id)
            .exec(&self.conn)
            .await
            .context("delete order failed")?;
        Ok((res.rows_affected > 0).then_some(found))
    }
}
