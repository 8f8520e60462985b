use std::str::FromStr;

use anyhow::Context;
use rust_decimal::Decimal;
use sea_orm::Set;

use crate::contract::model::{Cart, CartLine, Order, OrderLine, OrderStatus, Product};
use crate::infra::storage::entity::{cart, order, product};

/// Convert a product row to a contract model
pub fn product_to_contract(m: product::Model) -> anyhow::Result<Product> {
    Ok(Product {
        id: m.id,
        name: m.name,
        description: m.description,
        category: m.category,
        price: Decimal::from_str(&m.price)
            .with_context(|| format!("bad price '{}' on product {}", m.price, m.id))?,
        stock: u32::try_from(m.stock)
            .with_context(|| format!("stock out of range on product {}", m.id))?,
        created_at: m.created_at,
        updated_at: m.updated_at,
    })
}

pub fn product_to_active(p: Product) -> product::ActiveModel {
    product::ActiveModel {
        id: Set(p.id),
        name: Set(p.name),
        description: Set(p.description),
        category: Set(p.category),
        price: Set(p.price.to_string()),
        stock: Set(i64::from(p.stock)),
        created_at: Set(p.created_at),
        updated_at: Set(p.updated_at),
    }
}

pub fn cart_to_contract(m: cart::Model) -> anyhow::Result<Cart> {
    let items: Vec<CartLine> = serde_json::from_str(&m.items)
        .with_context(|| format!("bad cart document for user {}", m.user_id))?;
    Ok(Cart {
        user_id: m.user_id,
        items,
        updated_at: m.updated_at,
    })
}

pub fn cart_to_active(c: &Cart) -> anyhow::Result<cart::ActiveModel> {
    Ok(cart::ActiveModel {
        user_id: Set(c.user_id),
        items: Set(serde_json::to_string(&c.items)?),
        updated_at: Set(c.updated_at),
    })
}

pub fn order_to_contract(m: order::Model) -> anyhow::Result<Order> {
    let products: Vec<OrderLine> = serde_json::from_str(&m.products)
        .with_context(|| format!("bad order lines on order {}", m.id))?;
    let status = OrderStatus::from_str(&m.status)
        .map_err(|e| anyhow::anyhow!("bad status '{}' on order {}", e.0, m.id))?;
    Ok(Order {
        id: m.id,
        user_id: m.user_id,
        user_email: m.user_email,
        products,
        total_price: Decimal::from_str(&m.total_price)
            .with_context(|| format!("bad total on order {}", m.id))?,
        status,
        created_at: m.created_at,
        updated_at: m.updated_at,
    })
}

pub fn order_to_active(o: &Order) -> anyhow::Result<order::ActiveModel> {
    Ok(order::ActiveModel {
        id: Set(o.id),
        user_id: Set(o.user_id),
        user_email: Set(o.user_email.clone()),
        products: Set(serde_json::to_string(&o.products)?),
        total_price: Set(o.total_price.to_string()),
        status: Set(o.status.as_str().to_string()),
        created_at: Set(o.created_at),
        updated_at: Set(o.updated_at),
    })
}
