use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use tracing::{debug, info, instrument};
use uuid::Uuid;

use crate::contract::model::{NewProduct, Product, ProductPatch};
use crate::domain::error::DomainError;
use crate::domain::repo::{ProductsRepository, Reservation};

/// Configuration for the catalog service
#[derive(Debug, Clone)]
pub struct CatalogConfig {
    pub allowed_categories: Vec<String>,
    pub max_name_length: usize,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            allowed_categories: vec![
                "Kids Clothes".to_string(),
                "Maternity Wear".to_string(),
                "Men Vests".to_string(),
            ],
            max_name_length: 200,
        }
    }
}

/// Product catalog: plain reads/writes plus the stock-adjustment contract
/// consumed by the cart and order services.
#[derive(Clone)]
pub struct CatalogService {
    repo: Arc<dyn ProductsRepository>,
    config: CatalogConfig,
}

impl CatalogService {
    pub fn new(repo: Arc<dyn ProductsRepository>, config: CatalogConfig) -> Self {
        Self { repo, config }
    }

    #[instrument(name = "storefront.catalog.list_products", skip(self))]
    pub async fn list_products(&self, category: Option<&str>) -> Result<Vec<Product>, DomainError> {
        if let Some(category) = category {
            self.validate_category(category)?;
        }

        let products = self
            .repo
            .list(category)
            .await
            .map_err(|e| DomainError::database(e.to_string()))?;

        match category {
            Some(c) if products.is_empty() => Err(DomainError::empty_category(c)),
            _ => Ok(products),
        }
    }

    #[instrument(name = "storefront.catalog.get_product", skip(self), fields(product_id = %id))]
    pub async fn get_product(&self, id: Uuid) -> Result<Product, DomainError> {
        self.find(id)
            .await?
            .ok_or_else(|| DomainError::product_not_found(id))
    }

    /// Load a product, `None` when it does not exist.
    pub(crate) async fn find(&self, id: Uuid) -> Result<Option<Product>, DomainError> {
        self.repo
            .find_by_id(id)
            .await
            .map_err(|e| DomainError::database(e.to_string()))
    }

    #[instrument(name = "storefront.catalog.create_product", skip(self, new), fields(name = %new.name))]
    pub async fn create_product(&self, new: NewProduct) -> Result<Product, DomainError> {
        let mut created = self.create_products(vec![new]).await?;
        created
            .pop()
            .ok_or_else(|| DomainError::database("insert returned no product"))
    }

    /// Create several products. The whole batch is validated before anything is stored.
    #[instrument(name = "storefront.catalog.create_products", skip(self, batch), fields(count = batch.len()))]
    pub async fn create_products(&self, batch: Vec<NewProduct>) -> Result<Vec<Product>, DomainError> {
        if batch.is_empty() {
            return Err(DomainError::validation("products", "at least one product is required"));
        }

        let mut seen: Vec<&str> = Vec::with_capacity(batch.len());
        for new in &batch {
            self.validate_name(&new.name)?;
            self.validate_category(&new.category)?;
            validate_price(new.price)?;
            if seen.contains(&new.name.as_str()) || self.name_taken(&new.name, None).await? {
                return Err(DomainError::name_conflict(new.name.clone()));
            }
            seen.push(&new.name);
        }

        let now = Utc::now();
        let mut created = Vec::with_capacity(batch.len());
        for new in batch {
            let product = Product {
                id: Uuid::new_v4(),
                name: new.name,
                description: new.description,
                category: new.category,
                price: new.price,
                stock: new.stock,
                created_at: now,
                updated_at: now,
            };
            self.repo
                .insert(product.clone())
                .await
                .map_err(|e| DomainError::database(e.to_string()))?;
            created.push(product);
        }

        info!("Created {} product(s)", created.len());
        Ok(created)
    }

    #[instrument(name = "storefront.catalog.update_product", skip(self, patch), fields(product_id = %id))]
    pub async fn update_product(&self, id: Uuid, patch: ProductPatch) -> Result<Product, DomainError> {
        let current = self.get_product(id).await?;

        if let Some(ref name) = patch.name {
            self.validate_name(name)?;
            if name != &current.name && self.name_taken(name, Some(id)).await? {
                return Err(DomainError::name_conflict(name.clone()));
            }
        }
        if let Some(ref category) = patch.category {
            self.validate_category(category)?;
        }
        if let Some(price) = patch.price {
            validate_price(price)?;
        }

        let updated = self
            .repo
            .update(id, &patch)
            .await
            .map_err(|e| DomainError::database(e.to_string()))?
            .ok_or_else(|| DomainError::product_not_found(id))?;

        info!("Updated product");
        Ok(updated)
    }

    /// Delete a product. Cart lines pointing at it are left dangling.
    #[instrument(name = "storefront.catalog.delete_product", skip(self), fields(product_id = %id))]
    pub async fn delete_product(&self, id: Uuid) -> Result<Product, DomainError> {
        let deleted = self
            .repo
            .delete(id)
            .await
            .map_err(|e| DomainError::database(e.to_string()))?
            .ok_or_else(|| DomainError::product_not_found(id))?;
        info!("Deleted product");
        Ok(deleted)
    }

    #[instrument(name = "storefront.catalog.delete_all_products", skip(self))]
    pub async fn delete_all_products(&self) -> Result<u64, DomainError> {
        let count = self
            .repo
            .delete_all()
            .await
            .map_err(|e| DomainError::database(e.to_string()))?;
        if count == 0 {
            return Err(DomainError::EmptyCatalog);
        }
        info!("Deleted {} product(s)", count);
        Ok(count)
    }

    // --- stock-adjustment contract ---

    /// Take `qty` units out of stock.
    #[instrument(name = "storefront.catalog.reserve", skip(self), fields(product_id = %id))]
    pub async fn reserve(&self, id: Uuid, qty: u32) -> Result<(), DomainError> {
        let outcome = self
            .repo
            .reserve(id, qty)
            .await
            .map_err(|e| DomainError::database(e.to_string()))?;

        match outcome {
            Reservation::Reserved => {
                debug!("Stock reserved");
                Ok(())
            }
            Reservation::Insufficient { available } => {
                Err(DomainError::insufficient_stock(id, qty, available))
            }
            Reservation::Missing => Err(DomainError::product_not_found(id)),
        }
    }

    /// Put `qty` units back. A product deleted in the meantime is skipped
    /// silently; the return value tells whether stock was restored.
    #[instrument(name = "storefront.catalog.release", skip(self), fields(product_id = %id))]
    pub async fn release(&self, id: Uuid, qty: u32) -> Result<bool, DomainError> {
        let restored = self
            .repo
            .release(id, qty)
            .await
            .map_err(|e| DomainError::database(e.to_string()))?;
        if !restored {
            debug!("Product gone, stock not restored");
        }
        Ok(restored)
    }

    // --- validation helpers ---

    async fn name_taken(&self, name: &str, except: Option<Uuid>) -> Result<bool, DomainError> {
        self.repo
            .name_taken(name, except)
            .await
            .map_err(|e| DomainError::database(e.to_string()))
    }

    fn validate_name(&self, name: &str) -> Result<(), DomainError> {
        if name.trim().is_empty() {
            return Err(DomainError::validation("name", "cannot be empty"));
        }
        if name.len() > self.config.max_name_length {
            return Err(DomainError::validation(
                "name",
                format!("too long: {} characters (max: {})", name.len(), self.config.max_name_length),
            ));
        }
        Ok(())
    }

    fn validate_category(&self, category: &str) -> Result<(), DomainError> {
        if self.config.allowed_categories.iter().any(|c| c == category) {
            Ok(())
        } else {
            Err(DomainError::validation(
                "category",
                format!("'{category}' is not a known category"),
            ))
        }
    }
}

fn validate_price(price: Decimal) -> Result<(), DomainError> {
    if price < Decimal::ZERO {
        return Err(DomainError::validation("price", "must not be negative"));
    }
    Ok(())
}
