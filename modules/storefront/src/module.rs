use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use axum::Router;
use sea_orm::{DatabaseConnection, SqlxSqliteConnector};
use sea_orm_migration::MigratorTrait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use tracing::{info, warn};
use utoipa::OpenApi;

use crate::api::rest::openapi::StorefrontApiDoc;
use crate::api::rest::routes::{self, RestServices};
use crate::config::StorefrontConfig;
use crate::contract::client::StorefrontApi;
use crate::domain::cart_service::CartService;
use crate::domain::catalog::CatalogService;
use crate::domain::order_service::OrderService;
use crate::domain::ports::TokenVerifier;
use crate::domain::repo::{CartsRepository, OrdersRepository, ProductsRepository};
use crate::gateways::local::StorefrontLocalClient;
use crate::infra::auth::JwtTokens;
use crate::infra::storage::migrations::Migrator;
use crate::infra::storage::{
    MemoryStore, SeaOrmCartsRepository, SeaOrmOrdersRepository, SeaOrmProductsRepository,
};

pub const MEMORY_URL: &str = "memory://";
const DEFAULT_MAX_CONNS: u32 = 10;

/// Where the storefront keeps its documents.
#[derive(Debug, Clone)]
pub struct StorageOptions {
    /// `memory://`, `sqlite://path/to/file.db` or `sqlite::memory:`.
    pub url: String,
    pub max_conns: Option<u32>,
    pub busy_timeout: Option<Duration>,
}

impl StorageOptions {
    pub fn memory() -> Self {
        Self {
            url: MEMORY_URL.to_string(),
            max_conns: None,
            busy_timeout: None,
        }
    }

    pub fn sqlite(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            max_conns: None,
            busy_timeout: Some(Duration::from_millis(5000)),
        }
    }
}

enum Backend {
    Memory,
    Sql(DatabaseConnection),
}

/// The storefront module: services wired to one storage backend, plus the
/// REST surface and token handling built on top of them.
pub struct Storefront {
    backend: Backend,
    catalog: Arc<CatalogService>,
    carts: Arc<CartService>,
    orders: Arc<OrderService>,
    tokens: Arc<JwtTokens>,
}

impl Storefront {
    /// Storefront over the in-process document store. Nothing survives a restart.
    pub fn in_memory(config: &StorefrontConfig) -> Self {
        let store = MemoryStore::new();
        Self::assemble(
            config,
            Backend::Memory,
            Arc::new(store.clone()),
            Arc::new(store.clone()),
            Arc::new(store),
        )
    }

    /// Storefront over an already open SeaORM connection.
    pub fn from_connection(config: &StorefrontConfig, conn: DatabaseConnection) -> Self {
        Self::assemble(
            config,
            Backend::Sql(conn.clone()),
            Arc::new(SeaOrmProductsRepository::new(conn.clone())),
            Arc::new(SeaOrmCartsRepository::new(conn.clone())),
            Arc::new(SeaOrmOrdersRepository::new(conn)),
        )
    }

    /// Pick the backend from the storage URL and open it.
    pub async fn connect(config: &StorefrontConfig, storage: &StorageOptions) -> Result<Self> {
        let url = storage.url.trim_start();
        if url.starts_with(MEMORY_URL) {
            info!("Using in-memory storage");
            return Ok(Self::in_memory(config));
        }
        if !url.starts_with("sqlite:") {
            bail!("unsupported storage url '{}'", storage.url);
        }

        let conn = connect_sqlite(storage).await?;
        info!("Connected to {}", storage.url);
        Ok(Self::from_connection(config, conn))
    }

    fn assemble(
        config: &StorefrontConfig,
        backend: Backend,
        products: Arc<dyn ProductsRepository>,
        carts: Arc<dyn CartsRepository>,
        orders: Arc<dyn OrdersRepository>,
    ) -> Self {
        if config.jwt_secret == StorefrontConfig::default().jwt_secret {
            warn!("storefront.jwt_secret is the built-in default; set a real secret outside development");
        }

        let catalog = Arc::new(CatalogService::new(products, config.catalog()));
        let carts = Arc::new(CartService::new(carts, catalog.clone()));
        let orders = Arc::new(OrderService::new(orders, catalog.clone()));
        let tokens = Arc::new(JwtTokens::new(&config.jwt_secret, config.token_ttl_secs));

        Self {
            backend,
            catalog,
            carts,
            orders,
            tokens,
        }
    }

    /// Bring the schema up to date. No-op for the in-memory store.
    pub async fn migrate(&self) -> Result<()> {
        match &self.backend {
            Backend::Memory => Ok(()),
            Backend::Sql(conn) => {
                info!("Running storefront migrations");
                Migrator::up(conn, None)
                    .await
                    .context("storefront migrations failed")
            }
        }
    }

    pub fn backend_name(&self) -> &'static str {
        match self.backend {
            Backend::Memory => "memory",
            Backend::Sql(_) => "sqlite",
        }
    }

    /// In-process client for other modules and tools.
    pub fn client(&self) -> Arc<dyn StorefrontApi> {
        Arc::new(StorefrontLocalClient::new(
            self.catalog.clone(),
            self.carts.clone(),
            self.orders.clone(),
        ))
    }

    pub fn tokens(&self) -> Arc<JwtTokens> {
        self.tokens.clone()
    }

    /// Mount the storefront REST routes onto `router`.
    pub fn register_rest(&self, router: Router) -> Router {
        let verifier: Arc<dyn TokenVerifier> = self.tokens.clone();
        let router = routes::register_routes(
            router,
            RestServices {
                catalog: self.catalog.clone(),
                carts: self.carts.clone(),
                orders: self.orders.clone(),
                verifier,
            },
        );
        info!("Storefront REST routes registered");
        router
    }

    pub fn openapi(&self) -> utoipa::openapi::OpenApi {
        StorefrontApiDoc::openapi()
    }
}

fn is_memory_sqlite(url: &str) -> bool {
    url.contains(":memory:") || url.contains("mode=memory")
}

async fn connect_sqlite(storage: &StorageOptions) -> Result<DatabaseConnection> {
    let options = SqliteConnectOptions::from_str(&storage.url)
        .with_context(|| format!("invalid sqlite url '{}'", storage.url))?
        .create_if_missing(true);

    let mut pool = SqlitePoolOptions::new();
    if is_memory_sqlite(&storage.url) {
        // Every connection to an in-memory database opens its own database.
        pool = pool.max_connections(1).idle_timeout(None).max_lifetime(None);
    } else {
        ensure_parent_dir(options.get_filename())?;
        pool = pool.max_connections(storage.max_conns.unwrap_or(DEFAULT_MAX_CONNS));
    }

    let busy = storage.busy_timeout;
    pool = pool.after_connect(move |conn, _meta| {
        Box::pin(async move {
            sqlx::query("PRAGMA journal_mode = WAL")
                .execute(&mut *conn)
                .await?;
            if let Some(timeout) = busy {
                // PRAGMA takes no bind parameters
                let ms = i64::try_from(timeout.as_millis()).unwrap_or(i64::MAX);
                let stmt = format!("PRAGMA busy_timeout = {ms}");
                sqlx::query(&stmt).execute(&mut *conn).await?;
            }
            Ok(())
        })
    });

    let pool = pool
        .connect_with(options)
        .await
        .with_context(|| format!("failed to open {}", storage.url))?;
    Ok(SqlxSqliteConnector::from_sqlx_sqlite_pool(pool))
}

fn ensure_parent_dir(file: &Path) -> Result<()> {
    match file.parent() {
        Some(dir) if !dir.as_os_str().is_empty() && !dir.exists() => {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("failed to create {}", dir.display()))?;
            info!("Created database directory {}", dir.display());
            Ok(())
        }
        _ => Ok(()),
    }
}
