//! HTTP host: wraps module routers in the global middleware stack, exposes
//! `/health` and `/openapi.json`, and runs the server until cancelled.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use axum::http::header;
use axum::response::IntoResponse;
use axum::{middleware::from_fn, routing::get, Router};
use tokio_util::sync::CancellationToken;
use tower_http::{
    cors::CorsLayer,
    limit::RequestBodyLimitLayer,
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
};
use utoipa::openapi::{InfoBuilder, OpenApi, OpenApiBuilder};

mod config;
pub mod request_id;
mod web;

pub use config::ApiIngressConfig;

/// Owns the global HTTP concerns and collects the OpenAPI documents of the
/// modules it hosts into a single document.
pub struct ApiIngress {
    config: ApiIngressConfig,
    openapi: OpenApi,
}

impl Default for ApiIngress {
    fn default() -> Self {
        Self::new(ApiIngressConfig::default())
    }
}

impl ApiIngress {
    pub fn new(config: ApiIngressConfig) -> Self {
        let openapi = OpenApiBuilder::new()
            .info(
                InfoBuilder::new()
                    .title("Storefront API")
                    .version(env!("CARGO_PKG_VERSION"))
                    .description(Some("Storefront Server API Documentation"))
                    .build(),
            )
            .build();
        Self { config, openapi }
    }

    pub fn config(&self) -> &ApiIngressConfig {
        &self.config
    }

    /// Merge a module's OpenAPI document into the host document.
    pub fn register_openapi(&mut self, doc: OpenApi) {
        let before = self.openapi.paths.paths.len();
        self.openapi.merge(doc);
        tracing::debug!(
            added = self.openapi.paths.paths.len().saturating_sub(before),
            "Registered OpenAPI paths"
        );
    }

    pub fn openapi(&self) -> &OpenApi {
        &self.openapi
    }

    /// Wrap `routes` with the host endpoints and the global middleware stack.
    pub fn build_router(&self, routes: Router) -> Result<Router> {
        let mut router = routes.route("/health", get(web::health_check));

        if self.config.enable_docs {
            // Serialize once, serve the same bytes for every request
            let doc = Arc::new(serde_json::to_value(&self.openapi)?);
            tracing::info!(
                "Serving OpenAPI with {} paths",
                self.openapi.paths.paths.len()
            );
            router = router.route(
                "/openapi.json",
                get(move || {
                    let doc = doc.clone();
                    async move {
                        (
                            [(header::CACHE_CONTROL, "no-store")],
                            axum::Json((*doc).clone()),
                        )
                            .into_response()
                    }
                }),
            );
        }

        // Router::layer wraps everything added before it, so layers are added
        // innermost first. Outermost to innermost:
        // SetRequestId -> PropagateRequestId -> Trace -> push_req_id -> Timeout -> CORS -> BodyLimit
        router = router.layer(RequestBodyLimitLayer::new(self.config.body_limit_bytes));

        if self.config.cors_enabled {
            router = router.layer(CorsLayer::permissive());
        }

        router = router.layer(TimeoutLayer::new(Duration::from_secs(
            self.config.request_timeout_secs,
        )));

        let x_request_id = request_id::header();
        router = router
            .layer(from_fn(request_id::push_req_id_to_extensions))
            .layer(request_id::create_trace_layer())
            .layer(PropagateRequestIdLayer::new(x_request_id.clone()))
            .layer(SetRequestIdLayer::new(x_request_id, request_id::MakeReqId));

        Ok(router)
    }
}

/// Bind `addr` and serve `router` until `cancel` fires.
pub async fn serve(router: Router, addr: SocketAddr, cancel: CancellationToken) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("HTTP server bound on {}", listener.local_addr()?);

    let shutdown = async move {
        cancel.cancelled().await;
        tracing::info!("HTTP server shutting down gracefully (cancellation)");
    };

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| anyhow::anyhow!(e))
}
