use axum::{
    body::Body,
    http::{Request, StatusCode},
    routing::post,
    Router,
};
use tower::util::ServiceExt;
use utoipa::OpenApi;

use api_ingress::{ApiIngress, ApiIngressConfig};

#[derive(OpenApi)]
#[openapi(paths(echo))]
struct EchoDoc;

/// Echo the body back
#[utoipa::path(post, path = "/echo", responses((status = 200, description = "Echoed body")))]
async fn echo(body: String) -> String {
    body
}

fn app(config: ApiIngressConfig) -> Router {
    let mut ingress = ApiIngress::new(config);
    ingress.register_openapi(EchoDoc::openapi());
    ingress
        .build_router(Router::new().route("/echo", post(echo)))
        .unwrap()
}

#[tokio::test]
async fn openapi_contains_registered_paths() {
    let resp = app(ApiIngressConfig::default())
        .oneshot(
            Request::builder()
                .uri("/openapi.json")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap();
    let doc: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(doc["info"]["title"], "Storefront API");
    assert!(doc["paths"]["/echo"]["post"].is_object());
}

#[tokio::test]
async fn oversized_bodies_are_rejected() {
    let cfg = ApiIngressConfig {
        body_limit_bytes: 8,
        ..Default::default()
    };
    let resp = app(cfg)
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/echo")
                .header("content-length", "32")
                .body(Body::from("x".repeat(32)))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::PAYLOAD_TOO_LARGE);
}

#[tokio::test]
async fn health_reports_healthy() {
    let resp = app(ApiIngressConfig::default())
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["status"], "healthy");
}
