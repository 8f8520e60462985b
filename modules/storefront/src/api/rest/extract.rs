//! Extractors that turn axum rejections into problem responses, so that
//! malformed bodies and identifiers always surface as 400.

use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{FromRequest, FromRequestParts, Path, Request};
use axum::http::request::Parts;
use axum::Json;
use serde::de::DeserializeOwned;
use uuid::Uuid;

use api_errors::ProblemResponse;

use crate::errors::ErrorCode;

/// JSON body; any rejection (syntax, shape, content type) is a 400.
pub struct JsonBody<T>(pub T);

impl<S, T> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ProblemResponse;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let path = req.uri().path().to_owned();
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(rejection) => Err(bad_body(&rejection, &path)),
        }
    }
}

fn bad_body(rejection: &JsonRejection, path: &str) -> ProblemResponse {
    tracing::debug!(error = %rejection.body_text(), "Rejected request body");
    ErrorCode::BadRequest.respond(rejection.body_text(), path)
}

/// `{id}` path segment parsed as a UUID.
pub struct PathId(pub Uuid);

impl<S> FromRequestParts<S> for PathId
where
    S: Send + Sync,
{
    type Rejection = ProblemResponse;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match Path::<Uuid>::from_request_parts(parts, state).await {
            Ok(Path(id)) => Ok(Self(id)),
            Err(rejection) => Err(bad_id(&rejection, parts.uri.path())),
        }
    }
}

fn bad_id(rejection: &PathRejection, path: &str) -> ProblemResponse {
    tracing::debug!(error = %rejection.body_text(), "Rejected path identifier");
    ErrorCode::BadRequest.respond("Malformed identifier", path)
}
