//! Bearer-token access gate for REST handlers.

use std::sync::Arc;

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;

use api_errors::ProblemResponse;

use crate::contract::model::Principal;
use crate::domain::ports::{TokenError, TokenVerifier};
use crate::errors::ErrorCode;

/// The verified caller. Handlers taking this extractor reject
/// unauthenticated requests with 401 before running.
#[derive(Debug, Clone)]
pub struct Authenticated(pub Principal);

impl<S> FromRequestParts<S> for Authenticated
where
    S: Send + Sync,
{
    type Rejection = ProblemResponse;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let path = parts.uri.path().to_owned();
        let Some(verifier) = parts.extensions.get::<Arc<dyn TokenVerifier>>().cloned() else {
            tracing::error!("No token verifier installed on the router");
            return Err(ErrorCode::Internal.respond("Authentication is unavailable", &path));
        };

        let token = bearer_token(parts).ok_or(TokenError::Missing);
        match token.and_then(|t| verifier.verify(t)) {
            Ok(principal) => Ok(Self(principal)),
            Err(e) => {
                tracing::debug!(error = %e, "Request not authenticated");
                Err(ErrorCode::Unauthorized.respond(e.to_string(), &path))
            }
        }
    }
}

fn bearer_token(parts: &Parts) -> Option<&str> {
    let value = parts.headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}
