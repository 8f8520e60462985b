use thiserror::Error;

use crate::contract::model::Principal;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("No token provided")]
    Missing,
    #[error("Invalid token")]
    Invalid,
    #[error("Token expired")]
    Expired,
}

/// Credential verification seam of the access gate.
///
/// Implementations turn a bearer credential into a `Principal`; how tokens
/// are minted and signed is their own business.
pub trait TokenVerifier: Send + Sync {
    fn verify(&self, token: &str) -> Result<Principal, TokenError>;
}
