use chrono::Utc;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::contract::model::{Principal, Role};
use crate::domain::ports::{TokenError, TokenVerifier};

/// Bearer token claims. `sub` also accepts the legacy `userId` key.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Claims {
    #[serde(alias = "userId")]
    pub sub: Uuid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default = "default_role")]
    pub role: Role,
    pub iat: u64,
    pub exp: u64,
}

fn default_role() -> Role {
    Role::User
}

impl From<Claims> for Principal {
    fn from(c: Claims) -> Self {
        Principal {
            user_id: c.sub,
            email: c.email,
            role: c.role,
        }
    }
}

/// HS256 token signer and verifier sharing one secret.
pub struct JwtTokens {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl_secs: u64,
}

impl JwtTokens {
    pub fn new(secret: &str, ttl_secs: u64) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            ttl_secs,
        }
    }

    /// Mint a token for `principal` valid for the configured lifetime.
    pub fn issue(&self, principal: &Principal) -> anyhow::Result<String> {
        let now = u64::try_from(Utc::now().timestamp())?;
        self.issue_claims(&Claims {
            sub: principal.user_id,
            email: principal.email.clone(),
            role: principal.role,
            iat: now,
            exp: now + self.ttl_secs,
        })
    }

    pub fn issue_claims(&self, claims: &Claims) -> anyhow::Result<String> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding)
            .map_err(|e| anyhow::anyhow!("failed to sign token: {e}"))
    }
}

impl TokenVerifier for JwtTokens {
    fn verify(&self, token: &str) -> Result<Principal, TokenError> {
        if token.trim().is_empty() {
            return Err(TokenError::Missing);
        }
        let data = decode::<Claims>(token, &self.decoding, &self.validation).map_err(|e| {
            let err = match e.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Invalid,
            };
            warn!(error = %e, "Bearer token rejected");
            err
        })?;
        debug!(sub = %data.claims.sub, "Bearer token accepted");
        Ok(data.claims.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issued_token_verifies_back_to_principal() {
        let tokens = JwtTokens::new("secret", 60);
        let p = Principal::admin(Uuid::new_v4()).with_email("boss@example.com");
        let token = tokens.issue(&p).unwrap();
        assert_eq!(tokens.verify(&token).unwrap(), p);
    }

    #[test]
    fn wrong_secret_is_invalid() {
        let token = JwtTokens::new("one", 60)
            .issue(&Principal::user(Uuid::new_v4()))
            .unwrap();
        assert_eq!(
            JwtTokens::new("two", 60).verify(&token),
            Err(TokenError::Invalid)
        );
    }

    #[test]
    fn expired_token_is_reported() {
        let tokens = JwtTokens::new("secret", 60);
        let now = Utc::now().timestamp() as u64;
        let token = tokens
            .issue_claims(&Claims {
                sub: Uuid::new_v4(),
                email: None,
                role: Role::User,
                iat: now - 7200,
                exp: now - 3600,
            })
            .unwrap();
        assert_eq!(tokens.verify(&token), Err(TokenError::Expired));
    }

    #[test]
    fn legacy_user_id_claim_is_accepted() {
        let tokens = JwtTokens::new("secret", 60);
        let id = Uuid::new_v4();
        let now = Utc::now().timestamp() as u64;
        let claims = serde_json::json!({
            "userId": id,
            "email": "a@example.com",
            "role": "user",
            "iat": now,
            "exp": now + 60,
        });
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(b"secret"),
        )
        .unwrap();
        let p = tokens.verify(&token).unwrap();
        assert_eq!(p.user_id, id);
        assert_eq!(p.role, Role::User);
    }

    #[test]
    fn garbage_is_invalid_and_blank_is_missing() {
        let tokens = JwtTokens::new("secret", 60);
        assert_eq!(tokens.verify("not-a-jwt"), Err(TokenError::Invalid));
        assert_eq!(tokens.verify("  "), Err(TokenError::Missing));
    }
}
