//! Role gate applied before invoking role-restricted operations.
//!
//! Ownership checks depend on the loaded document and stay in the services;
//! pure role requirements are checked here, ahead of the call.

use tracing::warn;

use crate::contract::model::{Principal, Role};
use crate::domain::error::DomainError;

/// Fail with `Forbidden` unless `principal` holds `required`.
pub fn require_role(principal: &Principal, required: Role) -> Result<(), DomainError> {
    match (required, principal.role) {
        (Role::User, _) | (Role::Admin, Role::Admin) => Ok(()),
        (Role::Admin, Role::User) => {
            warn!(user_id = %principal.user_id, "admin-only operation refused");
            Err(DomainError::forbidden("Admins only"))
        }
    }
}
