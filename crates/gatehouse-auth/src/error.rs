//! Authentication error types.

use gatehouse_core::GatehouseError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("principal is inactive")]
    PrincipalInactive,

    #[error("tenant is inactive")]
    TenantInactive,

    #[error("no access to this tenant")]
    NoTenantAccess,

    #[error("token has expired")]
    TokenExpired,

    #[error("invalid token: {0}")]
    TokenInvalid(String),

    #[error("cryptography error: {0}")]
    Crypto(String),
}

impl From<AuthError> for GatehouseError {
    fn from(err: AuthError) -> Self {
        match err {
            // All authentication failures collapse to a generic
            // "unauthorized" so callers cannot enumerate accounts or
            // probe tenant state. The detail stays in logs only.
            AuthError::InvalidCredentials
            | AuthError::PrincipalInactive
            | AuthError::TenantInactive
            | AuthError::TokenExpired
            | AuthError::TokenInvalid(_) => GatehouseError::AuthenticationFailed {
                reason: "unauthorized".into(),
            },
            // Authenticated but not allowed: a distinct kind, and the
            // same answer whether the target tenant exists or not.
            AuthError::NoTenantAccess => GatehouseError::AuthorizationDenied {
                reason: "no access to this tenant".into(),
            },
            AuthError::Crypto(msg) => GatehouseError::Crypto(msg),
        }
    }
}
