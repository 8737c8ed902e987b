//! Error types for the gatehouse system.
//!
//! Every variant except `Storage` is an expected, typed outcome that the
//! transport layer maps to a response. Cache failures are degradable:
//! services fall back to direct storage reads rather than surfacing them.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum GatehouseError {
    /// Entity absent, or present in another tenant — the two are
    /// indistinguishable by design.
    #[error("{entity} not found")]
    NotFound { entity: String },

    /// Bad credentials, invalid/expired token, or inactive
    /// principal/tenant. Always generic — never distinguishes the cause.
    #[error("unauthorized")]
    AuthenticationFailed { reason: String },

    /// Valid session, insufficient permission/role, or wrong tenant.
    #[error("forbidden: {reason}")]
    AuthorizationDenied { reason: String },

    /// The requested transition is incompatible with the entity's
    /// current state.
    #[error("conflict: {message}")]
    StateConflict { message: String },

    /// Capability token failed parsing or MAC verification. Generic on
    /// purpose — no oracle distinguishing format errors from signature
    /// errors.
    #[error("invalid token")]
    MalformedToken,

    #[error("validation error: {message}")]
    Validation { message: String },

    #[error("rate limit exceeded")]
    RateLimited,

    #[error("storage error: {0}")]
    Storage(String),

    #[error("cache error: {0}")]
    Cache(String),

    #[error("cryptography error: {0}")]
    Crypto(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl GatehouseError {
    pub fn not_found(entity: impl Into<String>) -> Self {
        Self::NotFound {
            entity: entity.into(),
        }
    }
}

pub type GatehouseResult<T> = Result<T, GatehouseError>;
