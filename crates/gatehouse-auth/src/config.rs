//! Authentication configuration.

/// Configuration for the session service.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Shared secret for HS256 session token signing, supplied at boot.
    pub jwt_secret: String,
    /// JWT issuer (`iss` claim).
    pub jwt_issuer: String,
    /// Ordinary session lifetime in seconds (default: 86_400 = 24 h).
    pub session_ttl_secs: u64,
    /// "Remember me" session lifetime in seconds
    /// (default: 2_592_000 = 30 days).
    pub remember_me_ttl_secs: u64,
    /// Liveness cache entry TTL in seconds (default: 300 = 5 min).
    pub liveness_ttl_secs: u64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: String::new(),
            jwt_issuer: "gatehouse".into(),
            session_ttl_secs: 86_400,
            remember_me_ttl_secs: 2_592_000,
            liveness_ttl_secs: 300,
        }
    }
}
