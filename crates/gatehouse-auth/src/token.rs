//! Session token issuance and verification.
//!
//! Tokens are HS256 JWTs signed with the boot-supplied service secret.
//! The claim set is a snapshot taken at issuance time: a permission
//! change becomes visible only on refresh, never mid-lifetime.

use chrono::Utc;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use gatehouse_core::models::principal::PrincipalProfile;

use crate::config::AuthConfig;
use crate::error::AuthError;

/// Claims embedded in every session token.
///
/// Decoded defensively: the collection and flag fields default to
/// empty/false when absent, so a token minted by an older build still
/// parses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Subject — principal id (UUID string).
    pub sub: String,
    pub email: String,
    /// Tenant id (UUID string).
    pub tenant_id: String,
    /// Keys of the roles assigned at issuance time.
    #[serde(default)]
    pub roles: Vec<String>,
    /// Flattened, de-duplicated permission keys at issuance time.
    #[serde(default)]
    pub permissions: Vec<String>,
    #[serde(default)]
    pub is_super_admin: bool,
    /// Issuer.
    pub iss: String,
    /// Issued-at (Unix timestamp).
    pub iat: i64,
    /// Expiration (Unix timestamp).
    pub exp: i64,
    /// Unique token id (UUID string).
    pub jti: String,
}

impl SessionClaims {
    pub fn principal_id(&self) -> Result<Uuid, AuthError> {
        Uuid::parse_str(&self.sub).map_err(|e| AuthError::TokenInvalid(format!("bad sub: {e}")))
    }

    pub fn tenant_uuid(&self) -> Result<Uuid, AuthError> {
        Uuid::parse_str(&self.tenant_id)
            .map_err(|e| AuthError::TokenInvalid(format!("bad tenant_id: {e}")))
    }

    pub fn has_permission(&self, key: &str) -> bool {
        self.permissions.iter().any(|p| p == key)
    }
}

/// Issue a signed session token from a principal's current profile.
///
/// `remember_me` selects the long expiry.
pub fn issue_session_token(
    profile: &PrincipalProfile,
    remember_me: bool,
    config: &AuthConfig,
) -> Result<String, AuthError> {
    let now = Utc::now().timestamp();
    let ttl = if remember_me {
        config.remember_me_ttl_secs
    } else {
        config.session_ttl_secs
    };
    let claims = SessionClaims {
        sub: profile.id.to_string(),
        email: profile.email.clone(),
        tenant_id: profile.tenant_id.to_string(),
        roles: profile.role_keys(),
        permissions: profile.permission_keys(),
        is_super_admin: profile.is_super_admin,
        iss: config.jwt_issuer.clone(),
        iat: now,
        exp: now + ttl as i64,
        jti: Uuid::new_v4().to_string(),
    };

    let key = EncodingKey::from_secret(config.jwt_secret.as_bytes());
    let header = Header::new(Algorithm::HS256);
    jsonwebtoken::encode(&header, &claims, &key)
        .map_err(|e| AuthError::Crypto(format!("JWT encode: {e}")))
}

/// Decode and verify a session token's signature, expiry, and issuer.
pub fn decode_session_token(
    token: &str,
    config: &AuthConfig,
) -> Result<SessionClaims, AuthError> {
    let key = DecodingKey::from_secret(config.jwt_secret.as_bytes());

    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_issuer(&[&config.jwt_issuer]);
    validation.set_required_spec_claims(&["sub", "exp", "iat", "iss"]);

    jsonwebtoken::decode::<SessionClaims>(token, &key, &validation)
        .map(|data| data.claims)
        .map_err(|e| match e.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::TokenExpired,
            _ => AuthError::TokenInvalid(e.to_string()),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use gatehouse_core::models::permission::Permission;
    use gatehouse_core::models::role::{Role, RoleWithPermissions};

    fn test_config() -> AuthConfig {
        AuthConfig {
            jwt_secret: "test-secret".into(),
            ..AuthConfig::default()
        }
    }

    fn test_profile() -> PrincipalProfile {
        let now = Utc::now();
        let tenant_id = Uuid::new_v4();
        let perm = |key: &str| Permission {
            id: Uuid::new_v4(),
            key: key.into(),
            description: key.replace('.', " "),
            created_at: now,
        };
        let role = |key: &str, perms: Vec<Permission>| RoleWithPermissions {
            role: Role {
                id: Uuid::new_v4(),
                tenant_id,
                key: key.into(),
                name: key.into(),
                description: String::new(),
                created_at: now,
                updated_at: now,
            },
            permissions: perms,
        };
        PrincipalProfile {
            id: Uuid::new_v4(),
            tenant_id,
            tenant_name: "Test Tenant".into(),
            tenant_active: true,
            email: "alice@example.com".into(),
            password_hash: String::new(),
            first_name: "Alice".into(),
            last_name: "Ames".into(),
            is_active: true,
            is_super_admin: false,
            roles: vec![
                role(
                    "receptionist",
                    vec![perm("visit.view"), perm("visit.checkin")],
                ),
                role("security", vec![perm("visit.view"), perm("visit.checkout")]),
            ],
        }
    }

    #[test]
    fn roundtrip_carries_snapshot() {
        let config = test_config();
        let profile = test_profile();

        let token = issue_session_token(&profile, false, &config).unwrap();
        let claims = decode_session_token(&token, &config).unwrap();

        assert_eq!(claims.sub, profile.id.to_string());
        assert_eq!(claims.tenant_id, profile.tenant_id.to_string());
        assert_eq!(claims.roles, vec!["receptionist", "security"]);
        // Union is de-duplicated and sorted.
        assert_eq!(
            claims.permissions,
            vec!["visit.checkin", "visit.checkout", "visit.view"]
        );
        assert!(!claims.is_super_admin);
    }

    #[test]
    fn remember_me_extends_expiry() {
        let config = test_config();
        let profile = test_profile();

        let short = decode_session_token(
            &issue_session_token(&profile, false, &config).unwrap(),
            &config,
        )
        .unwrap();
        let long = decode_session_token(
            &issue_session_token(&profile, true, &config).unwrap(),
            &config,
        )
        .unwrap();
        assert!(long.exp > short.exp);
    }

    #[test]
    fn tampered_token_is_rejected() {
        let config = test_config();
        let token = issue_session_token(&test_profile(), false, &config).unwrap();

        let mut tampered = token.into_bytes();
        let last = tampered.len() - 1;
        tampered[last] = if tampered[last] == b'A' { b'B' } else { b'A' };
        let tampered = String::from_utf8(tampered).unwrap();

        assert!(matches!(
            decode_session_token(&tampered, &config),
            Err(AuthError::TokenInvalid(_))
        ));
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let config = test_config();
        let token = issue_session_token(&test_profile(), false, &config).unwrap();

        let other = AuthConfig {
            jwt_secret: "other-secret".into(),
            ..AuthConfig::default()
        };
        assert!(decode_session_token(&token, &other).is_err());
    }

    #[test]
    fn expired_token_is_rejected() {
        let config = test_config();
        let now = Utc::now().timestamp();
        let claims = SessionClaims {
            sub: Uuid::new_v4().to_string(),
            email: "a@example.com".into(),
            tenant_id: Uuid::new_v4().to_string(),
            roles: vec![],
            permissions: vec![],
            is_super_admin: false,
            iss: config.jwt_issuer.clone(),
            iat: now - 7200,
            exp: now - 3600,
            jti: Uuid::new_v4().to_string(),
        };
        let token = jsonwebtoken::encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(config.jwt_secret.as_bytes()),
        )
        .unwrap();

        assert!(matches!(
            decode_session_token(&token, &config),
            Err(AuthError::TokenExpired)
        ));
    }

    #[test]
    fn missing_collection_claims_default_to_empty() {
        let config = test_config();
        let now = Utc::now().timestamp();

        #[derive(Serialize)]
        struct BareClaims<'a> {
            sub: String,
            email: &'a str,
            tenant_id: String,
            iss: &'a str,
            iat: i64,
            exp: i64,
            jti: String,
        }
        let bare = BareClaims {
            sub: Uuid::new_v4().to_string(),
            email: "a@example.com",
            tenant_id: Uuid::new_v4().to_string(),
            iss: &config.jwt_issuer,
            iat: now,
            exp: now + 600,
            jti: Uuid::new_v4().to_string(),
        };
        let token = jsonwebtoken::encode(
            &Header::new(Algorithm::HS256),
            &bare,
            &EncodingKey::from_secret(config.jwt_secret.as_bytes()),
        )
        .unwrap();

        let claims = decode_session_token(&token, &config).unwrap();
        assert!(claims.roles.is_empty());
        assert!(claims.permissions.is_empty());
        assert!(!claims.is_super_admin);
    }
}
