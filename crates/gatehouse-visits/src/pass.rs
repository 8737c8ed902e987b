//! Pass token protocol.
//!
//! A pass is a compact signed string `vv:{visitId}:{mac}` binding a
//! visit id to the service-wide pass secret. The MAC is HMAC-SHA256
//! over the visit id, hex-encoded and truncated to 12 characters — a
//! deliberate trade of forgery margin for a shorter scannable payload,
//! backed by the short validity window and the state guard that makes
//! each pass single-use in effect.
//!
//! Every verification failure is reported as `MalformedToken`, so a
//! probing caller cannot tell a parse error from a bad signature.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;
use uuid::Uuid;

use gatehouse_core::{GatehouseError, GatehouseResult};

type HmacSha256 = Hmac<Sha256>;

/// Token tag, first segment of every pass.
pub const PASS_TAG: &str = "vv";

/// Hex characters of the truncated MAC.
const MAC_LEN: usize = 12;

fn mac_for(visit_id: Uuid, secret: &str) -> GatehouseResult<String> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| GatehouseError::Crypto(format!("pass secret: {e}")))?;
    mac.update(visit_id.to_string().as_bytes());
    let digest = hex::encode(mac.finalize().into_bytes());
    Ok(digest[..MAC_LEN].to_string())
}

/// Generate a signed pass token for a visit.
pub fn generate_pass_token(visit_id: Uuid, secret: &str) -> GatehouseResult<String> {
    let mac = mac_for(visit_id, secret)?;
    Ok(format!("{PASS_TAG}:{visit_id}:{mac}"))
}

/// Verify a pass token and extract the visit id it binds.
pub fn verify_pass_token(token: &str, secret: &str) -> GatehouseResult<Uuid> {
    let mut parts = token.split(':');
    let (tag, id_part, provided_mac) = match (parts.next(), parts.next(), parts.next(), parts.next())
    {
        (Some(tag), Some(id), Some(mac), None) => (tag, id, mac),
        _ => return Err(GatehouseError::MalformedToken),
    };
    if tag != PASS_TAG {
        return Err(GatehouseError::MalformedToken);
    }
    let visit_id = Uuid::parse_str(id_part).map_err(|_| GatehouseError::MalformedToken)?;

    let expected = mac_for(visit_id, secret)?;
    let matches: bool = expected
        .as_bytes()
        .ct_eq(provided_mac.as_bytes())
        .into();
    if !matches {
        return Err(GatehouseError::MalformedToken);
    }
    Ok(visit_id)
}

/// The URL embedded in the rendered pass, so phone cameras open the
/// scan page directly.
pub fn scan_url(base_app_url: &str, token: &str) -> String {
    format!("{}/scan/{token}", base_app_url.trim_end_matches('/'))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "pass-secret";

    #[test]
    fn roundtrip_verifies() {
        let visit_id = Uuid::new_v4();
        let token = generate_pass_token(visit_id, SECRET).unwrap();
        assert_eq!(verify_pass_token(&token, SECRET).unwrap(), visit_id);
    }

    #[test]
    fn token_shape() {
        let visit_id = Uuid::new_v4();
        let token = generate_pass_token(visit_id, SECRET).unwrap();
        let parts: Vec<&str> = token.split(':').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], PASS_TAG);
        assert_eq!(parts[1], visit_id.to_string());
        assert_eq!(parts[2].len(), 12);
        assert!(parts[2].chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn any_mutated_mac_character_fails() {
        let token = generate_pass_token(Uuid::new_v4(), SECRET).unwrap();
        let mac_start = token.rfind(':').unwrap() + 1;
        for i in mac_start..token.len() {
            let mut bytes = token.clone().into_bytes();
            bytes[i] = if bytes[i] == b'0' { b'1' } else { b'0' };
            let mutated = String::from_utf8(bytes).unwrap();
            assert!(
                verify_pass_token(&mutated, SECRET).is_err(),
                "mutation at {i} accepted"
            );
        }
    }

    #[test]
    fn wrong_secret_fails() {
        let token = generate_pass_token(Uuid::new_v4(), SECRET).unwrap();
        assert!(verify_pass_token(&token, "other-secret").is_err());
    }

    #[test]
    fn wrong_tag_fails() {
        let visit_id = Uuid::new_v4();
        let token = generate_pass_token(visit_id, SECRET).unwrap();
        let retagged = format!("xx{}", &token[2..]);
        assert!(verify_pass_token(&retagged, SECRET).is_err());
    }

    #[test]
    fn wrong_part_count_fails() {
        assert!(verify_pass_token("vv:abc", SECRET).is_err());
        assert!(verify_pass_token("vv:a:b:c", SECRET).is_err());
        assert!(verify_pass_token("", SECRET).is_err());
    }

    #[test]
    fn non_uuid_subject_fails() {
        assert!(verify_pass_token("vv:not-a-uuid:abcdefabcdef", SECRET).is_err());
    }

    #[test]
    fn scan_url_shape() {
        let visit_id = Uuid::new_v4();
        let token = generate_pass_token(visit_id, SECRET).unwrap();
        let url = scan_url("https://app.example.com/", &token);
        assert_eq!(url, format!("https://app.example.com/scan/{token}"));
    }
}
