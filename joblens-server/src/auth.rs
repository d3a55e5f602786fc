//! Token issuance and password digests
//!
//! HS256 JWTs with a 24 hour lifetime; password digests are salted SHA-256
//! (the credential store itself is an external concern, this is the minimal
//! verification the API surface needs).

use joblens_common::{Error, Result};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

const TOKEN_DURATION_SECS: i64 = 24 * 3600;
const ISSUER: &str = "joblens";

/// JWT claims stored in the token
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// User email
    pub sub: String,
    pub exp: i64,
    pub iat: i64,
    pub iss: String,
    pub jti: String,
}

/// Issues and verifies API tokens
#[derive(Clone)]
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl JwtService {
    pub fn new(secret: &str) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
        }
    }

    /// Create a token for an authenticated email
    pub fn create_token(&self, email: &str) -> Result<String> {
        let now = chrono::Utc::now();
        let claims = Claims {
            sub: email.to_string(),
            exp: (now + chrono::Duration::seconds(TOKEN_DURATION_SECS)).timestamp(),
            iat: now.timestamp(),
            iss: ISSUER.to_string(),
            jti: Uuid::new_v4().to_string(),
        };
        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| Error::Internal(format!("Cannot sign token: {}", e)))
    }

    /// Verify a token and return the authenticated email
    pub fn verify_token(&self, token: &str) -> Result<String> {
        let mut validation = Validation::default();
        validation.set_issuer(&[ISSUER]);

        decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims.sub)
            .map_err(|e| Error::Auth(format!("Invalid token: {}", e)))
    }
}

/// Hash a password with a fresh random salt; output is `salt$digest` hex
pub fn hash_password(password: &str) -> String {
    let mut salt = [0u8; 16];
    rand::thread_rng().fill_bytes(&mut salt);
    let digest = salted_digest(&salt, password);
    format!("{}${}", hex::encode(salt), hex::encode(digest))
}

/// Constant-shape verification against a stored `salt$digest` value.
///
/// A malformed stored value verifies as false rather than erroring.
pub fn verify_password(password: &str, stored: &str) -> bool {
    let Some((salt_hex, digest_hex)) = stored.split_once('$') else {
        return false;
    };
    let Ok(salt) = hex::decode(salt_hex) else {
        return false;
    };
    let Ok(expected) = hex::decode(digest_hex) else {
        return false;
    };
    salted_digest(&salt, password).as_slice() == expected.as_slice()
}

fn salted_digest(salt: &[u8], password: &str) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(salt);
    hasher.update(password.as_bytes());
    hasher.finalize().into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_roundtrip() {
        let svc = JwtService::new("test-secret");
        let token = svc.create_token("user@example.com").unwrap();
        assert_eq!(svc.verify_token(&token).unwrap(), "user@example.com");
    }

    #[test]
    fn rejects_garbage_token() {
        let svc = JwtService::new("test-secret");
        assert!(matches!(svc.verify_token("garbage"), Err(Error::Auth(_))));
    }

    #[test]
    fn rejects_token_signed_with_other_secret() {
        let issuing = JwtService::new("secret-a");
        let verifying = JwtService::new("secret-b");
        let token = issuing.create_token("user@example.com").unwrap();
        assert!(verifying.verify_token(&token).is_err());
    }

    #[test]
    fn password_verifies_against_own_hash_only() {
        let stored = hash_password("hunter2");
        assert!(verify_password("hunter2", &stored));
        assert!(!verify_password("hunter3", &stored));
    }

    #[test]
    fn same_password_hashes_differently_per_salt() {
        assert_ne!(hash_password("hunter2"), hash_password("hunter2"));
    }

    #[test]
    fn malformed_stored_hash_never_verifies() {
        assert!(!verify_password("hunter2", "not-a-valid-entry"));
        assert!(!verify_password("hunter2", "zz$zz"));
    }
}
