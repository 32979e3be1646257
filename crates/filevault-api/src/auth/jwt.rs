//! HS256 bearer tokens signed with the shared `JWT_SECRET`.

use crate::auth::models::JwtClaims;
use chrono::Utc;
use filevault_core::AppError;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use uuid::Uuid;

/// Verifies tokens; built once at startup.
#[derive(Clone)]
pub struct JwtVerifier {
    key: DecodingKey,
    validation: Validation,
}

impl JwtVerifier {
    pub fn new(secret: &str) -> Self {
        Self {
            key: DecodingKey::from_secret(secret.as_bytes()),
            validation: Validation::new(Algorithm::HS256),
        }
    }

    /// Returns the owner the token was issued to.
    pub fn verify(&self, token: &str) -> Result<Uuid, AppError> {
        decode::<JwtClaims>(token, &self.key, &self.validation)
            .map(|data| data.claims.sub)
            .map_err(|e| AppError::Unauthorized(format!("Invalid token: {}", e)))
    }
}

/// Issue a token for `owner_id` valid for `ttl_secs`.
pub fn issue_token(secret: &str, owner_id: Uuid, ttl_secs: i64) -> Result<String, AppError> {
    let now = Utc::now().timestamp();
    let claims = JwtClaims {
        sub: owner_id,
        iat: now,
        exp: now + ttl_secs,
    };
    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(format!("Failed to sign token: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::DEFAULT_TOKEN_TTL_SECS;

    const SECRET: &str = "test-secret-that-is-at-least-32-characters";

    #[test]
    fn issued_tokens_verify() {
        let owner = Uuid::new_v4();
        let token = issue_token(SECRET, owner, DEFAULT_TOKEN_TTL_SECS).unwrap();
        assert_eq!(JwtVerifier::new(SECRET).verify(&token).unwrap(), owner);
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let token = issue_token(SECRET, Uuid::new_v4(), DEFAULT_TOKEN_TTL_SECS).unwrap();
        let verifier = JwtVerifier::new("another-secret-that-is-at-least-32-chars");
        assert!(matches!(
            verifier.verify(&token),
            Err(AppError::Unauthorized(_))
        ));
    }

    #[test]
    fn expired_tokens_are_rejected() {
        // Past the default 60s leeway.
        let token = issue_token(SECRET, Uuid::new_v4(), -3600).unwrap();
        assert!(JwtVerifier::new(SECRET).verify(&token).is_err());
    }
}
