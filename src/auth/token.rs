//! Signed, expiring session tokens (HS256 JWT).

use crate::models::UserRecord;
use crate::Result;
use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Claims {
    /// User id.
    pub sub: String,
    pub email: String,
    pub name: String,
    pub iat: i64,
    pub exp: i64,
}

pub struct TokenSigner {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl TokenSigner {
    pub fn new(secret: &str, ttl: Duration) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            ttl,
        }
    }

    pub fn issue(&self, user: &UserRecord) -> Result<String> {
        let now = Utc::now().timestamp();
        let ttl = i64::try_from(self.ttl.as_secs()).unwrap_or(i64::MAX);

        self.sign(&Claims {
            sub: user.id.clone(),
            email: user.email.clone(),
            name: user.name.clone(),
            iat: now,
            exp: now.saturating_add(ttl),
        })
    }

    fn sign(&self, claims: &Claims) -> Result<String> {
        Ok(encode(
            &Header::new(Algorithm::HS256),
            claims,
            &self.encoding_key,
        )?)
    }

    /// Validate signature and expiry, returning the claims.
    pub fn verify(&self, token: &str) -> Result<Claims> {
        Ok(decode::<Claims>(token, &self.decoding_key, &self.validation)?.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user() -> UserRecord {
        UserRecord {
            id: "user-1".to_string(),
            name: "Ana".to_string(),
            email: "ana@example.com".to_string(),
            phone: "11999999999".to_string(),
            password_hash: String::new(),
            plan: "free".to_string(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_issue_then_verify() {
        let signer = TokenSigner::new("secret", Duration::from_secs(3600));
        let token = signer.issue(&user()).unwrap();

        let claims = signer.verify(&token).unwrap();
        assert_eq!(claims.sub, "user-1");
        assert_eq!(claims.email, "ana@example.com");
        assert_eq!(claims.exp - claims.iat, 3600);
    }

    #[test]
    fn test_wrong_secret_is_rejected() {
        let token = TokenSigner::new("secret", Duration::from_secs(60))
            .issue(&user())
            .unwrap();
        let other = TokenSigner::new("other-secret", Duration::from_secs(60));
        assert!(matches!(other.verify(&token), Err(crate::Error::Token(_))));
    }

    #[test]
    fn test_expired_token_is_rejected() {
        let signer = TokenSigner::new("secret", Duration::from_secs(60));
        let now = Utc::now().timestamp();
        let token = signer
            .sign(&Claims {
                sub: "user-1".to_string(),
                email: "ana@example.com".to_string(),
                name: "Ana".to_string(),
                iat: now - 120,
                exp: now - 60,
            })
            .unwrap();

        assert!(signer.verify(&token).is_err());
    }

    #[test]
    fn test_unsigned_base64_payload_is_rejected() {
        use base64::Engine as _;
        let forged = base64::engine::general_purpose::STANDARD
            .encode(r#"{"id":"user-1","email":"ana@example.com"}"#);
        let signer = TokenSigner::new("secret", Duration::from_secs(60));
        assert!(signer.verify(&forged).is_err());
    }
}
