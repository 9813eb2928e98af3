pub mod password;

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, decode_header, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;
use uuid::Uuid;

use crate::config::SecurityConfig;

pub use password::{PasswordError, PasswordHasher};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub user_id: Uuid,
    pub username: String,
    pub exp: i64,
    pub iat: i64,
}

impl Claims {
    pub fn new(user_id: Uuid, username: impl Into<String>, ttl: Duration) -> Self {
        let now = Utc::now();
        Self {
            user_id,
            username: username.into(),
            exp: (now + ttl).timestamp(),
            iat: now.timestamp(),
        }
    }
}

#[derive(Debug, Error)]
pub enum JwtError {
    #[error("JWT generation error: {0}")]
    TokenGeneration(String),

    #[error("Invalid JWT token: {0}")]
    InvalidToken(String),

    #[error("Unknown signing key: {0}")]
    UnknownKey(String),

    #[error("No signing keys configured")]
    NoKeys,
}

/// Token issued at login.
#[derive(Debug, Clone, Serialize)]
pub struct IssuedToken {
    pub token: String,
    pub token_type: &'static str,
    /// Seconds until expiry.
    pub expires_in: i64,
}

/// Versioned HMAC signing keys. New tokens are signed with the active key and
/// carry its id in the `kid` header; verification picks the key by `kid`, so
/// tokens signed with a retired-but-still-configured key stay valid.
#[derive(Clone)]
pub struct KeyRing {
    active_kid: String,
    encoding: EncodingKey,
    decoding: HashMap<String, DecodingKey>,
    ttl: Duration,
}

impl std::fmt::Debug for KeyRing {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut kids: Vec<&String> = self.decoding.keys().collect();
        kids.sort();
        f.debug_struct("KeyRing")
            .field("active_kid", &self.active_kid)
            .field("kids", &kids)
            .field("ttl", &self.ttl)
            .finish()
    }
}

impl KeyRing {
    pub fn new<I, K, S>(keys: I, active_kid: &str, ttl: Duration) -> Result<Self, JwtError>
    where
        I: IntoIterator<Item = (K, S)>,
        K: Into<String>,
        S: AsRef<[u8]>,
    {
        let mut decoding = HashMap::new();
        let mut encoding = None;
        for (kid, secret) in keys {
            let kid = kid.into();
            let secret = secret.as_ref();
            if secret.is_empty() {
                return Err(JwtError::NoKeys);
            }
            if kid == active_kid {
                encoding = Some(EncodingKey::from_secret(secret));
            }
            decoding.insert(kid, DecodingKey::from_secret(secret));
        }
        if decoding.is_empty() {
            return Err(JwtError::NoKeys);
        }
        let encoding = encoding.ok_or_else(|| JwtError::UnknownKey(active_kid.to_string()))?;

        Ok(Self {
            active_kid: active_kid.to_string(),
            encoding,
            decoding,
            ttl,
        })
    }

    pub fn from_config(security: &SecurityConfig) -> Result<Self, JwtError> {
        Self::new(
            security.jwt_keys.iter().map(|(kid, secret)| (kid.clone(), secret.clone())),
            &security.jwt_active_key,
            Duration::hours(security.jwt_expiry_hours as i64),
        )
    }

    pub fn active_kid(&self) -> &str {
        &self.active_kid
    }

    pub fn issue(&self, user_id: Uuid, username: &str) -> Result<IssuedToken, JwtError> {
        self.sign(&Claims::new(user_id, username, self.ttl))
            .map(|token| IssuedToken {
                token,
                token_type: "Bearer",
                expires_in: self.ttl.num_seconds(),
            })
    }

    /// Signs arbitrary claims with the active key.
    pub fn sign(&self, claims: &Claims) -> Result<String, JwtError> {
        let mut header = Header::default();
        header.kid = Some(self.active_kid.clone());
        encode(&header, claims, &self.encoding).map_err(|e| JwtError::TokenGeneration(e.to_string()))
    }

    /// Checks the signature, `exp` and token structure. Performs no I/O.
    pub fn verify(&self, token: &str) -> Result<Claims, JwtError> {
        let header = decode_header(token).map_err(|e| JwtError::InvalidToken(e.to_string()))?;
        let kid = header.kid.unwrap_or_else(|| self.active_kid.clone());
        let key = self
            .decoding
            .get(&kid)
            .ok_or_else(|| JwtError::UnknownKey(kid.clone()))?;

        decode::<Claims>(token, key, &Validation::default())
            .map(|data| data.claims)
            .map_err(|e| JwtError::InvalidToken(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ring(keys: &[(&str, &str)], active: &str) -> KeyRing {
        KeyRing::new(keys.iter().copied(), active, Duration::hours(1)).unwrap()
    }

    #[test]
    fn issued_tokens_verify() {
        let keys = ring(&[("v1", "secret-one")], "v1");
        let user_id = Uuid::new_v4();
        let issued = keys.issue(user_id, "alice").unwrap();
        assert_eq!(issued.expires_in, 3600);

        let claims = keys.verify(&issued.token).unwrap();
        assert_eq!(claims.user_id, user_id);
        assert_eq!(claims.username, "alice");
    }

    #[test]
    fn rotated_keys_keep_old_tokens_valid() {
        let old = ring(&[("v1", "secret-one")], "v1");
        let token = old.issue(Uuid::new_v4(), "alice").unwrap().token;

        let rotated = ring(&[("v1", "secret-one"), ("v2", "secret-two")], "v2");
        assert!(rotated.verify(&token).is_ok());

        let retired = ring(&[("v2", "secret-two")], "v2");
        assert!(matches!(retired.verify(&token), Err(JwtError::UnknownKey(_))));
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let signer = ring(&[("v1", "secret-one")], "v1");
        let verifier = ring(&[("v1", "another")], "v1");
        let token = signer.issue(Uuid::new_v4(), "alice").unwrap().token;
        assert!(matches!(verifier.verify(&token), Err(JwtError::InvalidToken(_))));
    }

    #[test]
    fn expired_tokens_are_rejected() {
        let keys = ring(&[("v1", "secret-one")], "v1");
        let claims = Claims::new(Uuid::new_v4(), "alice", Duration::hours(-2));
        let token = keys.sign(&claims).unwrap();
        assert!(matches!(keys.verify(&token), Err(JwtError::InvalidToken(_))));
    }

    #[test]
    fn garbage_is_rejected() {
        let keys = ring(&[("v1", "secret-one")], "v1");
        assert!(keys.verify("not.a.jwt").is_err());
        assert!(keys.verify("").is_err());
    }

    #[test]
    fn construction_requires_known_active_key() {
        let err = KeyRing::new([("v1", "a")], "v9", Duration::hours(1)).unwrap_err();
        assert!(matches!(err, JwtError::UnknownKey(_)));
        let err = KeyRing::new(Vec::<(String, String)>::new(), "v1", Duration::hours(1)).unwrap_err();
        assert!(matches!(err, JwtError::NoKeys));
    }
}
