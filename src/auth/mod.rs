use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::config::SecurityConfig;

/// Identity carried inside a bearer token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub id: String,
    pub username: String,
    pub display_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub id: String,
    pub username: String,
    pub display_name: String,
    pub exp: i64,
    pub iat: i64,
}

impl Claims {
    pub fn new(identity: &Identity, lifetime: Duration) -> Self {
        let now = Utc::now();
        Self {
            id: identity.id.clone(),
            username: identity.username.clone(),
            display_name: identity.display_name.clone(),
            exp: (now + lifetime).timestamp(),
            iat: now.timestamp(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum JwtError {
    #[error("JWT generation error: {0}")]
    TokenGeneration(String),
    #[error("Invalid JWT secret")]
    InvalidSecret,
    #[error("Invalid token lifetime '{0}'")]
    InvalidLifetime(String),
}

/// Signs and verifies bearer tokens with one shared secret and lifetime.
pub struct AuthService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    lifetime: Duration,
    expires_in: String,
}

impl AuthService {
    pub fn new(config: &SecurityConfig) -> Result<Self, JwtError> {
        if config.jwt_secret.is_empty() {
            return Err(JwtError::InvalidSecret);
        }
        let lifetime = parse_lifetime(&config.jwt_expires_in)
            .ok_or_else(|| JwtError::InvalidLifetime(config.jwt_expires_in.clone()))?;

        Ok(Self {
            encoding_key: EncodingKey::from_secret(config.jwt_secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            lifetime,
            expires_in: config.jwt_expires_in.clone(),
        })
    }

    /// Lifetime as configured, echoed back to clients on login.
    pub fn expires_in(&self) -> &str {
        &self.expires_in
    }

    pub fn issue(&self, identity: &Identity) -> Result<String, JwtError> {
        self.sign(&Claims::new(identity, self.lifetime))
    }

    pub fn sign(&self, claims: &Claims) -> Result<String, JwtError> {
        encode(&Header::default(), claims, &self.encoding_key)
            .map_err(|e| JwtError::TokenGeneration(e.to_string()))
    }

    /// Decodes a token. Expired, forged and malformed tokens all fail alike.
    pub fn verify(&self, token: &str) -> Option<Claims> {
        match decode::<Claims>(token, &self.decoding_key, &Validation::default()) {
            Ok(data) => Some(data.claims),
            Err(e) => {
                tracing::debug!("Rejected bearer token: {}", e);
                None
            }
        }
    }
}

/// Parses `365d`, `12h`, `30m`, `45s` or bare seconds.
pub fn parse_lifetime(raw: &str) -> Option<Duration> {
    let raw = raw.trim();
    let split = raw.find(|c: char| !c.is_ascii_digit()).unwrap_or(raw.len());
    let (digits, unit) = raw.split_at(split);
    let amount: i64 = digits.parse().ok()?;
    if amount <= 0 {
        return None;
    }
    match unit.trim() {
        "" | "s" => Some(Duration::seconds(amount)),
        "m" => Some(Duration::minutes(amount)),
        "h" => Some(Duration::hours(amount)),
        "d" => Some(Duration::days(amount)),
        _ => None,
    }
}
