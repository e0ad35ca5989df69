//! Session tokens for the platform's `isuports_session` cookie.

use anyhow::{Context, Result};
use chrono::{Duration, Utc};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};

use rankcheck_core::Role;

pub const SESSION_COOKIE: &str = "isuports_session";
pub const TOKEN_ISSUER: &str = "isuports";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionClaims {
    pub iss: String,
    pub sub: String,
    /// Tenant the session is valid for (`admin` for admin sessions).
    pub aud: Vec<String>,
    pub role: String,
    pub exp: i64,
}

/// Signs role-scoped session tokens with one key.
pub struct TokenMinter {
    key: EncodingKey,
    header: Header,
    ttl: Duration,
}

impl TokenMinter {
    /// RS256 with the platform's private key.
    pub fn from_rsa_pem(pem: &[u8]) -> Result<Self> {
        let key = EncodingKey::from_rsa_pem(pem).context("invalid RSA private key")?;
        Ok(Self {
            key,
            header: Header::new(Algorithm::RS256),
            ttl: Duration::hours(1),
        })
    }

    /// HS256 with a shared secret, for platforms configured that way.
    pub fn from_secret(secret: &[u8]) -> Self {
        Self {
            key: EncodingKey::from_secret(secret),
            header: Header::new(Algorithm::HS256),
            ttl: Duration::hours(1),
        }
    }

    pub fn claims(&self, role: Role, tenant: &str, identity: &str) -> SessionClaims {
        SessionClaims {
            iss: TOKEN_ISSUER.to_string(),
            sub: identity.to_string(),
            aud: vec![tenant.to_string()],
            role: role.as_str().to_string(),
            exp: (Utc::now() + self.ttl).timestamp(),
        }
    }

    pub fn mint(&self, role: Role, tenant: &str, identity: &str) -> Result<String> {
        let claims = self.claims(role, tenant, identity);
        encode(&self.header, &claims, &self.key)
            .with_context(|| format!("signing {role} token for {identity}@{tenant}"))
    }
}
