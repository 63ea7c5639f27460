//! Session tokens
//!
//! A session is an HS256-signed JWT stored in the `session_token` cookie. It carries
//! the verified email that becomes the storage [`Identity`].

use axum::http::HeaderMap;
use axum::http::header::COOKIE;
use chrono::Utc;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use log::debug;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::AuthError;
use crate::storage::{Identity, UserSummary};

pub const SESSION_COOKIE: &str = "session_token";

/// Claims carried by a session token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    pub email: String,
    pub name: String,
    #[serde(default)]
    pub picture: String,
    /// Expiry, seconds since the epoch
    pub exp: u64,
}

impl SessionClaims {
    pub fn identity(&self) -> Identity {
        Identity::new(self.email.clone())
    }

    pub fn summary(&self) -> UserSummary {
        UserSummary {
            email: self.email.clone(),
            name: self.name.clone(),
            picture: self.picture.clone(),
        }
    }
}

/// Signing and verification keys for session tokens
#[derive(Clone)]
pub struct SessionKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    lifetime: Duration,
}

impl SessionKeys {
    pub fn new(secret: &str, lifetime: Duration) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation: Validation::new(Algorithm::HS256),
            lifetime,
        }
    }

    pub fn lifetime(&self) -> Duration {
        self.lifetime
    }

    /// Issues a token for a verified user
    pub fn issue(&self, user: &UserSummary) -> Result<String, AuthError> {
        let claims = SessionClaims {
            email: user.email.clone(),
            name: user.name.clone(),
            picture: user.picture.clone(),
            exp: Utc::now().timestamp().max(0) as u64 + self.lifetime.as_secs(),
        };
        self.sign(&claims)
    }

    fn sign(&self, claims: &SessionClaims) -> Result<String, AuthError> {
        Ok(jsonwebtoken::encode(
            &Header::new(Algorithm::HS256),
            claims,
            &self.encoding,
        )?)
    }

    /// Checks signature and expiry
    pub fn verify(&self, token: &str) -> Result<SessionClaims, AuthError> {
        jsonwebtoken::decode::<SessionClaims>(token, &self.decoding, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| {
                debug!("Rejected session token: {}", e);
                AuthError::InvalidSession
            })
    }

    /// Authenticates a request from its `Cookie` headers
    pub fn authenticate(&self, headers: &HeaderMap) -> Result<SessionClaims, AuthError> {
        let token = session_token(headers).ok_or(AuthError::NotAuthenticated)?;
        self.verify(&token)
    }

    /// `Set-Cookie` value carrying a fresh token
    pub fn session_cookie(&self, token: &str) -> String {
        format!(
            "{SESSION_COOKIE}={token}; HttpOnly; Max-Age={}; Path=/; SameSite=Lax",
            self.lifetime.as_secs()
        )
    }
}

/// `Set-Cookie` value that removes the session
pub fn clear_session_cookie() -> String {
    format!("{SESSION_COOKIE}=; HttpOnly; Max-Age=0; Path=/; SameSite=Lax")
}

/// Extracts the session token from the request's cookies
pub fn session_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, value)| *name == SESSION_COOKIE && !value.is_empty())
        .map(|(_, value)| value.to_string())
}
