//! Token issuance for service-to-service calls.

use std::sync::Arc;
use std::time::Duration;

use jsonwebtoken::Header;
use serde_json::{Map, Value};

use crate::services::auth::clock::Clock;
use crate::services::auth::configuration::TokenConfiguration;
use crate::services::auth::token::Claims;

/// Claims the issuer sets itself.
pub const RESERVED_CLAIMS: [&str; 4] = ["iss", "iat", "exp", "aud"];

#[derive(Debug, thiserror::Error)]
pub enum IssueError {
    #[error("claim '{0}' is set by the issuer")]
    ReservedClaim(String),

    #[error("no signing key configured")]
    MissingSigningKey,

    #[error("signing key cannot be used: {0}")]
    InvalidSigningKey(#[source] jsonwebtoken::errors::Error),

    #[error("failed to sign token: {0}")]
    Signing(#[source] jsonwebtoken::errors::Error),
}

/// Signs short-lived tokens with the configuration's signing key.
#[derive(Clone)]
pub struct TokenIssuer {
    config: Arc<TokenConfiguration>,
    issuer: String,
    expiration_period: Duration,
    audience: Option<String>,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for TokenIssuer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenIssuer")
            .field("issuer", &self.issuer)
            .field("expiration_period", &self.expiration_period)
            .field("audience", &self.audience)
            .finish_non_exhaustive()
    }
}

impl TokenIssuer {
    pub fn new(
        config: Arc<TokenConfiguration>,
        issuer: impl Into<String>,
        expiration_period: Duration,
    ) -> Self {
        let clock = Arc::clone(config.clock());
        Self {
            config,
            issuer: issuer.into(),
            expiration_period,
            audience: None,
            clock,
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_audience(mut self, audience: impl Into<String>) -> Self {
        self.audience = Some(audience.into()).filter(|a: &String| !a.is_empty());
        self
    }

    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    pub fn expiration_period(&self) -> Duration {
        self.expiration_period
    }

    /// Sign a token carrying `iss`, `iat`, `exp`, `aud` (when configured) and
    /// then the caller's claims, in that order.
    pub fn issue(&self, claims: &Claims) -> Result<String, IssueError> {
        if let Some(name) = claims.keys().find(|k| RESERVED_CLAIMS.contains(&k.as_str())) {
            return Err(IssueError::ReservedClaim(name.clone()));
        }

        let key = self
            .config
            .signing_key()
            .ok_or(IssueError::MissingSigningKey)?;
        let algorithm = self.config.algorithm();
        let encoding_key = key
            .encoding_key(algorithm)
            .map_err(IssueError::InvalidSigningKey)?;

        let now = self.clock.now().timestamp();
        let period = i64::try_from(self.expiration_period.as_secs()).unwrap_or(i64::MAX);
        let exp = now.saturating_add(period);

        let mut payload = Map::new();
        payload.insert("iss".into(), Value::from(self.issuer.as_str()));
        payload.insert("iat".into(), Value::from(now));
        payload.insert("exp".into(), Value::from(exp));
        if let Some(aud) = &self.audience {
            payload.insert("aud".into(), Value::from(aud.as_str()));
        }
        payload.extend(claims.iter().map(|(k, v)| (k.clone(), v.clone())));

        let mut header = Header::new(algorithm.jwt_algorithm());
        header.typ = Some("JWT".to_string());
        jsonwebtoken::encode(&header, &payload, &encoding_key).map_err(IssueError::Signing)
    }

    /// `Bearer <token>`, ready for an `authorization` header value.
    pub fn header_value(&self, claims: &Claims) -> Result<String, IssueError> {
        Ok(format!("Bearer {}", self.issue(claims)?))
    }

    /// Full header line: `Authorization: Bearer <token>`.
    pub fn header(&self, claims: &Claims) -> Result<String, IssueError> {
        Ok(format!("Authorization: {}", self.header_value(claims)?))
    }
}
