//! Signature verification followed by ordered constraint checks.

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;

use crate::services::auth::clock::Clock;
use crate::services::auth::configuration::{Constraint, TokenConfiguration};
use crate::services::auth::error::{AuthError, ConstraintKind};
use crate::services::auth::key::Key;
use crate::services::auth::token::Token;

/// Verifies and validates tokens against one shared configuration.
///
/// Stateless per call and `Send + Sync`; clone it freely (it only holds an
/// `Arc`). It performs no I/O and does not log: callers decide what a
/// failure means for them.
#[derive(Debug, Clone)]
pub struct ValidationEngine {
    config: Arc<TokenConfiguration>,
}

impl ValidationEngine {
    pub fn new(config: Arc<TokenConfiguration>) -> Self {
        Self { config }
    }

    pub fn configuration(&self) -> &TokenConfiguration {
        &self.config
    }

    /// Parse a raw token string. Empty input is `NoToken`; anything the codec
    /// rejects is `ParseFailure`.
    pub fn parse(&self, raw: &str) -> Result<Token, AuthError> {
        if raw.is_empty() {
            return Err(AuthError::NoToken);
        }
        Token::parse(raw).map_err(|_| AuthError::ParseFailure)
    }

    /// Signature first, then every constraint in declaration order.
    ///
    /// The first failing constraint is reported. An unsigned token, a token
    /// whose `alg` header does not name the configured algorithm, and key
    /// material that cannot be loaded for the algorithm are all reported as
    /// `SignatureMismatch`.
    pub fn verify_and_validate(&self, token: &Token, key: &Key) -> Result<(), AuthError> {
        self.verify_signature(token, key)?;
        for constraint in self.config.constraints() {
            check_constraint(constraint, token).map_err(AuthError::ConstraintViolation)?;
        }
        Ok(())
    }

    /// `verify_and_validate` with the reason discarded.
    pub fn is_verified_and_validated(&self, token: &Token, key: &Key) -> bool {
        self.verify_and_validate(token, key).is_ok()
    }

    fn verify_signature(&self, token: &Token, key: &Key) -> Result<(), AuthError> {
        let algorithm = self.config.algorithm();

        if !token.is_signed() {
            return Err(AuthError::SignatureMismatch);
        }
        if token.algorithm() != Some(algorithm.name()) {
            return Err(AuthError::SignatureMismatch);
        }

        let decoding_key = key
            .decoding_key(algorithm)
            .map_err(|_| AuthError::SignatureMismatch)?;

        match jsonwebtoken::crypto::verify(
            token.encoded_signature(),
            token.signing_input().as_bytes(),
            &decoding_key,
            algorithm.jwt_algorithm(),
        ) {
            Ok(true) => Ok(()),
            Ok(false) | Err(_) => Err(AuthError::SignatureMismatch),
        }
    }
}

fn check_constraint(constraint: &Constraint, token: &Token) -> Result<(), ConstraintKind> {
    match constraint {
        Constraint::TimeValidity { clock, leeway } => check_time(clock.as_ref(), *leeway, token),
        Constraint::Audience(expected) => {
            let permitted = match token.claim("aud") {
                Some(Value::String(aud)) => aud == expected,
                Some(Value::Array(auds)) => auds.iter().any(|a| a.as_str() == Some(expected)),
                _ => false,
            };
            if permitted {
                Ok(())
            } else {
                Err(ConstraintKind::WrongAudience)
            }
        }
        Constraint::Issuer(expected) => match token.claim("iss").and_then(Value::as_str) {
            Some(iss) if iss == expected => Ok(()),
            _ => Err(ConstraintKind::WrongIssuer),
        },
    }
}

// Valid iff iat <= now, nbf <= now and now <= exp (closed interval), each bound
// widened by `leeway`. A missing bound is unconstrained on that side.
fn check_time(clock: &dyn Clock, leeway: Duration, token: &Token) -> Result<(), ConstraintKind> {
    let now = clock.now().timestamp_millis() as f64 / 1000.0;
    let leeway = leeway.as_secs_f64();

    let bound = |name: &str| token.claim(name).and_then(Value::as_f64);

    if let Some(iat) = bound("iat") {
        if iat > now + leeway {
            return Err(ConstraintKind::NotYetValid);
        }
    }
    if let Some(nbf) = bound("nbf") {
        if nbf > now + leeway {
            return Err(ConstraintKind::NotYetValid);
        }
    }
    if let Some(exp) = bound("exp") {
        if exp < now - leeway {
            return Err(ConstraintKind::Expired);
        }
    }
    Ok(())
}
