use std::collections::HashSet;
use std::sync::{Arc, OnceLock};

use chrono::{DateTime, Utc};
use serde_json::Value;
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::services::auth::error::AuthError;
use crate::services::auth::token::Claims;

/// Read-only view over the claims of a verified token.
///
/// Every accessor decodes its claim on first use and memoizes the outcome,
/// including "absent or wrong type" (`Some(None)` in the cell), so a claim is
/// decoded at most once. Malformed claims yield `None`; they never panic.
///
/// Cheap to clone: the claims and the memo cells are shared.
#[derive(Debug, Clone)]
pub struct UserAccess {
    inner: Arc<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    claims: Claims,
    uuid: OnceLock<Option<Uuid>>,
    email: OnceLock<Option<String>>,
    capabilities: OnceLock<Vec<String>>,
    issued_at: OnceLock<Option<DateTime<Utc>>>,
    expires_at: OnceLock<Option<DateTime<Utc>>>,
    issuer: OnceLock<Option<String>>,
    audience: OnceLock<Option<Vec<String>>>,
}

impl UserAccess {
    pub fn new(claims: Claims) -> Self {
        Self {
            inner: Arc::new(Inner {
                claims,
                ..Inner::default()
            }),
        }
    }

    pub fn uuid(&self) -> Option<Uuid> {
        *self.inner.uuid.get_or_init(|| {
            self.string_claim("uuid")
                .and_then(|s| Uuid::parse_str(s).ok())
        })
    }

    pub fn email(&self) -> Option<&str> {
        self.inner
            .email
            .get_or_init(|| self.string_claim("email").map(str::to_string))
            .as_deref()
    }

    /// Hex SHA-256 of the email, usable as a stable opaque user key.
    pub fn email_hash(&self) -> Option<String> {
        self.email()
            .map(|email| format!("{:x}", Sha256::digest(email.as_bytes())))
    }

    /// Declared capabilities; empty when the claim is missing or not an array.
    /// Non-string entries are skipped.
    pub fn capabilities(&self) -> &[String] {
        self.inner.capabilities.get_or_init(|| match self.claim("capabilities") {
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(|v| v.as_str().map(str::to_string))
                .collect(),
            _ => Vec::new(),
        })
    }

    pub fn issued_at(&self) -> Option<DateTime<Utc>> {
        *self
            .inner
            .issued_at
            .get_or_init(|| self.timestamp_claim("iat"))
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        *self
            .inner
            .expires_at
            .get_or_init(|| self.timestamp_claim("exp"))
    }

    pub fn issuer(&self) -> Option<&str> {
        self.inner
            .issuer
            .get_or_init(|| self.string_claim("iss").map(str::to_string))
            .as_deref()
    }

    /// `aud` normalized to a list; a single string becomes a one-element list.
    pub fn audience(&self) -> Option<&[String]> {
        self.inner
            .audience
            .get_or_init(|| match self.claim("aud") {
                Some(Value::String(aud)) => Some(vec![aud.clone()]),
                Some(Value::Array(items)) => Some(
                    items
                        .iter()
                        .filter_map(|v| v.as_str().map(str::to_string))
                        .collect(),
                ),
                _ => None,
            })
            .as_deref()
    }

    /// All claims, verbatim.
    pub fn claims(&self) -> &Claims {
        &self.inner.claims
    }

    pub fn claim(&self, name: &str) -> Option<&Value> {
        self.inner.claims.get(name)
    }

    pub fn claim_or<'a>(&'a self, name: &str, default: &'a Value) -> &'a Value {
        self.claim(name).unwrap_or(default)
    }

    /// True iff every required capability is held. Order and duplicates do not
    /// matter; an empty requirement is always satisfied.
    pub fn has_capabilities(&self, required: &[&str]) -> bool {
        self.missing_capabilities(required).is_empty()
    }

    /// `has_capabilities` as a guard. Returns `self` for chaining.
    pub fn check_capabilities_or_no_access(&self, required: &[&str]) -> Result<&Self, AuthError> {
        let missing = self.missing_capabilities(required);
        if missing.is_empty() {
            Ok(self)
        } else {
            Err(AuthError::InsufficientCapabilities { missing })
        }
    }

    // Missing names in request order, without duplicates.
    fn missing_capabilities(&self, required: &[&str]) -> Vec<String> {
        let held: HashSet<&str> = self.capabilities().iter().map(String::as_str).collect();
        let mut seen = HashSet::new();
        required
            .iter()
            .filter(|r| !held.contains(**r) && seen.insert(**r))
            .map(|r| r.to_string())
            .collect()
    }

    fn string_claim(&self, name: &str) -> Option<&str> {
        self.claim(name).and_then(Value::as_str)
    }

    // Only positive integers become timestamps.
    fn timestamp_claim(&self, name: &str) -> Option<DateTime<Utc>> {
        self.claim(name)
            .and_then(Value::as_i64)
            .filter(|ts| *ts > 0)
            .and_then(|ts| DateTime::from_timestamp(ts, 0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn access(claims: Value) -> UserAccess {
        match claims {
            Value::Object(map) => UserAccess::new(map),
            _ => panic!("claims must be an object"),
        }
    }

    #[test]
    fn having_capabilities() {
        let cases: [(&[&str], &[&str], bool); 7] = [
            (&[], &[], true),
            (&["a", "b", "c"], &[], true),
            (&["a"], &["a"], true),
            (&["a", "b", "c"], &["a", "c"], true),
            (&[], &["a", "b"], false),
            (&["a", "b", "c"], &["b", "d"], false),
            (&["a", "b"], &["c", "d"], false),
        ];
        for (held, required, expected) in cases {
            let user = access(json!({ "capabilities": held }));
            assert_eq!(user.has_capabilities(required), expected, "{held:?} {required:?}");
            assert_eq!(
                user.check_capabilities_or_no_access(required).is_ok(),
                expected
            );
        }
    }

    #[test]
    fn missing_capabilities_claim_only_satisfies_empty_requirement() {
        let user = access(json!({}));
        assert!(user.has_capabilities(&[]));
        assert!(!user.has_capabilities(&["a"]));
        assert!(user.capabilities().is_empty());
    }

    #[test]
    fn capability_check_names_missing_requirements() {
        let user = access(json!({ "capabilities": ["a", "b", "c"] }));
        let err = user
            .check_capabilities_or_no_access(&["d", "b", "e", "d"])
            .unwrap_err();
        assert_eq!(
            err,
            AuthError::InsufficientCapabilities {
                missing: vec!["d".into(), "e".into()]
            }
        );
        assert_eq!(err.to_string(), "User doesn't have required capabilities: d, e.");

        // Chaining on success.
        let chained = user
            .check_capabilities_or_no_access(&["a"])
            .and_then(|u| u.check_capabilities_or_no_access(&["c", "b"]));
        assert!(chained.is_ok());
    }

    #[test]
    fn decodes_well_typed_claims() {
        let user = access(json!({
            "uuid": "67e55044-10b1-426f-9247-bb680e5fe0c8",
            "email": "user@example.com",
            "capabilities": ["read", 3, "write"],
            "iat": 1_612_582_560,
            "exp": 1_612_586_160,
            "iss": "issuer1",
            "aud": "audience1",
        }));
        assert_eq!(
            user.uuid(),
            Some(Uuid::parse_str("67e55044-10b1-426f-9247-bb680e5fe0c8").unwrap())
        );
        assert_eq!(user.email(), Some("user@example.com"));
        assert_eq!(user.capabilities(), ["read".to_string(), "write".to_string()]);
        assert_eq!(user.issued_at().map(|t| t.timestamp()), Some(1_612_582_560));
        assert_eq!(user.expires_at().map(|t| t.timestamp()), Some(1_612_586_160));
        assert_eq!(user.issuer(), Some("issuer1"));
        assert_eq!(user.audience(), Some(&["audience1".to_string()][..]));
        assert_eq!(user.email_hash().map(|h| h.len()), Some(64));
    }

    #[test]
    fn wrong_types_decode_to_none() {
        let user = access(json!({
            "uuid": "not-a-uuid",
            "email": 42,
            "capabilities": "admin",
            "iat": 0,
            "exp": -5,
            "iss": ["x"],
            "aud": {"a": 1},
        }));
        assert_eq!(user.uuid(), None);
        assert_eq!(user.email(), None);
        assert!(user.capabilities().is_empty());
        assert_eq!(user.issued_at(), None);
        assert_eq!(user.expires_at(), None);
        assert_eq!(user.issuer(), None);
        assert_eq!(user.audience(), None);
        assert_eq!(user.email_hash(), None);
    }

    #[test]
    fn fractional_timestamps_are_not_materialized() {
        let user = access(json!({ "iat": 1_612_582_560.5 }));
        assert_eq!(user.issued_at(), None);
    }

    #[test]
    fn accessors_memoize_including_absent_values() {
        let user = access(json!({ "email": 1 }));
        assert!(user.inner.email.get().is_none());
        assert_eq!(user.email(), None);
        assert_eq!(user.inner.email.get(), Some(&None));

        let clone = user.clone();
        assert_eq!(clone.inner.email.get(), Some(&None));
    }

    #[test]
    fn raw_claims_are_exposed() {
        let user = access(json!({ "custom": {"nested": true} }));
        assert_eq!(user.claim("custom"), Some(&json!({"nested": true})));
        let fallback = json!("default");
        assert_eq!(user.claim_or("missing", &fallback), &fallback);
        assert_eq!(user.claims().len(), 1);
    }
}
