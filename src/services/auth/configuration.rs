use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::services::auth::algorithm::{AlgorithmPolicy, SigningAlgorithm};
use crate::services::auth::clock::{Clock, SystemClock};
use crate::services::auth::key::Key;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigurationError {
    #[error("unsupported signing algorithm: algorithm={algorithm:?} hash={hash:?}")]
    UnsupportedAlgorithm { algorithm: String, hash: String },
}

/// A check a token must pass in addition to its signature.
#[derive(Clone)]
pub enum Constraint {
    /// `iat`/`nbf` must not lie in the future and `exp` must not lie in the
    /// past, both measured by `clock` and widened by `leeway`.
    TimeValidity {
        clock: Arc<dyn Clock>,
        leeway: Duration,
    },
    /// `aud` must contain this value.
    Audience(String),
    /// `iss` must equal this value.
    Issuer(String),
}

impl fmt::Debug for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TimeValidity { leeway, .. } => f
                .debug_struct("TimeValidity")
                .field("leeway", leeway)
                .finish_non_exhaustive(),
            Self::Audience(aud) => f.debug_tuple("Audience").field(aud).finish(),
            Self::Issuer(iss) => f.debug_tuple("Issuer").field(iss).finish(),
        }
    }
}

/// Algorithm, signing key and validation constraints for one signer setup.
///
/// Built once at wiring time and shared read-only (`Arc`) by validators and
/// issuers. Verification keys are not part of it; they are supplied per call
/// so one configuration can serve single-key, key-list and named-issuer
/// resolution alike.
#[derive(Clone)]
pub struct TokenConfiguration {
    algorithm: SigningAlgorithm,
    signing_key: Option<Key>,
    clock: Arc<dyn Clock>,
    constraints: Vec<Constraint>,
}

impl fmt::Debug for TokenConfiguration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenConfiguration")
            .field("algorithm", &self.algorithm)
            .field("has_signing_key", &self.signing_key.is_some())
            .field("constraints", &self.constraints)
            .finish()
    }
}

impl TokenConfiguration {
    pub fn builder() -> TokenConfigurationBuilder {
        TokenConfigurationBuilder::default()
    }

    pub fn algorithm(&self) -> SigningAlgorithm {
        self.algorithm
    }

    pub fn signing_key(&self) -> Option<&Key> {
        self.signing_key.as_ref()
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }
}

/// Builder mirroring the nullable setup parameters: every input is optional.
#[derive(Default)]
pub struct TokenConfigurationBuilder {
    algorithm: Option<String>,
    hash: Option<String>,
    signing_key: Option<Key>,
    audience: Option<String>,
    issuer: Option<String>,
    clock: Option<Arc<dyn Clock>>,
    leeway: Duration,
}

impl TokenConfigurationBuilder {
    /// Algorithm family name: `hmac`, `rsa` or `ecdsa`.
    pub fn algorithm(mut self, algorithm: Option<&str>) -> Self {
        self.algorithm = algorithm.map(str::to_string);
        self
    }

    /// Hash size name: `sha256`, `sha384` or `sha512`.
    pub fn hash(mut self, hash: Option<&str>) -> Self {
        self.hash = hash.map(str::to_string);
        self
    }

    /// Only needed when the configuration will issue tokens. An empty key is
    /// treated as absent.
    pub fn signing_key(mut self, key: Option<Key>) -> Self {
        self.signing_key = key.filter(|k| !k.is_empty());
        self
    }

    pub fn audience(mut self, audience: Option<&str>) -> Self {
        self.audience = audience.map(str::to_string);
        self
    }

    pub fn issuer(mut self, issuer: Option<&str>) -> Self {
        self.issuer = issuer.map(str::to_string);
        self
    }

    pub fn clock(mut self, clock: Option<Arc<dyn Clock>>) -> Self {
        self.clock = clock;
        self
    }

    pub fn leeway(mut self, leeway: Duration) -> Self {
        self.leeway = leeway;
        self
    }

    /// Lenient build: unknown algorithm or hash names fall back to the
    /// defaults, so this never fails.
    pub fn build(self) -> TokenConfiguration {
        let algorithm = SigningAlgorithm::select(
            self.algorithm.as_deref(),
            self.hash.as_deref(),
            AlgorithmPolicy::Lenient,
        )
        .unwrap_or_default();
        self.build_with(algorithm)
    }

    /// Strict build: unknown names and unsupported combinations are errors.
    pub fn build_strict(self) -> Result<TokenConfiguration, ConfigurationError> {
        let algorithm = SigningAlgorithm::select(
            self.algorithm.as_deref(),
            self.hash.as_deref(),
            AlgorithmPolicy::Strict,
        )?;
        Ok(self.build_with(algorithm))
    }

    fn build_with(self, algorithm: SigningAlgorithm) -> TokenConfiguration {
        let clock: Arc<dyn Clock> = self.clock.unwrap_or_else(|| Arc::new(SystemClock));

        // Time validity is always checked; audience/issuer only when configured.
        let mut constraints = vec![Constraint::TimeValidity {
            clock: Arc::clone(&clock),
            leeway: self.leeway,
        }];
        if let Some(audience) = self.audience.filter(|a| !a.is_empty()) {
            constraints.push(Constraint::Audience(audience));
        }
        if let Some(issuer) = self.issuer.filter(|i| !i.is_empty()) {
            constraints.push(Constraint::Issuer(issuer));
        }

        TokenConfiguration {
            algorithm,
            signing_key: self.signing_key,
            clock,
            constraints,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn has_audience(config: &TokenConfiguration) -> bool {
        config
            .constraints()
            .iter()
            .any(|c| matches!(c, Constraint::Audience(_)))
    }

    fn has_issuer(config: &TokenConfiguration) -> bool {
        config
            .constraints()
            .iter()
            .any(|c| matches!(c, Constraint::Issuer(_)))
    }

    #[test]
    fn time_validity_is_always_first() {
        let config = TokenConfiguration::builder().build();
        assert_eq!(config.constraints().len(), 1);
        assert!(matches!(
            config.constraints()[0],
            Constraint::TimeValidity { .. }
        ));
        assert_eq!(config.algorithm(), SigningAlgorithm::RS256);
    }

    #[test]
    fn audience_and_issuer_only_when_non_empty() {
        let cases = [
            (Some("audience1"), Some("issuer1"), true, true),
            (None, Some("issuer2"), false, true),
            (Some("audience2"), None, true, false),
            (Some(""), Some(""), false, false),
            (None, None, false, false),
        ];
        for (audience, issuer, expect_aud, expect_iss) in cases {
            let config = TokenConfiguration::builder()
                .algorithm(Some("hmac"))
                .audience(audience)
                .issuer(issuer)
                .build();
            assert_eq!(has_audience(&config), expect_aud, "{audience:?}");
            assert_eq!(has_issuer(&config), expect_iss, "{issuer:?}");
        }
    }

    #[test]
    fn audience_precedes_issuer() {
        let config = TokenConfiguration::builder()
            .audience(Some("a"))
            .issuer(Some("i"))
            .build();
        assert!(matches!(config.constraints()[1], Constraint::Audience(_)));
        assert!(matches!(config.constraints()[2], Constraint::Issuer(_)));
    }

    #[test]
    fn empty_signing_key_is_absent() {
        let config = TokenConfiguration::builder()
            .signing_key(Some(Key::from("")))
            .build();
        assert!(config.signing_key().is_none());

        let config = TokenConfiguration::builder()
            .signing_key(Some(Key::from("secret")))
            .build();
        assert!(config.signing_key().is_some());
    }

    #[test]
    fn strict_build_reports_unsupported_combination() {
        let err = TokenConfiguration::builder()
            .algorithm(Some("ecdsa"))
            .hash(Some("sha512"))
            .build_strict()
            .unwrap_err();
        assert_eq!(
            err,
            ConfigurationError::UnsupportedAlgorithm {
                algorithm: "ecdsa".into(),
                hash: "sha512".into(),
            }
        );
    }

    #[test]
    fn debug_hides_signing_key() {
        let config = TokenConfiguration::builder()
            .signing_key(Some(Key::from("hunter2")))
            .build();
        let printed = format!("{config:?}");
        assert!(printed.contains("has_signing_key: true"));
        assert!(!printed.contains("hunter2"));
    }
}
