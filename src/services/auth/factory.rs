/// Factory: build issuers and authenticators sharing one algorithm choice.
use std::sync::Arc;
use std::time::Duration;

use crate::services::auth::authenticator::Authenticator;
use crate::services::auth::clock::Clock;
use crate::services::auth::configuration::TokenConfiguration;
use crate::services::auth::issuer::TokenIssuer;
use crate::services::auth::key::{AuthItem, Key};
use crate::services::auth::validation::ValidationEngine;

pub const DEFAULT_EXPIRATION_PERIOD: Duration = Duration::from_secs(60);

#[derive(Clone, Default)]
pub struct AuthFactory {
    algorithm: Option<String>,
    hash: Option<String>,
    clock: Option<Arc<dyn Clock>>,
    leeway: Duration,
}

impl std::fmt::Debug for AuthFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthFactory")
            .field("algorithm", &self.algorithm)
            .field("hash", &self.hash)
            .field("leeway", &self.leeway)
            .finish_non_exhaustive()
    }
}

impl AuthFactory {
    pub fn new(algorithm: Option<&str>, hash: Option<&str>) -> Self {
        Self {
            algorithm: algorithm.map(str::to_string),
            hash: hash.map(str::to_string),
            ..Self::default()
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn with_leeway(mut self, leeway: Duration) -> Self {
        self.leeway = leeway;
        self
    }

    /// Issuer signing with `signing_key`; `None` period means one minute.
    pub fn header_provider(
        &self,
        issuer: &str,
        signing_key: impl Into<Key>,
        expiration_period: Option<Duration>,
    ) -> TokenIssuer {
        let config = self.configuration(Some(signing_key.into()), None, None);
        TokenIssuer::new(
            config,
            issuer,
            expiration_period.unwrap_or(DEFAULT_EXPIRATION_PERIOD),
        )
    }

    pub fn auth_middleware(
        &self,
        key: impl Into<Key>,
        audience: Option<&str>,
        issuer: Option<&str>,
    ) -> Authenticator {
        Authenticator::single(self.engine(audience, issuer), key)
    }

    pub fn auth_list_middleware(
        &self,
        keys: Vec<Key>,
        audience: Option<&str>,
        issuer: Option<&str>,
    ) -> Authenticator {
        Authenticator::list(self.engine(audience, issuer), keys)
    }

    /// Each item names its own issuer, so only the audience is configured.
    pub fn auth_items_middleware(
        &self,
        items: Vec<AuthItem>,
        audience: Option<&str>,
    ) -> Authenticator {
        Authenticator::items(self.engine(audience, None), items)
    }

    fn engine(&self, audience: Option<&str>, issuer: Option<&str>) -> ValidationEngine {
        ValidationEngine::new(self.configuration(None, audience, issuer))
    }

    fn configuration(
        &self,
        signing_key: Option<Key>,
        audience: Option<&str>,
        issuer: Option<&str>,
    ) -> Arc<TokenConfiguration> {
        let config = TokenConfiguration::builder()
            .algorithm(self.algorithm.as_deref())
            .hash(self.hash.as_deref())
            .signing_key(signing_key)
            .audience(audience)
            .issuer(issuer)
            .clock(self.clock.clone())
            .leeway(self.leeway)
            .build();
        Arc::new(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::auth::algorithm::SigningAlgorithm;
    use crate::services::auth::clock::FrozenClock;
    use crate::services::auth::configuration::Constraint;
    use crate::services::auth::error::AuthError;
    use crate::services::auth::token::Claims;

    #[test]
    fn middlewares_share_the_algorithm_choice() {
        let factory = AuthFactory::new(Some("hmac"), Some("sha384"));
        let auth = factory.auth_middleware("k", Some("aud"), Some("iss"));
        let config = auth.engine().configuration();
        assert_eq!(config.algorithm(), SigningAlgorithm::HS384);
        assert_eq!(config.constraints().len(), 3);

        let items = factory.auth_items_middleware(vec![AuthItem::new("svc1", "k")], Some("aud"));
        let constraints = items.engine().configuration().constraints();
        assert_eq!(constraints.len(), 2);
        assert!(matches!(constraints[1], Constraint::Audience(ref a) if a == "aud"));
    }

    #[test]
    fn provider_tokens_are_accepted_by_matching_items() {
        let clock: Arc<dyn Clock> = Arc::new(FrozenClock::at_timestamp(1_612_582_560));
        let factory = AuthFactory::new(Some("hmac"), None).with_clock(clock);

        let svc1 = factory.header_provider("svc1", "secret-1", None);
        let svc2 = factory.header_provider("svc2", "secret-2", Some(Duration::from_secs(5)));
        assert_eq!(svc1.expiration_period(), DEFAULT_EXPIRATION_PERIOD);

        let auth = factory.auth_items_middleware(
            vec![
                AuthItem::new("svc1", "secret-1"),
                AuthItem::new("svc2", "secret-2"),
            ],
            None,
        );

        let token = svc2.issue(&Claims::new()).unwrap();
        assert!(auth.authenticate_token(&token).is_ok());

        // svc1's key cannot vouch for svc2.
        let spoofed = factory.header_provider("svc2", "secret-1", None);
        let token = spoofed.issue(&Claims::new()).unwrap();
        assert_eq!(
            auth.authenticate_token(&token).unwrap_err(),
            AuthError::SignatureMismatch
        );

        let token = svc1.issue(&Claims::new()).unwrap();
        assert!(auth.authenticate_token(&token).is_ok());
    }
}
