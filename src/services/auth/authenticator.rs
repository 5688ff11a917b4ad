//! Request authentication: extract -> parse -> resolve key -> verify -> expose.
//!
//! The single-key, key-list and named-issuer middlewares differ only in how
//! they pick the verification key, so they share one `Authenticator` and a
//! `KeyResolver` strategy.

use serde_json::Value;

use crate::services::auth::error::AuthError;
use crate::services::auth::extractor::{Candidate, RequestCarrier, TokenExtractor};
use crate::services::auth::key::{AuthItem, Key};
use crate::services::auth::token::{Claims, Token};
use crate::services::auth::user_access::UserAccess;
use crate::services::auth::validation::ValidationEngine;

/// How the verification key for a token is chosen.
#[derive(Debug, Clone)]
pub enum KeyResolver {
    /// One fixed key; its specific failure reason is reported.
    Single(Key),
    /// Keys tried in declaration order; the first that verifies and validates
    /// wins. If several would, the earliest listed is authoritative.
    List(Vec<Key>),
    /// The token's `iss` selects the first item with that name; only that
    /// item's key is tried.
    Items(Vec<AuthItem>),
}

/// Which key accepted the token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedKey {
    Single,
    Listed { index: usize },
    Item { name: String },
}

#[derive(Debug, Clone)]
pub struct Authenticated {
    pub user: UserAccess,
    pub key: ResolvedKey,
}

/// Authenticates requests against one configuration and key strategy.
///
/// Built once at wiring time (the acceptance policy is fixed by the consuming
/// builder methods) and then shared; calls take `&self` and keep no state.
#[derive(Debug, Clone)]
pub struct Authenticator {
    engine: ValidationEngine,
    resolver: KeyResolver,
    extractor: TokenExtractor,
}

impl Authenticator {
    pub fn new(engine: ValidationEngine, resolver: KeyResolver) -> Self {
        Self {
            engine,
            resolver,
            extractor: TokenExtractor::default(),
        }
    }

    pub fn single(engine: ValidationEngine, key: impl Into<Key>) -> Self {
        Self::new(engine, KeyResolver::Single(key.into()))
    }

    pub fn list(engine: ValidationEngine, keys: Vec<Key>) -> Self {
        Self::new(engine, KeyResolver::List(keys))
    }

    pub fn items(engine: ValidationEngine, items: Vec<AuthItem>) -> Self {
        Self::new(engine, KeyResolver::Items(items))
    }

    pub fn accept_tokens_from_header(mut self, accept: bool) -> Self {
        self.extractor = self.extractor.accept_tokens_from_header(accept);
        self
    }

    pub fn accept_tokens_from_query_string(mut self, accept: bool) -> Self {
        self.extractor = self.extractor.accept_tokens_from_query_string(accept);
        self
    }

    pub fn engine(&self) -> &ValidationEngine {
        &self.engine
    }

    pub fn resolver(&self) -> &KeyResolver {
        &self.resolver
    }

    pub fn extractor(&self) -> &TokenExtractor {
        &self.extractor
    }

    /// Authenticated user, or the reason there is none.
    pub fn get_user_or_no_access<R: RequestCarrier + ?Sized>(
        &self,
        req: &R,
    ) -> Result<UserAccess, AuthError> {
        self.authenticate(req).map(|a| a.user)
    }

    /// Optional authentication: a request carrying no token at all yields
    /// `Ok(None)`; anything that was sent must be valid.
    pub fn get_user_access_if_exists<R: RequestCarrier + ?Sized>(
        &self,
        req: &R,
    ) -> Result<Option<UserAccess>, AuthError> {
        match self.extractor.inspect(req) {
            Candidate::Absent => Ok(None),
            candidate => self.authenticate_candidate(candidate).map(|a| Some(a.user)),
        }
    }

    /// The verified claims map, verbatim.
    pub fn get_claims_or_no_access<R: RequestCarrier + ?Sized>(
        &self,
        req: &R,
    ) -> Result<Claims, AuthError> {
        self.get_user_or_no_access(req).map(|user| user.claims().clone())
    }

    /// The named-issuer item that accepted the request's token.
    ///
    /// Only meaningful for `KeyResolver::Items`; other strategies have no item
    /// to return and fail with `IssuerNotRecognized`.
    pub fn get_auth_item<R: RequestCarrier + ?Sized>(&self, req: &R) -> Result<&AuthItem, AuthError> {
        let KeyResolver::Items(items) = &self.resolver else {
            return Err(AuthError::IssuerNotRecognized);
        };
        let token = self.token_from(self.extractor.inspect(req))?;
        self.resolve_item(items, &token)
    }

    pub fn authenticate<R: RequestCarrier + ?Sized>(
        &self,
        req: &R,
    ) -> Result<Authenticated, AuthError> {
        self.authenticate_candidate(self.extractor.inspect(req))
    }

    /// Authenticate a raw token string that was obtained some other way.
    pub fn authenticate_token(&self, raw: &str) -> Result<Authenticated, AuthError> {
        let token = self.engine.parse(raw)?;
        self.resolve(token)
    }

    fn authenticate_candidate(&self, candidate: Candidate) -> Result<Authenticated, AuthError> {
        let token = self.token_from(candidate)?;
        self.resolve(token)
    }

    fn token_from(&self, candidate: Candidate) -> Result<Token, AuthError> {
        match candidate {
            Candidate::Absent => Err(AuthError::NoToken),
            Candidate::Malformed => Err(AuthError::MalformedTokenCarrier),
            Candidate::Found(raw) => self.engine.parse(&raw),
        }
    }

    fn resolve(&self, token: Token) -> Result<Authenticated, AuthError> {
        let key = match &self.resolver {
            KeyResolver::Single(key) => {
                self.engine.verify_and_validate(&token, key)?;
                ResolvedKey::Single
            }
            KeyResolver::List(keys) => {
                let index = keys
                    .iter()
                    .position(|key| self.engine.is_verified_and_validated(&token, key))
                    .ok_or(AuthError::IssuerNotRecognized)?;
                ResolvedKey::Listed { index }
            }
            KeyResolver::Items(items) => {
                let item = self.resolve_item(items, &token)?;
                ResolvedKey::Item {
                    name: item.name().to_string(),
                }
            }
        };

        Ok(Authenticated {
            user: UserAccess::new(token.into_claims()),
            key,
        })
    }

    // First item named like the token's issuer; later duplicates are never
    // consulted, even if the first one fails.
    fn resolve_item<'a>(
        &self,
        items: &'a [AuthItem],
        token: &Token,
    ) -> Result<&'a AuthItem, AuthError> {
        let issuer = match token.claim("iss") {
            Some(Value::String(iss)) => iss.as_str(),
            _ => return Err(AuthError::MissingIssuerClaim),
        };
        let item = items
            .iter()
            .find(|item| item.name() == issuer)
            .ok_or(AuthError::IssuerNotRecognized)?;
        self.engine.verify_and_validate(token, item.key())?;
        Ok(item)
    }
}
