//! JWT authentication: configuration, validation, key resolution and issuance.

pub mod algorithm;
pub mod authenticator;
pub mod clock;
pub mod configuration;
pub mod error;
pub mod extractor;
pub mod factory;
pub mod issuer;
pub mod key;
pub mod token;
pub mod user_access;
pub mod validation;

pub use algorithm::{AlgorithmFamily, AlgorithmPolicy, HashSize, SigningAlgorithm};
pub use authenticator::{Authenticated, Authenticator, KeyResolver, ResolvedKey};
pub use clock::{Clock, FrozenClock, SystemClock};
pub use configuration::{
    ConfigurationError, Constraint, TokenConfiguration, TokenConfigurationBuilder,
};
pub use error::{AuthError, ConstraintKind};
pub use extractor::{Candidate, RequestCarrier, TokenExtractor};
pub use factory::AuthFactory;
pub use issuer::{IssueError, TokenIssuer};
pub use key::{AuthItem, Key};
pub use token::{Claims, Token, TokenParseError};
pub use user_access::UserAccess;
pub use validation::ValidationEngine;
