//! Signing algorithm selection.
//!
//! Selection is a two-level lookup (family -> hash size). The default policy is
//! lenient: unknown or missing names fall back to RSA / SHA-256 instead of
//! failing. `AlgorithmPolicy::Strict` turns those fallbacks into errors.

use jsonwebtoken::Algorithm;

use crate::services::auth::configuration::ConfigurationError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AlgorithmPolicy {
    #[default]
    Lenient,
    Strict,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlgorithmFamily {
    Hmac,
    Rsa,
    Ecdsa,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HashSize {
    Sha256,
    Sha384,
    Sha512,
}

/// Algorithms this crate can sign and verify with.
///
/// ECDSA with SHA-512 has no `jsonwebtoken` counterpart and is therefore not
/// representable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SigningAlgorithm {
    HS256,
    HS384,
    HS512,
    #[default]
    RS256,
    RS384,
    RS512,
    ES256,
    ES384,
}

impl SigningAlgorithm {
    /// Select an algorithm from optional family and hash names.
    ///
    /// Lenient mode never fails: an unknown family means RSA, an unknown hash
    /// (or one the family does not support) means SHA-256.
    pub fn select(
        family: Option<&str>,
        hash: Option<&str>,
        policy: AlgorithmPolicy,
    ) -> Result<Self, ConfigurationError> {
        let strict = policy == AlgorithmPolicy::Strict;
        let unsupported = || ConfigurationError::UnsupportedAlgorithm {
            algorithm: family.unwrap_or_default().to_string(),
            hash: hash.unwrap_or_default().to_string(),
        };

        let family = match family.map(str::to_ascii_lowercase).as_deref() {
            None => AlgorithmFamily::Rsa,
            Some("hmac") => AlgorithmFamily::Hmac,
            Some("rsa") => AlgorithmFamily::Rsa,
            Some("ecdsa") => AlgorithmFamily::Ecdsa,
            Some(_) if strict => return Err(unsupported()),
            Some(_) => AlgorithmFamily::Rsa,
        };

        let hash_size = match hash.map(str::to_ascii_lowercase).as_deref() {
            None => HashSize::Sha256,
            Some("sha256") => HashSize::Sha256,
            Some("sha384") => HashSize::Sha384,
            Some("sha512") => HashSize::Sha512,
            Some(_) if strict => return Err(unsupported()),
            Some(_) => HashSize::Sha256,
        };

        match Self::from_parts(family, hash_size) {
            Some(alg) => Ok(alg),
            None if strict => Err(unsupported()),
            None => Ok(Self::from_parts(family, HashSize::Sha256).unwrap_or_default()),
        }
    }

    pub fn from_parts(family: AlgorithmFamily, hash: HashSize) -> Option<Self> {
        let alg = match (family, hash) {
            (AlgorithmFamily::Hmac, HashSize::Sha256) => Self::HS256,
            (AlgorithmFamily::Hmac, HashSize::Sha384) => Self::HS384,
            (AlgorithmFamily::Hmac, HashSize::Sha512) => Self::HS512,
            (AlgorithmFamily::Rsa, HashSize::Sha256) => Self::RS256,
            (AlgorithmFamily::Rsa, HashSize::Sha384) => Self::RS384,
            (AlgorithmFamily::Rsa, HashSize::Sha512) => Self::RS512,
            (AlgorithmFamily::Ecdsa, HashSize::Sha256) => Self::ES256,
            (AlgorithmFamily::Ecdsa, HashSize::Sha384) => Self::ES384,
            (AlgorithmFamily::Ecdsa, HashSize::Sha512) => return None,
        };
        Some(alg)
    }

    pub fn family(self) -> AlgorithmFamily {
        match self {
            Self::HS256 | Self::HS384 | Self::HS512 => AlgorithmFamily::Hmac,
            Self::RS256 | Self::RS384 | Self::RS512 => AlgorithmFamily::Rsa,
            Self::ES256 | Self::ES384 => AlgorithmFamily::Ecdsa,
        }
    }

    /// The JOSE `alg` header value.
    pub fn name(self) -> &'static str {
        match self {
            Self::HS256 => "HS256",
            Self::HS384 => "HS384",
            Self::HS512 => "HS512",
            Self::RS256 => "RS256",
            Self::RS384 => "RS384",
            Self::RS512 => "RS512",
            Self::ES256 => "ES256",
            Self::ES384 => "ES384",
        }
    }

    pub(crate) fn jwt_algorithm(self) -> Algorithm {
        match self {
            Self::HS256 => Algorithm::HS256,
            Self::HS384 => Algorithm::HS384,
            Self::HS512 => Algorithm::HS512,
            Self::RS256 => Algorithm::RS256,
            Self::RS384 => Algorithm::RS384,
            Self::RS512 => Algorithm::RS512,
            Self::ES256 => Algorithm::ES256,
            Self::ES384 => Algorithm::ES384,
        }
    }
}
