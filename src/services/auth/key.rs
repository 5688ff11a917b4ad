use std::fmt;

use jsonwebtoken::{DecodingKey, EncodingKey};

use crate::services::auth::algorithm::{AlgorithmFamily, SigningAlgorithm};

/// Opaque key material.
///
/// - HMAC: the shared secret bytes.
/// - RSA / ECDSA: a PEM document (public key for verification, PKCS#8 or
///   PKCS#1 private key for signing).
///
/// Key material is intentionally not printable via Debug.
#[derive(Clone, PartialEq, Eq)]
pub struct Key(Vec<u8>);

impl Key {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub(crate) fn decoding_key(
        &self,
        algorithm: SigningAlgorithm,
    ) -> Result<DecodingKey, jsonwebtoken::errors::Error> {
        match algorithm.family() {
            AlgorithmFamily::Hmac => Ok(DecodingKey::from_secret(&self.0)),
            AlgorithmFamily::Rsa => DecodingKey::from_rsa_pem(&self.0),
            AlgorithmFamily::Ecdsa => DecodingKey::from_ec_pem(&self.0),
        }
    }

    pub(crate) fn encoding_key(
        &self,
        algorithm: SigningAlgorithm,
    ) -> Result<EncodingKey, jsonwebtoken::errors::Error> {
        match algorithm.family() {
            AlgorithmFamily::Hmac => Ok(EncodingKey::from_secret(&self.0)),
            AlgorithmFamily::Rsa => EncodingKey::from_rsa_pem(&self.0),
            AlgorithmFamily::Ecdsa => EncodingKey::from_ec_pem(&self.0),
        }
    }
}

impl fmt::Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Do not print key material
        f.debug_tuple("Key").field(&"[REDACTED]").finish()
    }
}

impl From<&str> for Key {
    fn from(s: &str) -> Self {
        Self::new(s.as_bytes())
    }
}

impl From<String> for Key {
    fn from(s: String) -> Self {
        Self::new(s.into_bytes())
    }
}

impl From<&[u8]> for Key {
    fn from(b: &[u8]) -> Self {
        Self::new(b)
    }
}

impl From<Vec<u8>> for Key {
    fn from(b: Vec<u8>) -> Self {
        Self(b)
    }
}

/// A named issuer and the key its tokens are verified with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthItem {
    name: String,
    key: Key,
}

impl AuthItem {
    pub fn new(name: impl Into<String>, key: impl Into<Key>) -> Self {
        Self {
            name: name.into(),
            key: key.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn key(&self) -> &Key {
        &self.key
    }
}
