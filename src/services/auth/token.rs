//! Compact JWS parsing.
//!
//! A `Token` is decoded once and then verified against as many keys as the
//! resolution strategy needs. Nothing here checks signatures; see
//! `validation`.

use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde_json::{Map, Value};

pub type Claims = Map<String, Value>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum TokenParseError {
    #[error("token must have exactly three segments")]
    SegmentCount,
    #[error("token segment is not valid base64url")]
    Encoding,
    #[error("token segment is not a JSON object")]
    Json,
    #[error("token header has no alg")]
    MissingAlg,
    #[error("registered claim '{0}' has an invalid type")]
    InvalidClaim(&'static str),
}

/// Parsed, immutable token.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    header: Map<String, Value>,
    claims: Claims,
    signature: Vec<u8>,
    // `<header>.<claims>` exactly as received; the signature covers these bytes.
    signing_input: String,
    encoded_signature: String,
}

impl Token {
    pub fn parse(raw: &str) -> Result<Self, TokenParseError> {
        let mut parts = raw.split('.');
        let (Some(header_b64), Some(claims_b64), Some(signature_b64), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(TokenParseError::SegmentCount);
        };

        let header = decode_object(header_b64)?;
        let claims = decode_object(claims_b64)?;
        let signature = URL_SAFE_NO_PAD
            .decode(signature_b64)
            .map_err(|_| TokenParseError::Encoding)?;

        if !matches!(header.get("alg"), Some(Value::String(_))) {
            return Err(TokenParseError::MissingAlg);
        }
        check_registered_claims(&claims)?;

        Ok(Self {
            header,
            claims,
            signature,
            signing_input: format!("{header_b64}.{claims_b64}"),
            encoded_signature: signature_b64.to_string(),
        })
    }

    pub fn header(&self) -> &Map<String, Value> {
        &self.header
    }

    /// The `alg` header value.
    pub fn algorithm(&self) -> Option<&str> {
        self.header.get("alg").and_then(Value::as_str)
    }

    pub fn claims(&self) -> &Claims {
        &self.claims
    }

    pub fn claim(&self, name: &str) -> Option<&Value> {
        self.claims.get(name)
    }

    pub fn signature(&self) -> &[u8] {
        &self.signature
    }

    pub fn is_signed(&self) -> bool {
        !self.signature.is_empty()
    }

    pub(crate) fn signing_input(&self) -> &str {
        &self.signing_input
    }

    pub(crate) fn encoded_signature(&self) -> &str {
        &self.encoded_signature
    }

    pub fn into_claims(self) -> Claims {
        self.claims
    }
}

fn decode_object(segment: &str) -> Result<Map<String, Value>, TokenParseError> {
    let bytes = URL_SAFE_NO_PAD
        .decode(segment)
        .map_err(|_| TokenParseError::Encoding)?;
    match serde_json::from_slice::<Value>(&bytes) {
        Ok(Value::Object(map)) => Ok(map),
        _ => Err(TokenParseError::Json),
    }
}

// Registered claims are typed by RFC 7519; anything else is a structural error.
fn check_registered_claims(claims: &Claims) -> Result<(), TokenParseError> {
    for name in ["exp", "nbf", "iat"] {
        if let Some(value) = claims.get(name) {
            if !value.is_number() {
                return Err(TokenParseError::InvalidClaim(name));
            }
        }
    }
    match claims.get("aud") {
        None | Some(Value::String(_)) => {}
        Some(Value::Array(items)) if items.iter().all(Value::is_string) => {}
        Some(_) => return Err(TokenParseError::InvalidClaim("aud")),
    }
    match claims.get("iss") {
        None | Some(Value::String(_)) => Ok(()),
        Some(_) => Err(TokenParseError::InvalidClaim("iss")),
    }
}
