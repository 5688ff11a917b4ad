use std::fmt;

/// Which declarative constraint rejected a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstraintKind {
    Expired,
    NotYetValid,
    WrongAudience,
    WrongIssuer,
}

impl fmt::Display for ConstraintKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Expired => "expired",
            Self::NotYetValid => "not-yet-valid",
            Self::WrongAudience => "wrong-audience",
            Self::WrongIssuer => "wrong-issuer",
        };
        f.write_str(s)
    }
}

/// Every way authentication or authorization can fail.
///
/// All variants are terminal: callers map them to an "unauthorized" response
/// (or "forbidden" for `InsufficientCapabilities`). Nothing here is retried.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    #[error("No authorization token.")]
    NoToken,

    #[error("Authorization token incorrect.")]
    MalformedTokenCarrier,

    #[error("Authorization token incorrect.")]
    ParseFailure,

    // Also covers unsigned tokens and key material that cannot be used.
    #[error("Authorization token not verified.")]
    SignatureMismatch,

    #[error("Authorization token invalid.")]
    ConstraintViolation(ConstraintKind),

    #[error("Proper authorization token not found.")]
    IssuerNotRecognized,

    #[error("Authorization token has no issuer.")]
    MissingIssuerClaim,

    #[error("User doesn't have required capabilities: {}.", missing.join(", "))]
    InsufficientCapabilities { missing: Vec<String> },
}

impl AuthError {
    /// Stable machine-readable code, used in HTTP error bodies and logs.
    pub fn code(&self) -> &'static str {
        match self {
            Self::NoToken => "NO_TOKEN",
            Self::MalformedTokenCarrier => "MALFORMED_TOKEN_CARRIER",
            Self::ParseFailure => "PARSE_FAILURE",
            Self::SignatureMismatch => "SIGNATURE_MISMATCH",
            Self::ConstraintViolation(_) => "CONSTRAINT_VIOLATION",
            Self::IssuerNotRecognized => "ISSUER_NOT_RECOGNIZED",
            Self::MissingIssuerClaim => "MISSING_ISSUER_CLAIM",
            Self::InsufficientCapabilities { .. } => "INSUFFICIENT_CAPABILITIES",
        }
    }

    pub fn is_forbidden(&self) -> bool {
        matches!(self, Self::InsufficientCapabilities { .. })
    }
}
