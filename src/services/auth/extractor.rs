//! Candidate token extraction from a request.

use axum::http::{HeaderMap, Request, Uri, request::Parts};

pub const AUTHORIZATION_HEADER: &str = "authorization";
pub const ACCESS_TOKEN_PARAM: &str = "access_token";

/// The two request lookups extraction needs.
pub trait RequestCarrier {
    /// Raw header bytes; `None` only when the header was not sent.
    fn header(&self, name: &str) -> Option<&[u8]>;
    fn query_param(&self, name: &str) -> Option<String>;
}

fn header_from<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a [u8]> {
    headers.get(name).map(|v| v.as_bytes())
}

fn query_from(uri: &Uri, name: &str) -> Option<String> {
    let query = uri.query()?;
    url::form_urlencoded::parse(query.as_bytes())
        .find(|(k, _)| k == name)
        .map(|(_, v)| v.into_owned())
}

impl<B> RequestCarrier for Request<B> {
    fn header(&self, name: &str) -> Option<&[u8]> {
        header_from(self.headers(), name)
    }

    fn query_param(&self, name: &str) -> Option<String> {
        query_from(self.uri(), name)
    }
}

impl RequestCarrier for Parts {
    fn header(&self, name: &str) -> Option<&[u8]> {
        header_from(&self.headers, name)
    }

    fn query_param(&self, name: &str) -> Option<String> {
        query_from(&self.uri, name)
    }
}

/// What the request offered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Candidate {
    /// Nothing to authenticate with.
    Absent,
    /// An authorization header was sent, but not as `Bearer <token>` in
    /// visible ASCII.
    Malformed,
    Found(String),
}

/// Acceptance policy for where tokens may come from.
///
/// Defaults: header accepted, query string not. The header always wins when it
/// carries anything; a malformed header does not fall through to the query
/// string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenExtractor {
    from_header: bool,
    from_query_string: bool,
}

impl Default for TokenExtractor {
    fn default() -> Self {
        Self {
            from_header: true,
            from_query_string: false,
        }
    }
}

impl TokenExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn accept_tokens_from_header(mut self, accept: bool) -> Self {
        self.from_header = accept;
        self
    }

    pub fn accept_tokens_from_query_string(mut self, accept: bool) -> Self {
        self.from_query_string = accept;
        self
    }

    pub fn accepts_header(&self) -> bool {
        self.from_header
    }

    pub fn accepts_query_string(&self) -> bool {
        self.from_query_string
    }

    /// The candidate token string, if any. Malformed carriers yield `None`.
    pub fn extract<R: RequestCarrier + ?Sized>(&self, req: &R) -> Option<String> {
        match self.inspect(req) {
            Candidate::Found(token) => Some(token),
            Candidate::Absent | Candidate::Malformed => None,
        }
    }

    pub fn inspect<R: RequestCarrier + ?Sized>(&self, req: &R) -> Candidate {
        if self.from_header {
            if let Some(value) = req.header(AUTHORIZATION_HEADER) {
                if !value.is_empty() {
                    let token = std::str::from_utf8(value)
                        .ok()
                        .filter(|v| v.is_ascii())
                        .and_then(parse_bearer);
                    return match token {
                        Some(token) => Candidate::Found(token.to_string()),
                        None => Candidate::Malformed,
                    };
                }
            }
        }

        if self.from_query_string {
            if let Some(token) = req.query_param(ACCESS_TOKEN_PARAM) {
                if !token.is_empty() {
                    return Candidate::Found(token);
                }
            }
        }

        Candidate::Absent
    }
}

/// `Bearer <token>`: exactly two single-space separated parts, the second
/// non-empty.
pub fn parse_bearer(value: &str) -> Option<&str> {
    let mut parts = value.split(' ');
    match (parts.next(), parts.next(), parts.next()) {
        (Some("Bearer"), Some(token), None) if !token.is_empty() => Some(token),
        _ => None,
    }
}
