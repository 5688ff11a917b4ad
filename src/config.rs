/*
 * Responsibility
 * - 環境変数の読み込み (PORT, APP_ENV, AUTH_* など)
 * - 設定値のバリデーション (不足・不正なら起動失敗)
 */
use std::fmt;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnv {
    Development,
    Production,
}

impl AppEnv {
    fn parse(value: Option<&str>) -> Self {
        match value
            .unwrap_or("development")
            .to_ascii_lowercase()
            .as_str()
        {
            "production" | "prod" => Self::Production,
            _ => Self::Development,
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum ConfigError {
    Missing(&'static str),
    Invalid(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Missing(key) => write!(f, "missing configuration: {}", key),
            ConfigError::Invalid(key) => write!(f, "invalid configuration: {}", key),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Where verification keys come from.
#[derive(Clone, PartialEq, Eq)]
pub enum VerificationKeys {
    /// `AUTH_VERIFICATION_KEYS`: one key, or several tried in order.
    Keys(Vec<String>),
    /// `AUTH_ISSUER_KEYS`: `name=key` pairs, selected by the token's `iss`.
    Issuers(Vec<(String, String)>),
}

impl fmt::Debug for VerificationKeys {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Key material stays out of logs
        match self {
            Self::Keys(keys) => write!(f, "Keys({} keys)", keys.len()),
            Self::Issuers(items) => f
                .debug_tuple("Issuers")
                .field(&items.iter().map(|(name, _)| name).collect::<Vec<_>>())
                .finish(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AuthSettings {
    pub algorithm: Option<String>,
    pub hash: Option<String>,
    pub audience: Option<String>,
    pub issuer: Option<String>,
    pub keys: VerificationKeys,
    pub accept_query_token: bool,
    pub leeway: Duration,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub addr: SocketAddr,
    pub app_env: AppEnv,
    pub request_timeout: Duration,
    pub auth: AuthSettings,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Build from any variable source; `from_env` passes the process env.
    pub fn from_vars<F>(var: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let port: u16 = match var("PORT") {
            Some(s) => s.parse().map_err(|_| ConfigError::Invalid("PORT"))?,
            None => 3000,
        };

        let addr: SocketAddr = SocketAddr::from_str(&format!("0.0.0.0:{}", port))
            .map_err(|_| ConfigError::Invalid("PORT"))?;

        let app_env = AppEnv::parse(var("APP_ENV").as_deref());

        let request_timeout = Duration::from_secs(
            parse_or(&var, "REQUEST_TIMEOUT_SECONDS", 30)?,
        );

        let non_empty = |key: &str| var(key).filter(|v| !v.trim().is_empty());

        let keys = match (
            non_empty("AUTH_ISSUER_KEYS"),
            non_empty("AUTH_VERIFICATION_KEYS"),
        ) {
            (Some(items), _) => VerificationKeys::Issuers(parse_issuer_keys(&items)?),
            (None, Some(keys)) => VerificationKeys::Keys(split_keys(&keys)),
            (None, None) => return Err(ConfigError::Missing("AUTH_VERIFICATION_KEYS")),
        };

        let accept_query_token = match var("AUTH_ACCEPT_QUERY_TOKEN") {
            Some(v) => parse_bool(&v).ok_or(ConfigError::Invalid("AUTH_ACCEPT_QUERY_TOKEN"))?,
            None => false,
        };

        let auth = AuthSettings {
            algorithm: non_empty("AUTH_ALGORITHM"),
            hash: non_empty("AUTH_HASH"),
            audience: non_empty("AUTH_AUDIENCE"),
            issuer: non_empty("AUTH_ISSUER"),
            keys,
            accept_query_token,
            leeway: Duration::from_secs(parse_or(&var, "AUTH_LEEWAY_SECONDS", 0)?),
        };

        Ok(Self {
            addr,
            app_env,
            request_timeout,
            auth,
        })
    }
}

fn parse_or<F>(var: &F, key: &'static str, default: u64) -> Result<u64, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match var(key) {
        Some(v) => v.trim().parse().map_err(|_| ConfigError::Invalid(key)),
        None => Ok(default),
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" | "" => Some(false),
        _ => None,
    }
}

// PEM values are usually passed on one line with literal "\n".
fn unescape_key(raw: &str) -> String {
    raw.trim().replace("\\n", "\n")
}

fn split_keys(raw: &str) -> Vec<String> {
    raw.split(';')
        .map(unescape_key)
        .filter(|k| !k.is_empty())
        .collect()
}

fn parse_issuer_keys(raw: &str) -> Result<Vec<(String, String)>, ConfigError> {
    raw.split(';')
        .filter(|entry| !entry.trim().is_empty())
        .map(|entry| {
            let (name, key) = entry
                .split_once('=')
                .ok_or(ConfigError::Invalid("AUTH_ISSUER_KEYS"))?;
            let (name, key) = (name.trim(), unescape_key(key));
            if name.is_empty() || key.is_empty() {
                return Err(ConfigError::Invalid("AUTH_ISSUER_KEYS"));
            }
            Ok((name.to_string(), key))
        })
        .collect()
}
