/*
 * Responsibility
 * - Load settings from the environment (.env supported via dotenvy)
 * - Validate them up front so a misconfigured process fails at startup
 * - Derive the issuer and certificate endpoint from base URL + realm
 */
use std::fmt;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use url::Url;

use crate::services::keys::KeySetOptions;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnv {
    Development,
    Production,
}

impl AppEnv {
    fn parse(value: Option<String>) -> Self {
        match value
            .unwrap_or_else(|| "development".to_string())
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

/// Which provider implementation guards the routes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Strategy {
    /// Stateless bearer tokens verified against the issuer's key set.
    #[default]
    Jwt,
    /// Cookie sessions handled by an external identity-server adapter.
    Session,
}

impl FromStr for Strategy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "jwt" => Ok(Self::Jwt),
            "session" => Ok(Self::Session),
            _ => Err(ConfigError::Invalid("IAM_STRATEGY")),
        }
    }
}

#[derive(Debug)]
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

/// Identity-server coordinates consumed when a provider is constructed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderConfig {
    pub issuer_base_url: String,
    pub realm: String,
    pub client_id: String,
    /// Minimum remaining lifetime, in seconds, a token must have to be accepted.
    pub token_min_validity: Option<u64>,
    /// Clock skew, in seconds, tolerated on `exp` / `nbf`.
    pub token_leeway: u64,
}

impl ProviderConfig {
    pub fn new(
        issuer_base_url: impl Into<String>,
        realm: impl Into<String>,
        client_id: impl Into<String>,
    ) -> Self {
        Self {
            issuer_base_url: issuer_base_url.into(),
            realm: realm.into(),
            client_id: client_id.into(),
            token_min_validity: None,
            token_leeway: 0,
        }
    }

    pub fn with_token_min_validity(mut self, seconds: u64) -> Self {
        self.token_min_validity = Some(seconds);
        self
    }

    pub fn with_token_leeway(mut self, seconds: u64) -> Self {
        self.token_leeway = seconds;
        self
    }

    /// `<issuer_base_url>/realms/<realm>`; compared verbatim with `iss`.
    pub fn issuer(&self) -> String {
        format!(
            "{}/realms/{}",
            self.issuer_base_url.trim_end_matches('/'),
            self.realm
        )
    }

    pub fn certs_url(&self) -> Result<Url, ConfigError> {
        Url::parse(&format!("{}/protocol/openid-connect/certs", self.issuer()))
            .map_err(|_| ConfigError::Invalid("IAM_URL"))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.issuer_base_url.trim().is_empty() {
            return Err(ConfigError::Missing("IAM_URL"));
        }
        if self.realm.trim().is_empty() {
            return Err(ConfigError::Missing("IAM_REALM"));
        }
        if self.client_id.trim().is_empty() {
            return Err(ConfigError::Missing("IAM_CLIENT_ID"));
        }
        self.certs_url().map(|_| ())
    }
}

pub struct Config {
    pub addr: SocketAddr,
    pub app_env: AppEnv,
    pub http_timeout: Duration,

    pub strategy: Strategy,
    pub provider: ProviderConfig,
    pub key_set: KeySetOptions,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let port: u16 = lookup("PORT")
            .and_then(|s| s.parse().ok())
            .unwrap_or(3000);

        let addr: SocketAddr = SocketAddr::from_str(&format!("0.0.0.0:{}", port))
            .map_err(|_| ConfigError::Invalid("PORT"))?;

        let app_env = AppEnv::parse(lookup("APP_ENV"));

        let http_timeout = Duration::from_secs(parse_or(&lookup, "HTTP_TIMEOUT_SECONDS", 30)?);

        let strategy = match lookup("IAM_STRATEGY") {
            Some(value) => value.parse()?,
            None => Strategy::default(),
        };

        let issuer_base_url = lookup("IAM_URL").ok_or(ConfigError::Missing("IAM_URL"))?;
        let realm = lookup("IAM_REALM").ok_or(ConfigError::Missing("IAM_REALM"))?;
        let client_id = lookup("IAM_CLIENT_ID").ok_or(ConfigError::Missing("IAM_CLIENT_ID"))?;

        let token_min_validity = match lookup("IAM_TOKEN_MIN_VALIDITY_SECONDS") {
            Some(value) => Some(
                value
                    .parse::<u64>()
                    .map_err(|_| ConfigError::Invalid("IAM_TOKEN_MIN_VALIDITY_SECONDS"))?,
            ),
            None => None,
        };
        let token_leeway = parse_or(&lookup, "IAM_TOKEN_LEEWAY_SECONDS", 0)?;

        let provider = ProviderConfig {
            issuer_base_url,
            realm,
            client_id,
            token_min_validity,
            token_leeway,
        };
        provider.validate()?;

        let defaults = KeySetOptions::default();
        let key_set = KeySetOptions {
            timeout: Duration::from_millis(parse_or(
                &lookup,
                "IAM_JWKS_TIMEOUT_MS",
                defaults.timeout.as_millis() as u64,
            )?),
            cooldown: Duration::from_secs(parse_or(
                &lookup,
                "IAM_JWKS_COOLDOWN_SECONDS",
                defaults.cooldown.as_secs(),
            )?),
            cache_max_age: Duration::from_secs(parse_or(
                &lookup,
                "IAM_JWKS_CACHE_MAX_AGE_SECONDS",
                defaults.cache_max_age.as_secs(),
            )?),
        };

        Ok(Self {
            addr,
            app_env,
            http_timeout,
            strategy,
            provider,
            key_set,
        })
    }
}

fn parse_or(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    default: u64,
) -> Result<u64, ConfigError> {
    match lookup(key) {
        Some(value) => value.parse().map_err(|_| ConfigError::Invalid(key)),
        None => Ok(default),
    }
}
