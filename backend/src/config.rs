use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::utils::Locale;

/// Minimum secret length accepted for signing context cookies.
pub const MIN_COOKIE_SECRET_LEN: usize = 64;

const DEV_COOKIE_SECRET: &str =
    "dev-cookie-secret-change-in-production-0123456789abcdefghijklmnopqrstuvwxyz";

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub backend: BackendConfig,
    pub cookies: CookieConfig,
    pub locale: LocaleConfig,
    pub verification: VerificationConfig,
    pub cache: CacheConfig,
    pub logging: LoggingConfig,
    pub static_config: StaticConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    /// Base URL of the platform API, e.g. `http://127.0.0.1:8000/api`
    pub base_url: String,
    /// Host (and optional port) serving uploaded media. Derived from
    /// `base_url` when unset.
    pub media_host: Option<String>,
    #[serde(deserialize_with = "deserialize_duration_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CookieConfig {
    /// Signing key material for one-time context cookies
    pub secret: String,
    /// Mark cookies `Secure` (production)
    pub secure: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LocaleConfig {
    pub default: Locale,
    /// Stored preference cookie, read but never written by the gateway
    pub cookie_name: String,
    /// Explicit override, e.g. `?lang=ar`
    pub query_param: String,
    pub detect_from_header: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct VerificationConfig {
    pub max_attempts: u32,
    #[serde(deserialize_with = "deserialize_duration_secs")]
    pub attempt_timeout_secs: u64,
    /// Linear backoff step: attempt `n` waits `n * backoff_ms` before retrying
    pub backoff_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Lifetime of cached list responses; 0 disables the cache
    #[serde(deserialize_with = "deserialize_duration_secs")]
    pub list_ttl_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub file: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StaticConfig {
    pub enabled: bool,
    pub web_root: String,
}

impl Config {
    /// Load configuration with environment variable override support
    ///
    /// Loading order:
    /// 1. Load from the given path, or the first config.toml found
    /// 2. Override with environment variables (prefixed with APP_)
    /// 3. Validate the final configuration
    pub fn load(path: Option<&str>) -> Result<Self, anyhow::Error> {
        let config_path = path.map(str::to_string).or_else(Self::find_config_file);
        let mut config = if let Some(config_path) = config_path {
            tracing::info!("Loading configuration from {}", config_path);
            Self::from_toml(&config_path)?
        } else {
            tracing::warn!("Configuration file not found, using defaults");
            Config::default()
        };

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Apply environment variable overrides
    ///
    /// Supported environment variables:
    /// - APP_ENV: "production" forces secure cookies
    /// - APP_SERVER_HOST / APP_SERVER_PORT
    /// - APP_BACKEND_URL: backend base URL
    /// - APP_MEDIA_HOST: media host override
    /// - APP_BACKEND_TIMEOUT: request timeout (accepts "15s", "1m")
    /// - APP_COOKIE_SECRET: context cookie signing secret
    /// - APP_COOKIE_SECURE: true/false
    /// - APP_DEFAULT_LOCALE: en/ar
    /// - APP_LOG_LEVEL: logging filter (e.g. "info,academy_gateway=debug")
    fn apply_env_overrides(&mut self) {
        if let Ok(host) = std::env::var("APP_SERVER_HOST") {
            self.server.host = host;
            tracing::info!("Override server.host from env: {}", self.server.host);
        }

        if let Ok(port) = std::env::var("APP_SERVER_PORT")
            && let Ok(port) = port.parse()
        {
            self.server.port = port;
            tracing::info!("Override server.port from env: {}", self.server.port);
        }

        if let Ok(url) = std::env::var("APP_BACKEND_URL") {
            self.backend.base_url = url;
            tracing::info!("Override backend.base_url from env: {}", self.backend.base_url);
        }

        if let Ok(host) = std::env::var("APP_MEDIA_HOST") {
            tracing::info!("Override backend.media_host from env: {}", host);
            self.backend.media_host = Some(host);
        }

        if let Ok(timeout) = std::env::var("APP_BACKEND_TIMEOUT") {
            match parse_duration_to_secs(&timeout) {
                Ok(val) => {
                    self.backend.timeout_secs = val;
                    tracing::info!("Override backend.timeout_secs from env: {}", val);
                },
                Err(e) => tracing::warn!(
                    "Invalid APP_BACKEND_TIMEOUT '{}': {} (keep {})",
                    timeout,
                    e,
                    self.backend.timeout_secs
                ),
            }
        }

        if let Ok(secret) = std::env::var("APP_COOKIE_SECRET") {
            self.cookies.secret = secret;
            tracing::info!("Override cookies.secret from env");
        }

        if let Ok(secure) = std::env::var("APP_COOKIE_SECURE")
            && let Ok(secure) = secure.parse()
        {
            self.cookies.secure = secure;
            tracing::info!("Override cookies.secure from env: {}", self.cookies.secure);
        }

        if std::env::var("APP_ENV").is_ok_and(|env| env.eq_ignore_ascii_case("production")) {
            self.cookies.secure = true;
            tracing::info!("APP_ENV=production, cookies are marked Secure");
        }

        if let Ok(locale) = std::env::var("APP_DEFAULT_LOCALE") {
            match Locale::from_code(&locale) {
                Some(locale) => {
                    self.locale.default = locale;
                    tracing::info!("Override locale.default from env: {}", locale);
                },
                None => tracing::warn!("Unsupported APP_DEFAULT_LOCALE '{}'", locale),
            }
        }

        if let Ok(level) = std::env::var("APP_LOG_LEVEL") {
            self.logging.level = level;
            tracing::info!("Override logging.level from env: {}", self.logging.level);
        }
    }

    /// Validate configuration
    fn validate(&self) -> Result<(), anyhow::Error> {
        if self.cookies.secret == DEV_COOKIE_SECRET {
            tracing::warn!("⚠️  WARNING: Using default cookie secret!");
            tracing::warn!(
                "⚠️  Please set APP_COOKIE_SECRET environment variable or update config.toml"
            );
        }

        if self.cookies.secret.len() < MIN_COOKIE_SECRET_LEN {
            anyhow::bail!("cookies.secret must be at least {} bytes", MIN_COOKIE_SECRET_LEN);
        }

        if self.server.port == 0 {
            anyhow::bail!("Server port cannot be 0");
        }

        let base = reqwest::Url::parse(&self.backend.base_url)
            .map_err(|e| anyhow::anyhow!("backend.base_url is invalid: {}", e))?;
        if base.host_str().is_none() {
            anyhow::bail!("backend.base_url must include a host");
        }

        if self.backend.timeout_secs == 0 {
            anyhow::bail!("backend.timeout_secs must be > 0");
        }

        if self.verification.max_attempts == 0 {
            anyhow::bail!("verification.max_attempts must be > 0");
        }
        if self.verification.attempt_timeout_secs == 0 {
            anyhow::bail!("verification.attempt_timeout_secs must be > 0");
        }

        if self.locale.query_param.is_empty() || self.locale.cookie_name.is_empty() {
            anyhow::bail!("locale.query_param and locale.cookie_name cannot be empty");
        }

        Ok(())
    }

    /// Host serving media files: explicit setting, else the backend host.
    pub fn media_host(&self) -> Option<String> {
        if let Some(host) = &self.backend.media_host {
            return Some(host.trim_end_matches('/').to_string());
        }
        let url = reqwest::Url::parse(&self.backend.base_url).ok()?;
        let host = url.host_str()?;
        Some(match url.port() {
            Some(port) => format!("{}:{}", host, port),
            None => host.to_string(),
        })
    }

    fn find_config_file() -> Option<String> {
        let possible_paths =
            ["conf/config.toml", "config.toml", "./conf/config.toml", "./config.toml"];

        for path in &possible_paths {
            if Path::new(path).exists() {
                return Some(path.to_string());
            }
        }
        None
    }

    fn from_toml(path: &str) -> Result<Self, anyhow::Error> {
        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, anyhow::Error> {
        let config: Config = toml::from_str(content)?;
        Ok(config)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { host: "0.0.0.0".to_string(), port: 3000 }
    }
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self { base_url: "http://127.0.0.1:8000/api".to_string(), media_host: None, timeout_secs: 15 }
    }
}

impl Default for CookieConfig {
    fn default() -> Self {
        Self { secret: DEV_COOKIE_SECRET.to_string(), secure: false }
    }
}

impl Default for LocaleConfig {
    fn default() -> Self {
        Self {
            default: Locale::En,
            cookie_name: "NEXT_LOCALE".to_string(),
            query_param: "lang".to_string(),
            detect_from_header: true,
        }
    }
}

impl Default for VerificationConfig {
    fn default() -> Self {
        Self { max_attempts: 3, attempt_timeout_secs: 10, backoff_ms: 1000 }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self { list_ttl_secs: 30 }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info,academy_gateway=debug".to_string(),
            file: Some("logs/academy-gateway.log".to_string()),
        }
    }
}

impl Default for StaticConfig {
    fn default() -> Self {
        Self { enabled: true, web_root: "web".to_string() }
    }
}

// =========================
// Helpers for parsing values
// =========================

fn parse_duration_to_secs(input: &str) -> Result<u64, String> {
    // Accept plain numbers (treated as seconds)
    if let Ok(val) = input.parse::<u64>() {
        return Ok(val);
    }

    let s = input.trim().to_lowercase();
    let (num_str, unit) = s.split_at(s.chars().take_while(|c| c.is_ascii_digit()).count());
    if num_str.is_empty() || unit.is_empty() {
        return Err("missing number or unit".into());
    }
    let n: u64 = num_str.parse().map_err(|_| "invalid number".to_string())?;
    match unit {
        "s" | "sec" | "secs" | "second" | "seconds" => Ok(n),
        "m" | "min" | "mins" | "minute" | "minutes" => Ok(n * 60),
        "h" | "hr" | "hour" | "hours" => Ok(n * 60 * 60),
        "d" | "day" | "days" => Ok(n * 60 * 60 * 24),
        _ => Err(format!("unsupported unit: {}", unit)),
    }
}

// Accepts numeric seconds or human-friendly strings
fn deserialize_duration_secs<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: serde::Deserializer<'de>,
{
    struct Visitor;
    impl<'de> serde::de::Visitor<'de> for Visitor {
        type Value = u64;
        fn expecting(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
            write!(f, "a number of seconds or a string like '30s', '5m', '1h'")
        }
        fn visit_u64<E>(self, v: u64) -> Result<Self::Value, E> {
            Ok(v)
        }
        fn visit_i64<E>(self, v: i64) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            if v >= 0 { Ok(v as u64) } else { Err(E::custom("negative not allowed")) }
        }
        fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            parse_duration_to_secs(v).map_err(E::custom)
        }
    }
    deserializer.deserialize_any(Visitor)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_duration() {
        assert_eq!(parse_duration_to_secs("10"), Ok(10));
        assert_eq!(parse_duration_to_secs("15s"), Ok(15));
        assert_eq!(parse_duration_to_secs("5m"), Ok(300));
        assert_eq!(parse_duration_to_secs("1h"), Ok(3600));
        assert_eq!(parse_duration_to_secs("7d"), Ok(604_800));
        assert!(parse_duration_to_secs("s").is_err());
        assert!(parse_duration_to_secs("3 fortnights").is_err());
    }

    #[test]
    fn test_defaults_are_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.locale.default, Locale::En);
        assert_eq!(config.verification.max_attempts, 3);
        assert_eq!(config.verification.attempt_timeout_secs, 10);
    }

    #[test]
    fn test_from_toml_str() {
        let config = Config::from_toml_str(
            r#"
            [backend]
            base_url = "https://api.example.com/api"
            timeout_secs = "1m"

            [locale]
            default = "ar"

            [cache]
            list_ttl_secs = 0
            "#,
        )
        .unwrap();

        assert_eq!(config.backend.timeout_secs, 60);
        assert_eq!(config.locale.default, Locale::Ar);
        assert_eq!(config.locale.cookie_name, "NEXT_LOCALE");
        assert_eq!(config.cache.list_ttl_secs, 0);
        assert_eq!(config.media_host().as_deref(), Some("api.example.com"));
    }

    #[test]
    fn test_media_host_keeps_port() {
        let mut config = Config::default();
        assert_eq!(config.media_host().as_deref(), Some("127.0.0.1:8000"));
        config.backend.media_host = Some("cdn.example.com/".to_string());
        assert_eq!(config.media_host().as_deref(), Some("cdn.example.com"));
    }

    #[test]
    fn test_short_secret_rejected() {
        let mut config = Config::default();
        config.cookies.secret = "short".to_string();
        assert!(config.validate().is_err());
    }
}
