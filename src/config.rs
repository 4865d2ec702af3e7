use std::env;
use std::str::FromStr;

/// Runtime configuration loaded from the environment.
///
/// Every value has a baseline default matching the upstream Wikimedia
/// EventStreams deployment, so the process runs with no configuration at all.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub stream_url: String,
    pub window_secs: i64,
    pub report_interval_secs: u64,
    pub retry_attempts: u32,
    pub retry_delay_secs: u64,
    pub distinguished_domain: String,
    pub rust_log: String,
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidValue(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::InvalidValue(msg) => write!(f, "Invalid configuration value: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}

const DEFAULT_STREAM_URL: &str = "https://stream.wikimedia.org/v2/stream/revision-create";
const DEFAULT_DISTINGUISHED_DOMAIN: &str = "en.wikipedia.org";

fn env_parse<T: FromStr>(key: &str, default: T) -> Result<T, ConfigError> {
    match env::var(key) {
        Ok(raw) => raw
            .parse::<T>()
            .map_err(|_| ConfigError::InvalidValue(format!("{} must be a number, got '{}'", key, raw))),
        Err(_) => Ok(default),
    }
}

impl RuntimeConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let stream_url =
            env::var("STREAM_URL").unwrap_or_else(|_| DEFAULT_STREAM_URL.to_string());

        if !stream_url.starts_with("http://") && !stream_url.starts_with("https://") {
            return Err(ConfigError::InvalidValue(
                "STREAM_URL must start with http:// or https://".to_string(),
            ));
        }

        let window_secs = env_parse("WINDOW_SECS", 300)?;
        if window_secs <= 0 {
            return Err(ConfigError::InvalidValue(
                "WINDOW_SECS must be positive".to_string(),
            ));
        }

        let report_interval_secs = env_parse("REPORT_INTERVAL_SECS", 60)?;
        if report_interval_secs == 0 {
            return Err(ConfigError::InvalidValue(
                "REPORT_INTERVAL_SECS must be positive".to_string(),
            ));
        }

        Ok(Self {
            stream_url,
            window_secs,
            report_interval_secs,
            retry_attempts: env_parse("RETRY_ATTEMPTS", 5)?,
            retry_delay_secs: env_parse("RETRY_DELAY_SECS", 5)?,
            distinguished_domain: env::var("DISTINGUISHED_DOMAIN")
                .unwrap_or_else(|_| DEFAULT_DISTINGUISHED_DOMAIN.to_string()),
            rust_log: env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }
}
