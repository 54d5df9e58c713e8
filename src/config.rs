use std::{env, net::SocketAddr, time::Duration};
use thiserror::Error;
use url::Url;

const DEFAULT_PORT: u16 = 8080;
const DEFAULT_API_BASE_URL: &str = "http://localhost:9090";
const DEFAULT_API_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("API_BASE_URL is not a valid url: {0}")]
    InvalidBaseUrl(#[from] url::ParseError),

    #[error("API_TIMEOUT_SECS must be a positive number of seconds, got '{0}'")]
    InvalidTimeout(String),
}

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub api_base_url: Url,
    pub api_timeout: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from any key lookup; `from_env` passes the process environment.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let port = lookup("PORT")
            .and_then(|value| value.parse::<u16>().ok())
            .unwrap_or(DEFAULT_PORT);

        let api_base_url = match lookup("API_BASE_URL") {
            Some(value) => Url::parse(&value)?,
            None => Url::parse(DEFAULT_API_BASE_URL)?,
        };

        let api_timeout = match lookup("API_TIMEOUT_SECS") {
            Some(value) => match value.parse::<u64>() {
                Ok(secs) if secs > 0 => Duration::from_secs(secs),
                _ => return Err(ConfigError::InvalidTimeout(value)),
            },
            None => Duration::from_secs(DEFAULT_API_TIMEOUT_SECS),
        };

        Ok(Self {
            port,
            api_base_url,
            api_timeout,
        })
    }

    pub fn listen_addr(&self) -> SocketAddr {
        SocketAddr::from(([0, 0, 0, 0], self.port))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_when_unset() {
        let config = Config::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.api_base_url.as_str(), "http://localhost:9090/");
        assert_eq!(config.api_timeout, Duration::from_secs(10));
    }

    #[test]
    fn invalid_port_falls_back() {
        let config = Config::from_lookup(lookup(&[("PORT", "not-a-port")])).unwrap();
        assert_eq!(config.port, 8080);
    }

    #[test]
    fn rejects_bad_base_url_and_timeout() {
        assert!(matches!(
            Config::from_lookup(lookup(&[("API_BASE_URL", "localhost")])),
            Err(ConfigError::InvalidBaseUrl(_))
        ));
        assert!(matches!(
            Config::from_lookup(lookup(&[("API_TIMEOUT_SECS", "0")])),
            Err(ConfigError::InvalidTimeout(_))
        ));
    }
}
