//! Session configuration.

use std::time::Duration;

use snafu::prelude::*;
use url::Url;

/// environment variable for socket base url
pub const WS_BASE_URL_ENV: &str = "CHAT_WS_BASE_URL";
/// environment variable for http api base url
pub const API_BASE_URL_ENV: &str = "CHAT_API_BASE_URL";

/// shortest heartbeat interval used on an open socket
pub const MIN_HEARTBEAT_INTERVAL: Duration = Duration::from_secs(1);

const DEFAULT_WS_BASE_URL: &str = "ws://localhost:8000";
const DEFAULT_API_BASE_URL: &str = "http://localhost:8000/api";

/// Error when build config
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)), module(error), context(suffix(false)))]
pub enum ConfigError {
    /// value is not an url
    #[snafu(display("{name} value {value} is an invalid url: {source}"))]
    InvalidURL {
        /// setting name
        name: String,
        /// received value
        value: String,
        /// source error
        source: url::ParseError,
    },

    /// socket base url does not use ws or wss
    #[snafu(display("socket base url {url} has invalid schema {schema}, only ws or wss is ok"))]
    InvalidSocketSchema {
        /// the url
        url: String,
        /// invalid schema
        schema: String,
    },

    /// api base url does not use http or https
    #[snafu(display("api base url {url} has invalid schema {schema}, only http or https is ok"))]
    InvalidAPISchema {
        /// the url
        url: String,
        /// invalid schema
        schema: String,
    },

    /// base url has no host
    #[snafu(display("base url {url} has no host"))]
    NoHost {
        /// the url
        url: String,
    },
}

/// Connection manager settings.
///
/// [`Config::resilient`] (the default) falls back to long polling after the socket
/// attempts run out, [`Config::simple`] gives up instead.
#[derive(Debug, Clone)]
pub struct Config {
    /// socket endpoint base, `<ws_base>/ws?token=...` is connected
    pub ws_base: Url,
    /// http api base, `<api_base>/realtime/poll` is polled
    pub api_base: Url,
    /// socket connection attempts of one socket phase before downgrade
    pub max_socket_attempts: u32,
    /// ping interval on an open socket, values below [MIN_HEARTBEAT_INTERVAL] are raised to it
    pub heartbeat_interval: Duration,
    /// first reconnect delay, doubled for each further attempt
    pub reconnect_base_delay: Duration,
    /// reconnect delay cap
    pub reconnect_max_delay: Duration,
    /// delay before re-poll after a failed poll
    pub poll_retry_delay: Duration,
    /// bound of socket open and each poll request
    pub request_timeout: Duration,
    /// switch to long polling after socket attempts run out
    pub enable_polling_fallback: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self::resilient()
    }
}

impl Config {
    /// Socket first, long polling fallback
    pub fn resilient() -> Self {
        Self {
            ws_base: default_url(DEFAULT_WS_BASE_URL),
            api_base: default_url(DEFAULT_API_BASE_URL),
            max_socket_attempts: 5,
            heartbeat_interval: Duration::from_secs(30),
            reconnect_base_delay: Duration::from_secs(1),
            reconnect_max_delay: Duration::from_secs(30),
            poll_retry_delay: Duration::from_secs(2),
            request_timeout: Duration::from_secs(30),
            enable_polling_fallback: true,
        }
    }

    /// Socket only
    pub fn simple() -> Self {
        Self {
            enable_polling_fallback: false,
            ..Self::resilient()
        }
    }

    /// Default config with base urls overridden by `CHAT_WS_BASE_URL` and `CHAT_API_BASE_URL`
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Ok(value) = std::env::var(WS_BASE_URL_ENV) {
            log::debug!("{} = {}", WS_BASE_URL_ENV, value);
            config = config.with_ws_base(parse_url(WS_BASE_URL_ENV, &value)?)?;
        }

        if let Ok(value) = std::env::var(API_BASE_URL_ENV) {
            log::debug!("{} = {}", API_BASE_URL_ENV, value);
            config = config.with_api_base(parse_url(API_BASE_URL_ENV, &value)?)?;
        }

        Ok(config)
    }

    /// Set socket base url, must be ws or wss
    pub fn with_ws_base(mut self, url: Url) -> Result<Self, ConfigError> {
        ensure!(
            url.scheme() == "ws" || url.scheme() == "wss",
            error::InvalidSocketSchema {
                url: url.as_str(),
                schema: url.scheme(),
            }
        );
        ensure!(url.has_host(), error::NoHost { url: url.as_str() });

        self.ws_base = url;
        Ok(self)
    }

    /// Set http api base url, must be http or https
    pub fn with_api_base(mut self, url: Url) -> Result<Self, ConfigError> {
        ensure!(
            url.scheme() == "http" || url.scheme() == "https",
            error::InvalidAPISchema {
                url: url.as_str(),
                schema: url.scheme(),
            }
        );
        ensure!(url.has_host(), error::NoHost { url: url.as_str() });

        self.api_base = url;
        Ok(self)
    }

    /// Set max socket attempts, at least one
    pub fn with_max_socket_attempts(mut self, attempts: u32) -> Self {
        self.max_socket_attempts = attempts.max(1);
        self
    }

    /// Set heartbeat interval, at least [MIN_HEARTBEAT_INTERVAL]
    pub fn with_heartbeat_interval(mut self, interval: Duration) -> Self {
        self.heartbeat_interval = interval.max(MIN_HEARTBEAT_INTERVAL);
        self
    }

    /// heartbeat interval actually used, the field may have been set directly
    pub(crate) fn heartbeat(&self) -> Duration {
        self.heartbeat_interval.max(MIN_HEARTBEAT_INTERVAL)
    }

    /// Set reconnect backoff base and cap
    pub fn with_reconnect_delay(mut self, base: Duration, max: Duration) -> Self {
        self.reconnect_base_delay = base;
        self.reconnect_max_delay = max.max(base);
        self
    }

    /// Set poll retry delay
    pub fn with_poll_retry_delay(mut self, delay: Duration) -> Self {
        self.poll_retry_delay = delay;
        self
    }

    /// Set request timeout
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Enable or disable long polling fallback
    pub fn with_polling_fallback(mut self, enable: bool) -> Self {
        self.enable_polling_fallback = enable;
        self
    }
}

fn parse_url(name: &str, value: &str) -> Result<Url, ConfigError> {
    Url::parse(value).context(error::InvalidURL { name, value })
}

fn default_url(s: &str) -> Url {
    // constants above are valid urls
    Url::parse(s).unwrap_or_else(|e| panic!("invalid builtin url {}: {}", s, e))
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();

        assert_eq!(config.ws_base.as_str(), "ws://localhost:8000/");
        assert_eq!(config.api_base.as_str(), "http://localhost:8000/api");
        assert_eq!(config.max_socket_attempts, 5);
        assert_eq!(config.heartbeat_interval, Duration::from_secs(30));
        assert_eq!(config.reconnect_max_delay, Duration::from_secs(30));
        assert_eq!(config.poll_retry_delay, Duration::from_secs(2));
        assert!(config.enable_polling_fallback);
        assert!(!Config::simple().enable_polling_fallback);
    }

    #[test]
    fn test_reject_non_websocket_base() {
        let err = Config::default()
            .with_ws_base(Url::parse("http://localhost:8000").unwrap())
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidSocketSchema { .. }));
    }

    #[test]
    fn test_reject_non_http_api_base() {
        let err = Config::default()
            .with_api_base(Url::parse("wss://chat.example.com/api").unwrap())
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidAPISchema { .. }));
    }

    #[test]
    fn test_at_least_one_socket_attempt() {
        assert_eq!(
            Config::default()
                .with_max_socket_attempts(0)
                .max_socket_attempts,
            1
        );
    }

    #[test]
    fn test_heartbeat_interval_has_a_floor() {
        let config = Config::default().with_heartbeat_interval(Duration::ZERO);
        assert_eq!(config.heartbeat_interval, MIN_HEARTBEAT_INTERVAL);

        let mut config = Config::default();
        config.heartbeat_interval = Duration::from_millis(5);
        assert_eq!(config.heartbeat(), MIN_HEARTBEAT_INTERVAL);

        let config = Config::default().with_heartbeat_interval(Duration::from_secs(10));
        assert_eq!(config.heartbeat(), Duration::from_secs(10));
    }

    #[test]
    fn test_parse_url_error() {
        let err = parse_url(WS_BASE_URL_ENV, "not a url").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidURL { .. }));
    }
}
