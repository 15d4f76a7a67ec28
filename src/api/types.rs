//! Realtime endpoint types

use std::{collections::HashMap, str::FromStr};

use serde::Deserialize;
use snafu::prelude::*;
use url::Url;

use crate::ws::RealtimeEvent;

/// query parameter carrying the polling cursor
pub const CURSOR_QUERY_KEY: &str = "lastMessageId";

/// data type for api /realtime/poll
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PollResponse {
    /// events since the cursor, in server order
    #[serde(default)]
    pub events: Vec<RealtimeEvent>,
    /// server time of this batch
    #[serde(default)]
    pub timestamp: Option<String>,
}

/// Append path segments to a base url, keeping the base path.
///
/// `http://host/api` + `realtime/poll` is `http://host/api/realtime/poll`.
pub(crate) fn endpoint(base: &Url, path: &str) -> Result<Url, url::ParseError> {
    let s = format!(
        "{}/{}",
        base.as_str().trim_end_matches('/'),
        path.trim_start_matches('/')
    );
    Url::parse(&s)
}

/// Build `<api-base>/realtime/poll?lastMessageId=<cursor-or-empty>`
pub(crate) fn poll_url(base: &Url, cursor: Option<&str>) -> Result<Url, url::ParseError> {
    let mut u = endpoint(base, "realtime/poll")?;
    u.query_pairs_mut()
        .append_pair(CURSOR_QUERY_KEY, cursor.unwrap_or_default());
    Ok(u)
}

/// Url as string with the `token` query value masked, for logs and errors
pub(crate) fn redact_token(url: &Url) -> String {
    let mut u = url.clone();
    let pairs = url
        .query_pairs()
        .map(|(k, v)| {
            let v = if k == "token" { "***".into() } else { v };
            (k.into_owned(), v.into_owned())
        })
        .collect::<Vec<_>>();

    if !pairs.is_empty() {
        u.query_pairs_mut().clear().extend_pairs(pairs);
    }

    u.to_string()
}

/// Parse string as socket url error
#[derive(Debug, Snafu)]
#[snafu(
    visibility(pub(crate)),
    module(parse_socket_url_error_variant),
    context(suffix(false))
)]
pub enum ParseSocketURLError {
    #[snafu(display("{s} is an invalid url: {source}"))]
    /// the str is not a valid url
    InvalidURL {
        /// string be parsed
        s: String,
        /// source error
        source: url::ParseError,
    },

    /// the parsed url schema is not websocket
    #[snafu(display("the url {s} has invalid schema {schema}, only ws or wss is ok"))]
    InvalidSchema {
        /// the url
        s: String,
        /// invalid schema
        schema: String,
    },

    /// the parsed url has no host
    #[snafu(display("the socket url {s} has no host"))]
    NoHost {
        /// the url
        s: String,
    },

    /// the parsed url has no token
    #[snafu(display("the socket url {s} has no token"))]
    NoToken {
        /// the url
        s: String,
    },
}

/// Socket endpoint of one session: `<ws-base>/ws?token=<token>`
#[derive(Debug, Clone)]
pub struct SocketURLInfo {
    /// ws or wss base url
    pub base: Url,
    /// session token
    pub token: String,
}

impl SocketURLInfo {
    /// Create from a base url and a token
    pub fn new<S: Into<String>>(base: Url, token: S) -> Self {
        Self {
            base,
            token: token.into(),
        }
    }

    /// construct final url
    pub fn url(&self) -> Result<Url, url::ParseError> {
        let mut u = endpoint(&self.base, "ws")?;
        u.query_pairs_mut().append_pair("token", &self.token);
        Ok(u)
    }
}

impl FromStr for SocketURLInfo {
    type Err = ParseSocketURLError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let url = Url::parse(s)
            .with_context(|_| parse_socket_url_error_variant::InvalidURL { s: s.to_string() })?;

        ensure!(
            url.scheme() == "wss" || url.scheme() == "ws",
            parse_socket_url_error_variant::InvalidSchema {
                s,
                schema: url.scheme(),
            }
        );

        ensure!(
            url.has_host(),
            parse_socket_url_error_variant::NoHost { s }
        );

        let query = url.query_pairs().collect::<HashMap<_, _>>();

        let token = query
            .get("token")
            .with_context(|| parse_socket_url_error_variant::NoToken { s })?
            .to_string();

        let mut base = url.clone();
        base.set_query(None);
        let path = base.path().trim_end_matches('/');
        let path = path.strip_suffix("/ws").unwrap_or(path).to_string();
        base.set_path(&path);

        Ok(SocketURLInfo { base, token })
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_poll_url_keeps_api_prefix() {
        let base = Url::parse("http://localhost:8000/api").unwrap();
        let u = poll_url(&base, Some("5")).unwrap();
        assert_eq!(
            u.as_str(),
            "http://localhost:8000/api/realtime/poll?lastMessageId=5"
        );
    }

    #[test]
    fn test_poll_url_without_cursor() {
        let base = Url::parse("http://localhost:8000/api/").unwrap();
        let u = poll_url(&base, None).unwrap();
        assert_eq!(
            u.as_str(),
            "http://localhost:8000/api/realtime/poll?lastMessageId="
        );
    }

    #[test]
    fn test_socket_url() {
        let info = SocketURLInfo::new(Url::parse("ws://localhost:8000").unwrap(), "abc");
        assert_eq!(
            info.url().unwrap().as_str(),
            "ws://localhost:8000/ws?token=abc"
        );
    }

    #[test]
    fn test_socket_url_token_is_encoded() {
        let info = SocketURLInfo::new(Url::parse("wss://chat.example.com").unwrap(), "a b&c");
        assert_eq!(
            info.url().unwrap().as_str(),
            "wss://chat.example.com/ws?token=a+b%26c"
        );
    }

    #[test]
    fn test_redact_token() {
        let u = Url::parse("ws://localhost:8000/ws?token=secret").unwrap();
        assert_eq!(redact_token(&u), "ws://localhost:8000/ws?token=***");

        let u = Url::parse("http://localhost:8000/api/realtime/poll").unwrap();
        assert_eq!(redact_token(&u), "http://localhost:8000/api/realtime/poll");
    }

    #[test]
    fn test_parse_socket_url() {
        let info: SocketURLInfo = "wss://chat.example.com/ws?token=t0k".parse().unwrap();
        assert_eq!(info.token, "t0k");
        assert_eq!(
            info.url().unwrap().as_str(),
            "wss://chat.example.com/ws?token=t0k"
        );
    }

    #[test]
    fn test_parse_socket_url_errors() {
        assert!(matches!(
            "http://chat.example.com/ws?token=x".parse::<SocketURLInfo>(),
            Err(ParseSocketURLError::InvalidSchema { .. })
        ));
        assert!(matches!(
            "ws://chat.example.com/ws".parse::<SocketURLInfo>(),
            Err(ParseSocketURLError::NoToken { .. })
        ));
        assert!(matches!(
            "::".parse::<SocketURLInfo>(),
            Err(ParseSocketURLError::InvalidURL { .. })
        ));
    }

    #[test]
    fn test_poll_response_tolerates_missing_fields() {
        let resp: PollResponse = serde_json::from_str("{}").unwrap();
        assert!(resp.events.is_empty());
        assert!(resp.timestamp.is_none());
    }
}
