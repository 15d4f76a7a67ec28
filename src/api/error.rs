use snafu::prelude::*;

/// API Error
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)), module(variant), context(suffix(false)))]
pub enum Error {
    /// token is invalid(contains invalid character that cant be send in HTTP header)
    #[snafu(display("session token is invalid"))]
    TokenInvalid,

    /// endpoint url can not be built from api base
    #[snafu(display("build endpoint url {url} failed: {source}"))]
    InvalidEndpoint {
        /// joined url
        url: String,
        /// source error
        source: url::ParseError,
    },

    /// create HTTP client failed
    #[snafu(display("create api client failed: {source}"))]
    ClientCreateFailed {
        /// source error
        source: reqwest::Error,
    },

    /// build api request failed
    #[snafu(display("build request failed: {source}"))]
    BuildRequestFailed {
        /// source error
        source: reqwest::Error,
    },

    /// send api request failed
    #[snafu(display("{} url {url} failed: {source}", method.as_str()))]
    RequestFailed {
        /// http method
        method: reqwest::Method,
        /// target url
        url: String,
        /// source http error
        source: reqwest::Error,
    },

    /// http response of api request is not OK(2xx)
    #[snafu(display("{} url {url} got http status code {status_code}", method.as_str()))]
    HTTPStatusNotOK {
        /// http method
        method: reqwest::Method,
        /// request url
        url: String,
        /// received http status code
        status_code: reqwest::StatusCode,
    },

    /// parse response body of api request as target json type failed
    #[snafu(display("parse response body {body:?} failed: {source}"))]
    ParseBodyFailed {
        /// http response body
        body: bytes::Bytes,
        /// source parse error
        source: serde_json::Error,
    },
}

impl Error {
    /// Server rejected the credential (401 or 403), retrying will not help
    pub fn is_auth_failure(&self) -> bool {
        matches!(
            self,
            Self::HTTPStatusNotOK { status_code, .. }
                if *status_code == reqwest::StatusCode::UNAUTHORIZED
                    || *status_code == reqwest::StatusCode::FORBIDDEN
        ) || matches!(self, Self::TokenInvalid)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn status(code: u16) -> Error {
        Error::HTTPStatusNotOK {
            method: reqwest::Method::GET,
            url: "http://localhost:8000/api/realtime/poll".to_string(),
            status_code: reqwest::StatusCode::from_u16(code).unwrap(),
        }
    }

    #[test]
    fn test_auth_failure_status() {
        assert!(status(401).is_auth_failure());
        assert!(status(403).is_auth_failure());
        assert!(Error::TokenInvalid.is_auth_failure());
    }

    #[test]
    fn test_transient_status() {
        assert!(!status(500).is_auth_failure());
        assert!(!status(502).is_auth_failure());
        assert!(!status(404).is_auth_failure());
    }
}
