use std::time::Duration;

use reqwest::{header::HeaderValue, Method};
use snafu::prelude::*;
use url::Url;

use super::error::variant::*;
use super::types::*;
use super::Result;

static APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);

/// Source of event batches for the long polling transport
#[async_trait::async_trait]
pub trait Poller: Send + Sync {
    /// Fetch events after `cursor`, authenticated by `token`
    async fn poll(&self, token: &str, cursor: Option<&str>) -> Result<PollResponse>;
}

/// Realtime HTTP API Client
#[derive(Debug, Clone)]
pub struct Client {
    client: reqwest::Client,
    api_base: Url,
}

impl Client {
    /// create a new api client, every request is bounded by `timeout`
    pub fn new(api_base: Url, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .gzip(true)
            .deflate(true)
            .user_agent(APP_USER_AGENT)
            .timeout(timeout)
            .build()
            .context(ClientCreateFailed)?;

        Ok(Self { client, api_base })
    }

    async fn request<R>(&self, url: Url, token: &str) -> Result<R>
    where
        R: serde::de::DeserializeOwned,
    {
        let auth_header_value = HeaderValue::from_str(&format!("Bearer {}", token))
            .map_err(|_| TokenInvalid.build())?;

        let req = self
            .client
            .get(url.clone())
            .header(reqwest::header::AUTHORIZATION, auth_header_value)
            .build()
            .context(BuildRequestFailed)?;

        let resp = self
            .client
            .execute(req)
            .await
            .with_context(|_| RequestFailed {
                method: Method::GET,
                url: url.as_str(),
            })?;

        ensure!(
            resp.status().is_success(),
            HTTPStatusNotOK {
                method: Method::GET,
                url: url.as_str(),
                status_code: resp.status()
            }
        );

        let body = resp.bytes().await.with_context(|_| RequestFailed {
            method: Method::GET,
            url: url.as_str(),
        })?;

        serde_json::from_slice(&body).with_context(|_| ParseBodyFailed { body })
    }
}

#[async_trait::async_trait]
impl Poller for Client {
    /// Call /realtime/poll
    async fn poll(&self, token: &str, cursor: Option<&str>) -> Result<PollResponse> {
        let url = poll_url(&self.api_base, cursor).with_context(|_| InvalidEndpoint {
            url: self.api_base.as_str(),
        })?;

        log::trace!("Polling {}", url);

        self.request(url, token).await
    }
}
