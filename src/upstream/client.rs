//! reqwest-backed [`RemoteFetcher`].

use std::time::Instant;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::Client;
use reqwest::header::AUTHORIZATION;
use tracing::{debug, info, warn};

use super::{RemoteFetcher, UpstreamConfig};
use crate::telemetry;
use crate::{HuginnError, Result};

/// Client for the upstream resource API.
///
/// Sends `GET {base_url}{path}` with `Authorization: {scheme} {token}` and
/// passes the body through untouched.
#[derive(Clone)]
pub struct HttpFetcher {
    http: Client,
    base_url: String,
    authorization: String,
    config: UpstreamConfig,
}

impl HttpFetcher {
    /// Build a fetcher from `config`.
    pub fn new(config: UpstreamConfig) -> Result<Self> {
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| {
                HuginnError::Configuration(format!("failed to build HTTP client: {e}"))
            })?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            authorization: format!("{} {}", config.auth_scheme, config.token),
            config,
        })
    }

    /// Base URL requests are sent to.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn send(&self, path: &str) -> Result<Bytes> {
        let url = format!("{}{}", self.base_url, path);

        let response = self
            .http
            .get(&url)
            .header(AUTHORIZATION, &self.authorization)
            .send()
            .await
            .map_err(|e| self.transport_error(path, e))?;

        let status = response.status();
        debug!(path, status = status.as_u16(), "upstream responded");
        metrics::counter!(telemetry::UPSTREAM_REQUESTS_TOTAL,
            "status" => status.as_u16().to_string(),
        )
        .increment(1);

        if !status.is_success() {
            return Err(HuginnError::UpstreamRejected {
                status: status.as_u16(),
            });
        }

        response
            .bytes()
            .await
            .map_err(|e| self.transport_error(path, e))
    }

    fn transport_error(&self, path: &str, err: reqwest::Error) -> HuginnError {
        let (label, mapped) = if err.is_timeout() {
            ("timeout", HuginnError::Timeout(self.config.timeout))
        } else {
            ("unreachable", HuginnError::Unreachable(err.to_string()))
        };
        warn!(path, error = %err, "upstream request failed");
        metrics::counter!(telemetry::UPSTREAM_REQUESTS_TOTAL, "status" => label).increment(1);
        mapped
    }
}

#[async_trait]
impl RemoteFetcher for HttpFetcher {
    fn name(&self) -> &str {
        "http"
    }

    async fn fetch(&self, path: &str) -> Result<Bytes> {
        info!(path, "fetching resource");
        let start = Instant::now();
        let result = self.send(path).await;
        metrics::histogram!(telemetry::UPSTREAM_DURATION_SECONDS)
            .record(start.elapsed().as_secs_f64());
        result
    }
}
