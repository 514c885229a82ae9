//! Network seam for the API client.
//!
//! The client only ever needs "GET this URL with this bearer and query", so
//! that is the whole trait. Tests swap in an in-memory implementation.

use std::time::Duration;

use async_trait::async_trait;
use common::{Error, FetchLimits};

/// Status and raw body of one HTTP exchange.
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl RawResponse {
    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

#[async_trait]
pub trait Transport: Send + Sync {
    /// Issue a GET. `Err` means the exchange itself failed (connect, timeout,
    /// truncated body); any HTTP status is reported through `Ok`.
    async fn get(
        &self,
        url: &str,
        bearer: &str,
        query: &[(String, String)],
    ) -> Result<RawResponse, Error>;
}

/// reqwest-backed transport.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new(limits: &FetchLimits) -> Result<Self, Error> {
        let client = reqwest::Client::builder()
            .pool_max_idle_per_host(limits.max_connections)
            .tcp_keepalive(Duration::from_secs(30))
            .timeout(Duration::from_secs(limits.request_timeout_secs))
            .build()
            .map_err(|e| Error::Http(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client })
    }

    /// Underlying client, shared with the token exchange.
    pub fn client(&self) -> &reqwest::Client {
        &self.client
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(
        &self,
        url: &str,
        bearer: &str,
        query: &[(String, String)],
    ) -> Result<RawResponse, Error> {
        let resp = self
            .client
            .get(url)
            .bearer_auth(bearer)
            .query(query)
            .send()
            .await
            .map_err(|e| Error::Http(e.to_string()))?;

        let status = resp.status().as_u16();
        let body = resp
            .bytes()
            .await
            .map_err(|e| Error::Http(e.to_string()))?;

        Ok(RawResponse {
            status,
            body: body.to_vec(),
        })
    }
}
