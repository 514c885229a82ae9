//! REST client for the Battle.net game data and profile APIs.
//!
//! Every network call goes through the same path: optional cache read,
//! connection permit, request quota, GET, retry on throttling or transport
//! failure, cache write on success.

use std::time::Duration;

use async_stream::try_stream;
use common::{Error, FetchLimits, Region, ScannerConfig};
use futures_util::stream::{FuturesUnordered, Stream, StreamExt};
use serde_json::Value;
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};

use crate::auth::{self, AccessToken, OAUTH_TOKEN_URL};
use crate::cache::DiskCache;
use crate::rate_limit::{BatchWindow, RateLimiter};
use crate::transport::{HttpTransport, RawResponse, Transport};

/// API namespace a resource lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Namespace {
    /// Game data that only changes with patches.
    Static,
    /// Game data that changes during a season (leaderboards, realms).
    Dynamic,
    /// Character data.
    Profile,
}

impl Namespace {
    pub fn as_str(&self) -> &'static str {
        match self {
            Namespace::Static => "static",
            Namespace::Dynamic => "dynamic",
            Namespace::Profile => "profile",
        }
    }

    /// Namespace parameter as sent upstream, e.g. `static-us`.
    pub fn qualified(&self, region: Region) -> String {
        format!("{}-{}", self.as_str(), region)
    }
}

/// One result of a batched fetch. `body` is `None` for non-200 statuses.
#[derive(Debug, Clone)]
pub struct Fetched<C> {
    pub body: Option<Value>,
    pub status: u16,
    pub context: C,
}

/// Status plus decoded body (200 only) of a finished request.
struct Reply {
    status: u16,
    body: Option<Value>,
    text: String,
}

/// Battle.net API client.
pub struct BnetClient {
    transport: Box<dyn Transport>,
    token: AccessToken,
    region: Region,
    cache: DiskCache,
    refresh: bool,
    limits: FetchLimits,
    connections: Semaphore,
    limiter: RateLimiter,
}

impl std::fmt::Debug for BnetClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BnetClient")
            .field("region", &self.region)
            .field("cache", &self.cache.root())
            .field("refresh", &self.refresh)
            .field("limits", &self.limits)
            .finish()
    }
}

impl BnetClient {
    /// Authenticate and open the cache described by `config`.
    pub async fn connect(config: &ScannerConfig) -> Result<Self, Error> {
        let transport = HttpTransport::new(&config.limits)?;
        let token = auth::request_token(
            transport.client(),
            OAUTH_TOKEN_URL,
            &config.client_id,
            &config.client_secret,
        )
        .await?;
        info!("Authenticated against Battle.net ({})", config.region);

        let cache = DiskCache::new(&config.cache_path, config.region)?;
        Ok(
            Self::with_transport(transport, token, config.region, cache, config.limits.clone())
                .refreshing(config.refresh),
        )
    }

    pub fn with_transport(
        transport: impl Transport + 'static,
        token: AccessToken,
        region: Region,
        cache: DiskCache,
        limits: FetchLimits,
    ) -> Self {
        Self {
            transport: Box::new(transport),
            token,
            region,
            cache,
            refresh: false,
            connections: Semaphore::new(limits.max_connections.max(1)),
            limiter: RateLimiter::per_second(limits.requests_per_second),
            limits,
        }
    }

    /// Skip cache reads. Successful responses are still written back.
    pub fn refreshing(mut self, refresh: bool) -> Self {
        self.refresh = refresh;
        self
    }

    pub fn region(&self) -> Region {
        self.region
    }

    pub fn limits(&self) -> &FetchLimits {
        &self.limits
    }

    /// Full URL for a resource path, or an href with its query stripped.
    pub fn resolve_url(&self, resource: &str) -> String {
        match url::Url::parse(resource) {
            Ok(mut href) => {
                href.set_query(None);
                href.to_string()
            }
            Err(_) => format!("https://{}.api.blizzard.com{}", self.region, resource),
        }
    }

    fn query(&self, namespace: Namespace, params: &[(&str, &str)]) -> Vec<(String, String)> {
        let mut query: Vec<(String, String)> = params
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        query.push(("namespace".into(), namespace.qualified(self.region)));
        query.push(("locale".into(), self.region.locale().into()));
        query
    }

    fn cached(&self, url: &str, use_cache: bool) -> Result<Option<Value>, Error> {
        if !use_cache || self.refresh {
            return Ok(None);
        }
        self.cache.get(url)
    }

    // ── Single fetch ──────────────────────────────────────────────────

    /// Fetch one resource. Any status other than 200 (after throttling
    /// retries) is an error.
    pub async fn get(
        &self,
        resource: &str,
        namespace: Namespace,
        params: &[(&str, &str)],
        use_cache: bool,
    ) -> Result<Value, Error> {
        let url = self.resolve_url(resource);
        if let Some(body) = self.cached(&url, use_cache)? {
            return Ok(body);
        }

        let query = self.query(namespace, params);
        let reply = self.fetch_with_retry(&url, &query).await?;
        match reply.body {
            Some(body) => {
                if use_cache {
                    self.cache.put(&url, &body)?;
                }
                Ok(body)
            }
            None => Err(Error::Api {
                status: reply.status,
                url,
                body: reply.text,
            }),
        }
    }

    /// Cached fetch from the static namespace.
    pub async fn get_static(&self, resource: &str) -> Result<Value, Error> {
        self.get(resource, Namespace::Static, &[], true).await
    }

    // ── Batched fetch ─────────────────────────────────────────────────

    /// Fetch many resources, each tagged with a caller context.
    ///
    /// Cache hits come out first. Misses are issued in batches of
    /// `batch_size`, all in flight at once under the connection cap, and
    /// yielded in completion order. Consecutive batches are spaced by
    /// `batch_spacing_ms`, measured from a batch's first completion.
    ///
    /// A request that exhausts its transport retries ends the stream with
    /// that error.
    pub fn get_many<'a, C: 'a>(
        &'a self,
        requests: Vec<(String, C)>,
        namespace: Namespace,
        use_cache: bool,
    ) -> impl Stream<Item = Result<Fetched<C>, Error>> + 'a {
        try_stream! {
            let mut misses = Vec::new();
            for (resource, context) in requests {
                let url = self.resolve_url(&resource);
                let hit = self.cached(&url, use_cache)?;
                if let Some(body) = hit {
                    yield Fetched { body: Some(body), status: 200, context };
                } else {
                    misses.push((url, context));
                }
            }

            let query = self.query(namespace, &[]);
            let spacing = Duration::from_millis(self.limits.batch_spacing_ms);
            let batch_size = self.limits.batch_size.max(1);
            let total_batches = misses.len().div_ceil(batch_size);
            let mut pending = misses.into_iter();

            for batch_no in 1..=total_batches {
                let batch: Vec<(String, C)> = pending.by_ref().take(batch_size).collect();
                debug!("Batch {}/{}: {} requests", batch_no, total_batches, batch.len());

                let mut window = BatchWindow::new(spacing);
                let mut in_flight: FuturesUnordered<_> = batch
                    .into_iter()
                    .map(|(url, context)| {
                        let query = &query;
                        async move {
                            let reply = self.fetch_with_retry(&url, query).await;
                            (url, context, reply)
                        }
                    })
                    .collect();

                while let Some((url, context, reply)) = in_flight.next().await {
                    window.record_completion();
                    let reply = reply?;
                    let body = if reply.status == 200 { reply.body } else { None };
                    if let (true, Some(body)) = (use_cache, body.as_ref()) {
                        self.cache.put(&url, body)?;
                    }
                    yield Fetched { body, status: reply.status, context };
                }

                if batch_no < total_batches {
                    window.close().await;
                }
            }
        }
    }

    // ── Retry loop ────────────────────────────────────────────────────

    /// Issue a request until it yields something other than a throttling
    /// status. Transport failures (and unreadable 200 bodies) are retried up
    /// to `max_transport_retries` times.
    async fn fetch_with_retry(
        &self,
        url: &str,
        query: &[(String, String)],
    ) -> Result<Reply, Error> {
        let throttle = Duration::from_millis(self.limits.throttle_backoff_ms);
        let backoff = Duration::from_millis(self.limits.transport_backoff_ms);
        let max_retries = self.limits.max_transport_retries;
        let mut failures = 0u32;

        loop {
            let outcome = match self.send_once(url, query).await {
                Ok(resp) => decode_reply(url, resp),
                Err(e) => Err(e),
            };

            match outcome {
                Ok(reply) if reply.status == 429 || reply.status == 500 => {
                    debug!("{} returned {}, retrying in {:?}", url, reply.status, throttle);
                    tokio::time::sleep(throttle).await;
                }
                Ok(reply) => return Ok(reply),
                Err(e) => {
                    failures += 1;
                    if failures > max_retries {
                        warn!("Giving up on {} after {} attempts: {}", url, failures, e);
                        return Err(e);
                    }
                    warn!(
                        "Request to {} failed ({}), retry {}/{} in {:?}",
                        url, e, failures, max_retries, backoff
                    );
                    tokio::time::sleep(backoff).await;
                }
            }
        }
    }

    async fn send_once(&self, url: &str, query: &[(String, String)]) -> Result<RawResponse, Error> {
        let _permit = self
            .connections
            .acquire()
            .await
            .map_err(|e| Error::Other(format!("connection pool closed: {e}")))?;
        self.limiter.wait().await;
        self.transport.get(url, self.token.as_str(), query).await
    }
}

fn decode_reply(url: &str, resp: RawResponse) -> Result<Reply, Error> {
    let text = resp.body_text();
    if resp.status != 200 {
        return Ok(Reply {
            status: resp.status,
            body: None,
            text,
        });
    }
    let body = serde_json::from_slice(&resp.body).map_err(|e| Error::Decode {
        resource: url.to_string(),
        message: format!("response is not JSON: {e}"),
    })?;
    Ok(Reply {
        status: 200,
        body: Some(body),
        text,
    })
}
