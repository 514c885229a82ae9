//! In-memory transport for tests.
//!
//! Routes are keyed by URL path. Each route holds a script of replies; the
//! last reply repeats once the script is exhausted. Unknown paths answer 404.

use std::collections::{HashMap, VecDeque};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use common::{Error, FetchLimits, Region};
use serde_json::Value;
use tokio::time::Instant;

use crate::auth::AccessToken;
use crate::cache::DiskCache;
use crate::rest::BnetClient;
use crate::transport::{RawResponse, Transport};

#[derive(Debug, Clone)]
pub enum FakeReply {
    Status(u16, Vec<u8>),
    /// Transport-level failure.
    Fail(String),
}

impl FakeReply {
    pub fn json(value: Value) -> Self {
        FakeReply::Status(200, value.to_string().into_bytes())
    }

    pub fn status(status: u16) -> Self {
        FakeReply::Status(status, format!("status {status}").into_bytes())
    }

    pub fn fail(message: &str) -> Self {
        FakeReply::Fail(message.to_string())
    }
}

#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub path: String,
    pub query: Vec<(String, String)>,
    pub bearer: String,
    pub started: Instant,
}

#[derive(Default)]
struct FakeState {
    routes: HashMap<String, VecDeque<FakeReply>>,
    delays: HashMap<String, Duration>,
    default_delay: Duration,
    requests: Vec<RecordedRequest>,
    in_flight: usize,
    peak_in_flight: usize,
}

#[derive(Clone, Default)]
pub struct FakeTransport {
    inner: Arc<Mutex<FakeState>>,
}

impl FakeTransport {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, FakeState> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Answer `path` with `value` (status 200) forever.
    pub fn route_json(&self, path: &str, value: Value) -> &Self {
        self.route(path, vec![FakeReply::json(value)])
    }

    /// Answer `path` with the given script.
    pub fn route(&self, path: &str, replies: Vec<FakeReply>) -> &Self {
        self.state()
            .routes
            .insert(path.to_string(), replies.into_iter().collect());
        self
    }

    pub fn delay(&self, path: &str, delay: Duration) -> &Self {
        self.state().delays.insert(path.to_string(), delay);
        self
    }

    pub fn default_delay(&self, delay: Duration) -> &Self {
        self.state().default_delay = delay;
        self
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state().requests.clone()
    }

    pub fn request_count(&self, path: &str) -> usize {
        self.state().requests.iter().filter(|r| r.path == path).count()
    }

    pub fn peak_in_flight(&self) -> usize {
        self.state().peak_in_flight
    }
}

fn path_of(url: &str) -> String {
    match url::Url::parse(url) {
        Ok(parsed) => parsed.path().to_string(),
        Err(_) => url.to_string(),
    }
}

#[async_trait]
impl Transport for FakeTransport {
    async fn get(
        &self,
        url: &str,
        bearer: &str,
        query: &[(String, String)],
    ) -> Result<RawResponse, Error> {
        let path = path_of(url);
        let (reply, delay) = {
            let mut state = self.state();
            state.requests.push(RecordedRequest {
                path: path.clone(),
                query: query.to_vec(),
                bearer: bearer.to_string(),
                started: Instant::now(),
            });
            state.in_flight += 1;
            state.peak_in_flight = state.peak_in_flight.max(state.in_flight);

            let reply = match state.routes.get_mut(&path) {
                Some(script) if script.len() > 1 => script.pop_front(),
                Some(script) => script.front().cloned(),
                None => None,
            }
            .unwrap_or_else(|| FakeReply::Status(404, b"not found".to_vec()));
            let delay = state
                .delays
                .get(&path)
                .copied()
                .unwrap_or(state.default_delay);
            (reply, delay)
        };

        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        self.state().in_flight -= 1;

        match reply {
            FakeReply::Status(status, body) => Ok(RawResponse { status, body }),
            FakeReply::Fail(message) => Err(Error::Http(message)),
        }
    }
}

/// Default limits with the request quota disabled.
pub fn test_limits() -> FetchLimits {
    FetchLimits {
        requests_per_second: 0,
        ..FetchLimits::default()
    }
}

/// A US-region client over `transport` caching into `cache_dir`.
pub fn client(transport: &FakeTransport, cache_dir: &Path) -> BnetClient {
    client_with_limits(transport, cache_dir, test_limits())
}

pub fn client_with_limits(
    transport: &FakeTransport,
    cache_dir: &Path,
    limits: FetchLimits,
) -> BnetClient {
    let cache = DiskCache::new(cache_dir, Region::Us)
        .unwrap_or_else(|e| panic!("cannot open test cache: {e}"));
    BnetClient::with_transport(
        transport.clone(),
        AccessToken::new("test-token"),
        Region::Us,
        cache,
        limits,
    )
}
