//! Battle.net API client library.
//!
//! Provides token acquisition, a disk-backed response cache, and single or
//! batched resource fetches with connection capping, batch pacing and retry.

pub mod auth;
pub mod cache;
pub mod rate_limit;
pub mod rest;
pub mod transport;

#[cfg(any(test, feature = "test-support"))]
pub mod fake;

pub use auth::AccessToken;
pub use cache::DiskCache;
pub use rate_limit::{BatchWindow, RateLimiter};
pub use rest::{BnetClient, Fetched, Namespace};
pub use transport::{HttpTransport, RawResponse, Transport};
