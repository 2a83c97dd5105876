//! Huginn - caching, rate-limited reverse proxy for a resource API
//!
//! Clients ask for a resource by kind and identifier. Huginn answers from
//! its in-memory cache when it can; otherwise it fetches the resource from
//! the token-authenticated upstream, stores it and returns it. Concurrent
//! misses on the same key share a single upstream call, and every client is
//! held to a per-IP request budget.
//!
//! # Example
//!
//! ```rust,no_run
//! use huginn::{Huginn, RateLimitConfig, ResourceKind};
//!
//! #[tokio::main]
//! async fn main() -> huginn::Result<()> {
//!     let path = Huginn::builder()
//!         .token("your-bot-token")
//!         .rate_limit(RateLimitConfig::new().max_requests(11))
//!         .build()?;
//!
//!     let payload = path
//!         .handle("203.0.113.7", ResourceKind::User, "80351110224678912")
//!         .await?;
//!
//!     println!("{}", String::from_utf8_lossy(&payload));
//!     Ok(())
//! }
//! ```

pub mod cache;
pub mod error;
pub mod gateway;
pub mod limiter;
#[cfg(feature = "server")]
pub mod server;
pub mod telemetry;
pub mod types;
pub mod upstream;

// Re-export main types at crate root
pub use cache::ResourceCache;
pub use error::{HuginnError, Result};
pub use gateway::{FetchPath, Huginn, HuginnBuilder};
pub use limiter::{Decision, RateLimitConfig, RateLimiter};
pub use types::{CacheKey, ResourceKind};
pub use upstream::{HttpFetcher, RemoteFetcher, UpstreamConfig};
