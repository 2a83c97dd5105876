//! HTTP service mode.
//!
//! This module provides:
//! - The axum router exposing `GET /user/{id}` and `GET /invite/{code}` (`routes`)
//! - Configuration loading for `huginnd` (`config`)
//!
//! Routing, header plumbing and response mapping live here; every decision
//! about caching, coalescing and admission is made by [`FetchPath`].

pub mod config;
mod routes;

pub use routes::{error_response, router};

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::info;

use crate::FetchPath;

/// Serve `path` on `listener` until `shutdown` resolves.
///
/// Peer addresses are recorded so clients without forwarding headers are
/// still rate limited by IP.
pub async fn serve<F>(listener: TcpListener, path: Arc<FetchPath>, shutdown: F) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    if let Ok(addr) = listener.local_addr() {
        info!(%addr, "listening");
    }
    axum::serve(
        listener,
        router(path).into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown)
    .await
}
