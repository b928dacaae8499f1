//! Payment proxy: virtual card issuing with acknowledged webhook delivery.
//!
//! ```text
//! caller --POST /proxy--> issuer --outcome--> Courier --POST--> webhook
//!                                                ^                 |
//!                                                |__ POST /ack ____|
//! ```
//!
//! The caller gets its answer as soon as the issuer does; delivery to the
//! webhook continues in the background until the consumer ACKs it by
//! payment id or attempts run out.

pub mod config;
pub mod error;
pub mod routes;
pub mod state;

pub use config::{Args, IssuerMode, ProxyConfig};
pub use error::{ProxyError, ProxyResult};
pub use routes::DELIVERY_ID_HEADER;
pub use state::AppState;

use axum::routing::{get, post};
use axum::Router;
use std::future::Future;
use tokio::net::TcpListener;

/// Build the HTTP router.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/proxy", post(routes::proxy))
        .route("/ack", post(routes::ack))
        .route("/health", get(routes::health))
        .with_state(state)
}

/// Serve until `shutdown` resolves. In-flight delivery jobs are abandoned
/// when the runtime stops.
pub async fn serve<F>(listener: TcpListener, state: AppState, shutdown: F) -> ProxyResult<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(shutdown)
        .await?;
    Ok(())
}
