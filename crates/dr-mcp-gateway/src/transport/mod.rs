//! Transports that expose the dispatcher to clients.

pub mod jsonrpc;

#[cfg(feature = "http")]
pub mod http;

pub use jsonrpc::RpcOutcome;

#[cfg(feature = "http")]
pub use http::{build_router, serve, AppState};
