//! D&R MCP gateway: authenticated, session-scoped tool calls over legal
//! case, event and lead records.
//!
//! A [`Dispatcher`] checks the shared secret, routes each call to its
//! session's [`ProtocolEngine`](protocol::ProtocolEngine) and returns a
//! transport-agnostic outcome. The HTTP transport renders it either as the
//! native reply envelope or as MCP JSON-RPC.

pub mod auth;
pub mod config;
pub mod dispatch;
pub mod protocol;
pub mod session;
pub mod tools;
pub mod transport;
pub mod types;

pub use auth::AuthGate;
pub use config::ServerConfig;
pub use dispatch::{Dispatched, Dispatcher};
pub use protocol::ProtocolEngine;
pub use session::{Session, SessionStore};
pub use tools::ToolRegistry;
