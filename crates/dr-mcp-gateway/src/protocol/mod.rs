//! Per-session protocol engine and capability negotiation.

pub mod engine;
pub mod negotiation;

pub use engine::{EngineState, ProtocolEngine};
pub use negotiation::NegotiatedSession;
