//! All data types used by the gateway.

pub mod capabilities;
pub mod envelope;
pub mod error;
pub mod message;
pub mod request;
pub mod response;

// Re-export commonly used types for convenience.
pub use capabilities::*;
pub use envelope::*;
pub use error::*;
pub use message::*;
pub use request::*;
pub use response::*;
