//! Session management: the live-session store and idle sweeping.

pub mod store;
pub mod sweeper;

pub use store::{Session, SessionStore};
pub use sweeper::spawn_idle_sweeper;
