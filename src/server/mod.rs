//! Server module
//!
//! TCP listener setup and per-connection handling. The resolution core
//! never blocks here; each connection runs on its own spawned task.

pub mod connection;
pub mod listener;

// Re-export commonly used entry points
pub use connection::accept_connection;
pub use listener::create_listener;
