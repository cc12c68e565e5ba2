//! Request handler module
//!
//! Per-request entry point: validates the method, runs the resolution
//! pipeline, and emits the response.

pub mod router;

// Re-export main entry point
pub use router::handle_request;
