//! Request path resolution module
//!
//! Turns a raw URL path into an open, readable file plus a status code,
//! in three stages: normalize the path, derive an ordered candidate
//! sequence, then open the first candidate that resolves.

pub mod candidates;
pub mod locator;
pub mod normalize;

// Re-export the pipeline types
pub use candidates::Candidate;
pub use locator::ContentHandle;
pub use normalize::RequestPath;
