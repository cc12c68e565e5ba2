//! Candidate generation module
//!
//! Derives the ordered filesystem locations to try for a request. Order is
//! a hard contract: prefer the exact (or extension-completed) resource,
//! then the path's directory index, then the not-found document. The
//! sequence is never empty and performs no I/O.

use std::path::PathBuf;

use hyper::StatusCode;

use crate::config::ContentConfig;
use crate::resolve::normalize::RequestPath;

/// One filesystem location to try, relative to the content root
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub rel_path: PathBuf,
    /// Status the response carries if this candidate resolves
    pub status: StatusCode,
}

impl Candidate {
    fn page(rel_path: String) -> Self {
        Self {
            rel_path: PathBuf::from(rel_path),
            status: StatusCode::OK,
        }
    }

    fn not_found(content: &ContentConfig) -> Self {
        Self {
            rel_path: PathBuf::from(&content.not_found_file),
            status: StatusCode::NOT_FOUND,
        }
    }
}

/// Build the candidate sequence for a sanitized request path.
pub fn sequence(request: &RequestPath, content: &ContentConfig) -> Vec<Candidate> {
    let mut out = Vec::with_capacity(3);

    if request.is_root() {
        out.push(Candidate::page(content.index_file.clone()));
    } else {
        let rel = request.as_str();
        let exact = if request.has_extension() {
            rel.to_string()
        } else {
            format!("{rel}.{}", content.default_extension)
        };
        out.push(Candidate::page(exact));
        out.push(Candidate::page(format!("{rel}/{}", content.index_file)));
    }

    out.push(Candidate::not_found(content));
    out
}

/// Sequence for requests whose path failed normalization: only the
/// not-found document is ever considered.
pub fn fallback_only(content: &ContentConfig) -> Vec<Candidate> {
    vec![Candidate::not_found(content)]
}
