//! Content locator module
//!
//! Opens candidates in order and returns the first readable handle.
//! Individual misses are expected and absorbed silently; only a sequence
//! where even the not-found document fails produces an error, which
//! signals a misconfigured deployment rather than a bad request.

use std::io;
use std::path::PathBuf;
use std::time::SystemTime;

use hyper::StatusCode;
use tokio::fs::File;

use crate::config::ContentPaths;
use crate::logger;
use crate::resolve::candidates::Candidate;

/// An open, readable file bound to one resolved location.
///
/// Owned by the response for the duration of one transfer; dropping it on
/// any exit path (completion or client abort) closes the file.
#[derive(Debug)]
pub struct ContentHandle {
    pub file: File,
    pub len: u64,
    pub modified: Option<SystemTime>,
    /// Canonical path of the resolved file, used for MIME detection
    pub path: PathBuf,
    pub status: StatusCode,
}

/// Try each candidate in order, returning the first that opens.
///
/// A candidate is skipped when it does not exist, is not a regular file,
/// cannot be opened, or canonicalizes to a location outside the content
/// root. Errors only when every candidate failed, including the
/// guaranteed not-found document.
pub async fn locate(paths: &ContentPaths, sequence: &[Candidate]) -> io::Result<ContentHandle> {
    for candidate in sequence {
        let joined = paths.root.join(&candidate.rel_path);

        // Misses are deterministic and common; no logging, no retry.
        let Ok(real) = tokio::fs::canonicalize(&joined).await else {
            continue;
        };
        if !real.starts_with(&paths.canonical_root) {
            logger::log_warning(&format!(
                "Blocked access outside content root: {} -> {}",
                candidate.rel_path.display(),
                real.display()
            ));
            continue;
        }

        let Ok(file) = File::open(&real).await else {
            continue;
        };
        let Ok(meta) = file.metadata().await else {
            continue;
        };
        if !meta.is_file() {
            continue;
        }

        return Ok(ContentHandle {
            len: meta.len(),
            modified: meta.modified().ok(),
            file,
            path: real,
            status: candidate.status,
        });
    }

    Err(io::Error::new(
        io::ErrorKind::NotFound,
        "no candidate could be opened, including the not-found document",
    ))
}
