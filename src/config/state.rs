// Application state module
// Read-only per-process state, shared by all requests without synchronization

use std::io;
use std::path::PathBuf;

use super::types::{Config, ContentConfig};

/// Resolved content locations, fixed after startup validation
#[derive(Debug, Clone)]
pub struct ContentPaths {
    /// Content root as configured (may be relative to the working directory)
    pub root: PathBuf,
    /// Canonical form of the root, used for containment checks
    pub canonical_root: PathBuf,
}

/// Application state
///
/// Immutable after startup; every request reads it through a shared `Arc`.
pub struct AppState {
    pub config: Config,
    pub paths: ContentPaths,
}

impl AppState {
    /// Create `AppState`, validating the content deployment.
    ///
    /// Fails when the content root cannot be canonicalized or the not-found
    /// document is missing, so a broken deployment never starts serving.
    pub async fn new(config: Config) -> io::Result<Self> {
        let paths = validate_content(&config.content).await?;
        Ok(Self { config, paths })
    }
}

/// Verify the content root and the guaranteed fallback document exist.
async fn validate_content(content: &ContentConfig) -> io::Result<ContentPaths> {
    let root = PathBuf::from(&content.root);
    let canonical_root = tokio::fs::canonicalize(&root).await.map_err(|e| {
        io::Error::new(
            e.kind(),
            format!("content root '{}' is not accessible: {e}", content.root),
        )
    })?;

    let not_found = canonical_root.join(&content.not_found_file);
    let meta = tokio::fs::metadata(&not_found).await.map_err(|e| {
        io::Error::new(
            e.kind(),
            format!(
                "not-found document '{}' is not readable: {e}",
                not_found.display()
            ),
        )
    })?;
    if !meta.is_file() {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!(
                "not-found document '{}' is not a regular file",
                not_found.display()
            ),
        ));
    }

    Ok(ContentPaths {
        root,
        canonical_root,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn content_config(root: &str) -> ContentConfig {
        ContentConfig {
            root: root.to_string(),
            not_found_file: "404.html".to_string(),
            index_file: "index.html".to_string(),
            default_extension: "html".to_string(),
        }
    }

    #[tokio::test]
    async fn rejects_missing_root() {
        let result = validate_content(&content_config("/definitely/not/a/dir")).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn rejects_missing_not_found_document() {
        let dir = tempfile::tempdir().unwrap();
        let result = validate_content(&content_config(dir.path().to_str().unwrap())).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn accepts_complete_deployment() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("404.html"), "gone").unwrap();
        let paths = validate_content(&content_config(dir.path().to_str().unwrap()))
            .await
            .unwrap();
        assert!(paths.canonical_root.is_absolute());
    }
}
