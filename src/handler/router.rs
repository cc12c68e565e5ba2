//! Request dispatch module
//!
//! Glues the resolution pipeline into one request/response cycle:
//! normalize the path, derive candidates, locate content, emit. Stateless
//! apart from the shared read-only `AppState`; identical requests yield
//! identical responses.

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use hyper::{Method, Request, Response, StatusCode, Version};

use crate::config::AppState;
use crate::http::{self, cache, ResponseBody};
use crate::logger::{self, AccessLogEntry};
use crate::resolve::{candidates, locator, normalize};

/// Main entry point for HTTP request handling
pub async fn handle_request(
    req: Request<hyper::body::Incoming>,
    state: Arc<AppState>,
    peer_addr: SocketAddr,
) -> Result<Response<ResponseBody>, Infallible> {
    let started = Instant::now();
    let method = req.method().clone();
    // Query and fragment are ignored; only the path drives resolution.
    let path = req.uri().path().to_string();

    let response = match method {
        Method::GET | Method::HEAD => {
            let is_head = method == Method::HEAD;
            let if_none_match = header_string(&req, "if-none-match");
            serve_content(&path, if_none_match.as_deref(), is_head, &state).await
        }
        Method::OPTIONS => http::build_options_response(),
        _ => {
            logger::log_warning(&format!("Method not allowed: {method}"));
            http::build_405_response()
        }
    };

    if state.config.logging.access_log {
        let entry = access_entry(&req, &response, peer_addr, &method, &path, started);
        logger::log_access(&entry, &state.config.logging.access_log_format);
    }

    Ok(response)
}

/// Resolve a request path and wrap the result into a response.
///
/// Paths that fail normalization (traversal, bad encoding) are never
/// granted filesystem access; they fall straight through to the
/// not-found document.
pub async fn serve_content(
    path: &str,
    if_none_match: Option<&str>,
    is_head: bool,
    state: &AppState,
) -> Response<ResponseBody> {
    let content = &state.config.content;

    let sequence = match normalize::normalize(path) {
        Some(request) => candidates::sequence(&request, content),
        None => {
            logger::log_warning(&format!("Path rejected by normalization: {path}"));
            candidates::fallback_only(content)
        }
    };

    match locator::locate(&state.paths, &sequence).await {
        Ok(handle) => {
            if handle.status == StatusCode::OK {
                let etag = cache::metadata_etag(handle.len, handle.modified);
                if cache::check_etag_match(if_none_match, &etag) {
                    return http::build_304_response(&etag);
                }
                http::file_response(handle, Some(&etag), is_head)
            } else {
                http::file_response(handle, None, is_head)
            }
        }
        Err(e) => {
            // The guaranteed fallback itself failed to open. The deployment
            // is broken; answer minimally and make noise in the error log.
            logger::log_error(&format!("Resolution exhausted for '{path}': {e}"));
            http::build_404_response()
        }
    }
}

fn header_string(req: &Request<hyper::body::Incoming>, name: &str) -> Option<String> {
    req.headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(ToString::to_string)
}

fn access_entry(
    req: &Request<hyper::body::Incoming>,
    response: &Response<ResponseBody>,
    peer_addr: SocketAddr,
    method: &Method,
    path: &str,
    started: Instant,
) -> AccessLogEntry {
    let mut entry = AccessLogEntry::new(
        peer_addr.ip().to_string(),
        method.to_string(),
        path.to_string(),
    );
    entry.query = req.uri().query().map(ToString::to_string);
    entry.http_version = version_label(req.version()).to_string();
    entry.status = response.status().as_u16();
    entry.body_bytes = response
        .headers()
        .get("Content-Length")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse().ok())
        .unwrap_or(0);
    entry.referer = header_string(req, "referer");
    entry.user_agent = header_string(req, "user-agent");
    entry.request_time_us = u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX);
    entry
}

fn version_label(version: Version) -> &'static str {
    match version {
        Version::HTTP_10 => "1.0",
        Version::HTTP_2 => "2",
        _ => "1.1",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Config, ContentConfig, LoggingConfig, PerformanceConfig, ServerConfig};
    use http_body_util::BodyExt;
    use tempfile::TempDir;

    fn test_config(root: &str) -> Config {
        Config {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 0,
                workers: None,
            },
            content: ContentConfig {
                root: root.to_string(),
                not_found_file: "404.html".to_string(),
                index_file: "index.html".to_string(),
                default_extension: "html".to_string(),
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                access_log: false,
                access_log_format: "common".to_string(),
                access_log_file: None,
                error_log_file: None,
            },
            performance: PerformanceConfig {
                keep_alive_timeout: 75,
                read_timeout: 30,
                write_timeout: 30,
                max_connections: None,
            },
        }
    }

    async fn site() -> (TempDir, AppState) {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("404.html"), "not here").unwrap();
        std::fs::write(dir.path().join("index.html"), "home").unwrap();
        std::fs::write(dir.path().join("about.html"), "about us").unwrap();
        std::fs::write(dir.path().join("a.html"), "a page").unwrap();
        std::fs::create_dir(dir.path().join("a")).unwrap();
        std::fs::write(dir.path().join("a/index.html"), "a index").unwrap();
        std::fs::create_dir(dir.path().join("blog")).unwrap();
        std::fs::write(dir.path().join("blog/index.html"), "posts").unwrap();

        let state = AppState::new(test_config(dir.path().to_str().unwrap()))
            .await
            .unwrap();
        (dir, state)
    }

    async fn body_of(response: Response<ResponseBody>) -> String {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn exact_file_returns_200() {
        let (_dir, state) = site().await;
        let response = serve_content("/about.html", None, false, &state).await;
        assert_eq!(response.status(), 200);
        assert_eq!(body_of(response).await, "about us");
    }

    #[tokio::test]
    async fn extensionless_path_completes_to_html() {
        let (_dir, state) = site().await;
        let response = serve_content("/about", None, false, &state).await;
        assert_eq!(response.status(), 200);
        assert_eq!(body_of(response).await, "about us");
    }

    #[tokio::test]
    async fn directory_serves_its_index() {
        let (_dir, state) = site().await;
        let response = serve_content("/blog", None, false, &state).await;
        assert_eq!(response.status(), 200);
        assert_eq!(body_of(response).await, "posts");
    }

    #[tokio::test]
    async fn html_candidate_beats_directory_index() {
        let (_dir, state) = site().await;
        let response = serve_content("/a", None, false, &state).await;
        assert_eq!(body_of(response).await, "a page");
    }

    #[tokio::test]
    async fn root_serves_site_index() {
        let (_dir, state) = site().await;
        let response = serve_content("/", None, false, &state).await;
        assert_eq!(response.status(), 200);
        assert_eq!(body_of(response).await, "home");
    }

    #[tokio::test]
    async fn missing_resource_serves_not_found_document() {
        let (_dir, state) = site().await;
        let response = serve_content("/missing", None, false, &state).await;
        assert_eq!(response.status(), 404);
        assert_eq!(body_of(response).await, "not here");
    }

    #[tokio::test]
    async fn traversal_never_escapes_the_root() {
        let (_dir, state) = site().await;
        for path in ["/../../etc/passwd", "/%2e%2e/%2e%2e/etc/passwd", "/..%2fx"] {
            let response = serve_content(path, None, false, &state).await;
            assert_eq!(response.status(), 404);
            assert_eq!(body_of(response).await, "not here");
        }
    }

    #[tokio::test]
    async fn matching_etag_returns_304() {
        let (_dir, state) = site().await;
        let first = serve_content("/about", None, false, &state).await;
        let etag = first.headers().get("ETag").unwrap().to_str().unwrap().to_string();

        let second = serve_content("/about", Some(&etag), false, &state).await;
        assert_eq!(second.status(), 304);
        assert!(body_of(second).await.is_empty());
    }

    #[tokio::test]
    async fn head_omits_body() {
        let (_dir, state) = site().await;
        let response = serve_content("/about", None, true, &state).await;
        assert_eq!(response.status(), 200);
        assert_eq!(response.headers().get("Content-Length").unwrap(), "8");
        assert!(body_of(response).await.is_empty());
    }

    #[tokio::test]
    async fn concurrent_requests_stay_independent() {
        let (_dir, state) = site().await;
        let state = Arc::new(state);

        let expected = [
            ("/about", "about us"),
            ("/a", "a page"),
            ("/blog", "posts"),
            ("/missing", "not here"),
            ("/", "home"),
        ];

        let mut tasks = Vec::new();
        for _ in 0..20 {
            for (path, want) in expected {
                let state = Arc::clone(&state);
                tasks.push(tokio::spawn(async move {
                    let response = serve_content(path, None, false, &state).await;
                    (want, body_of(response).await)
                }));
            }
        }
        for task in tasks {
            let (want, got) = task.await.unwrap();
            assert_eq!(got, want);
        }
    }

    #[cfg(target_os = "linux")]
    #[tokio::test]
    async fn file_handles_are_released() {
        let (_dir, state) = site().await;

        let fd_count = || std::fs::read_dir("/proc/self/fd").unwrap().count();
        let baseline = fd_count();

        for _ in 0..64 {
            // Completed transfer and an aborted one (body dropped unread).
            let done = serve_content("/about", None, false, &state).await;
            let _ = body_of(done).await;
            let aborted = serve_content("/about", None, false, &state).await;
            drop(aborted);
        }

        // Other runtime activity may shift the count slightly, but leaked
        // handles would grow it by dozens.
        assert!(fd_count() < baseline + 10);
    }
}
