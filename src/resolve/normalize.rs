//! Request path normalization module
//!
//! Percent-decodes the raw URL path and reduces it to a safe relative path.
//! Traversal attempts fail closed: the caller falls through to the
//! not-found document and the filesystem is never touched with the input.

use percent_encoding::percent_decode_str;

/// A sanitized request path, relative to the content root.
///
/// Guaranteed free of `.`/`..` segments and separator tricks. Created fresh
/// per request and discarded after candidate generation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestPath {
    rel: String,
}

impl RequestPath {
    /// Slash-joined relative path ("" for the site root)
    pub fn as_str(&self) -> &str {
        &self.rel
    }

    /// True for a request of `/` (or an equivalent like `//` or `/./`)
    pub fn is_root(&self) -> bool {
        self.rel.is_empty()
    }

    /// Whether the final segment already carries a file extension
    pub fn has_extension(&self) -> bool {
        self.rel
            .rsplit('/')
            .next()
            .is_some_and(|segment| segment.contains('.'))
    }
}

/// Decode and sanitize a raw URL path.
///
/// Returns `None` when the path cannot be made safe: invalid percent
/// encoding, embedded NUL, backslash separators, or any `..` segment.
pub fn normalize(raw: &str) -> Option<RequestPath> {
    let decoded = percent_decode_str(raw).decode_utf8().ok()?;
    if decoded.contains('\0') {
        return None;
    }

    let mut segments: Vec<&str> = Vec::new();
    for segment in decoded.split('/') {
        match segment {
            // Empty segments (leading slash, doubled slashes) and `.` carry
            // no meaning; drop them instead of rejecting the request.
            "" | "." => {}
            ".." => return None,
            s if s.contains('\\') => return None,
            s => segments.push(s),
        }
    }

    Some(RequestPath {
        rel: segments.join("/"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_leading_slash() {
        let path = normalize("/about").unwrap();
        assert_eq!(path.as_str(), "about");
    }

    #[test]
    fn root_path_is_empty() {
        assert!(normalize("/").unwrap().is_root());
        assert!(normalize("//").unwrap().is_root());
        assert!(normalize("/./").unwrap().is_root());
    }

    #[test]
    fn collapses_redundant_segments() {
        let path = normalize("/blog//posts/./first").unwrap();
        assert_eq!(path.as_str(), "blog/posts/first");
    }

    #[test]
    fn percent_decodes() {
        let path = normalize("/my%20page").unwrap();
        assert_eq!(path.as_str(), "my page");
    }

    #[test]
    fn rejects_traversal() {
        assert!(normalize("/../../etc/passwd").is_none());
        assert!(normalize("/blog/../../secret").is_none());
        assert!(normalize("/%2e%2e/escape").is_none());
    }

    #[test]
    fn rejects_backslash_and_nul() {
        assert!(normalize("/a%5Cb").is_none());
        assert!(normalize("/a%00b").is_none());
    }

    #[test]
    fn rejects_invalid_utf8() {
        assert!(normalize("/%ff%fe").is_none());
    }

    #[test]
    fn extension_detection() {
        assert!(normalize("/style.css").unwrap().has_extension());
        assert!(normalize("/blog/post.html").unwrap().has_extension());
        assert!(!normalize("/about").unwrap().has_extension());
        assert!(!normalize("/blog.d/post").unwrap().has_extension());
    }
}
