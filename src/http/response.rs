//! HTTP response building module
//!
//! Wraps a located file into a streamed response, plus builders for the
//! small fixed responses. File bodies are lazy, single-pass streams; the
//! whole file is never buffered in memory.

use std::io;

use futures::TryStreamExt;
use http_body_util::combinators::BoxBody;
use http_body_util::{BodyExt, Full, StreamBody};
use hyper::body::{Bytes, Frame};
use hyper::Response;
use tokio::fs::File;
use tokio_util::io::ReaderStream;

use crate::http::mime;
use crate::logger;
use crate::resolve::ContentHandle;

/// Unified body type: either a streamed file or a small in-memory buffer
pub type ResponseBody = BoxBody<Bytes, io::Error>;

const STREAM_CHUNK_SIZE: usize = 64 * 1024;

fn full(data: impl Into<Bytes>) -> ResponseBody {
    Full::new(data.into()).map_err(io::Error::other).boxed()
}

fn empty() -> ResponseBody {
    full(Bytes::new())
}

/// Lazy byte stream over an open file. Dropping the body (client abort)
/// drops the file handle with it.
fn file_stream(file: File) -> ResponseBody {
    let reader = ReaderStream::with_capacity(file, STREAM_CHUNK_SIZE);
    StreamBody::new(reader.map_ok(Frame::data)).boxed()
}

/// Build the response for a resolved file.
///
/// The status comes from the handle (200 for a located resource, 404 for
/// the not-found document). This is a pure wrapping step: nothing is
/// re-opened or re-resolved here. `ETag`/`Cache-Control` headers are only
/// attached to 200 responses.
pub fn file_response(
    handle: ContentHandle,
    etag: Option<&str>,
    is_head: bool,
) -> Response<ResponseBody> {
    let content_type = mime::content_type_for(&handle.path);

    let mut builder = Response::builder()
        .status(handle.status)
        .header("Content-Type", content_type)
        .header("Content-Length", handle.len);

    if let Some(etag) = etag {
        builder = builder
            .header("ETag", etag)
            .header("Cache-Control", "public, max-age=3600");
    }

    let body = if is_head {
        empty()
    } else {
        file_stream(handle.file)
    };

    builder.body(body).unwrap_or_else(|e| {
        log_build_error("file", &e);
        Response::new(empty())
    })
}

/// Build 304 Not Modified response
pub fn build_304_response(etag: &str) -> Response<ResponseBody> {
    Response::builder()
        .status(304)
        .header("ETag", etag)
        .header("Cache-Control", "public, max-age=3600")
        .body(empty())
        .unwrap_or_else(|e| {
            log_build_error("304", &e);
            Response::new(empty())
        })
}

/// Build bare 404 response
///
/// Only used when the resolution sequence is exhausted, meaning the
/// deployed not-found document itself could not be opened.
pub fn build_404_response() -> Response<ResponseBody> {
    Response::builder()
        .status(404)
        .header("Content-Type", "text/plain")
        .body(full("404 Not Found"))
        .unwrap_or_else(|e| {
            log_build_error("404", &e);
            Response::new(full("404 Not Found"))
        })
}

/// Build 405 Method Not Allowed response
pub fn build_405_response() -> Response<ResponseBody> {
    Response::builder()
        .status(405)
        .header("Content-Type", "text/plain")
        .header("Allow", "GET, HEAD, OPTIONS")
        .body(full("405 Method Not Allowed"))
        .unwrap_or_else(|e| {
            log_build_error("405", &e);
            Response::new(full("405 Method Not Allowed"))
        })
}

/// Build OPTIONS response
pub fn build_options_response() -> Response<ResponseBody> {
    Response::builder()
        .status(204)
        .header("Allow", "GET, HEAD, OPTIONS")
        .body(empty())
        .unwrap_or_else(|e| {
            log_build_error("OPTIONS", &e);
            Response::new(empty())
        })
}

/// Log response build error
fn log_build_error(kind: &str, error: &hyper::http::Error) {
    logger::log_error(&format!("Failed to build {kind} response: {error}"));
}
