//! Compression middleware implementation

use crate::compressor::Encoding;
use crate::config::{essence, CompressionConfig};
use crate::pool::CompressionPool;
use async_trait::async_trait;
use http::{header, HeaderValue, Request, Response, StatusCode};
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use tamp_core::{Body, Error, Handler, Middleware, Next, Result};
use tracing::{debug, trace};

/// Why a response was passed through uncompressed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// Body is streamed rather than buffered
    Streaming,
    /// Status outside 2xx
    Status(StatusCode),
    /// Handler already applied a content encoding
    AlreadyEncoded,
    /// Content type missing or not in the configured set
    ContentType(Option<String>),
    /// Body shorter than the configured minimum
    TooSmall(usize),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Streaming => f.write_str("streaming body"),
            Self::Status(status) => write!(f, "status {status}"),
            Self::AlreadyEncoded => f.write_str("already encoded"),
            Self::ContentType(Some(ct)) => write!(f, "content type {ct}"),
            Self::ContentType(None) => f.write_str("no content type"),
            Self::TooSmall(len) => write!(f, "body too small ({len} bytes)"),
        }
    }
}

/// Response compression middleware
///
/// Compresses a handler's response with gzip or deflate when:
/// - the client's Accept-Encoding mentions `gzip` or `deflate`
/// - the response is buffered, 2xx, and not already encoded
///   (`Content-Encoding: identity` counts as not encoded)
/// - its Content-Type is one of the configured MIME types
/// - its body is at least `compress_min_size` bytes
///
/// Use [`wrap`](Self::wrap) to decorate a single handler, or put it in a
/// middleware stack in front of many.
#[derive(Debug, Clone)]
pub struct Compress {
    config: Arc<CompressionConfig>,
    pool: Arc<CompressionPool>,
}

impl Compress {
    /// Create a new compression middleware
    pub fn new(config: CompressionConfig) -> Result<Self> {
        config.validate()?;

        let pool = CompressionPool::new(config.max_threads);
        debug!(
            level = config.compress_level,
            min_size = config.compress_min_size,
            mimetypes = ?config.compress_mimetypes,
            workers = pool.size(),
            "Compression middleware configured"
        );

        Ok(Self {
            config: Arc::new(config),
            pool: Arc::new(pool),
        })
    }

    /// The configuration in use
    pub fn config(&self) -> &CompressionConfig {
        &self.config
    }

    /// The worker pool compression jobs run on
    pub fn pool(&self) -> &CompressionPool {
        &self.pool
    }

    /// Decorate `handler` so its responses are compressed
    pub fn wrap<H: Handler>(&self, handler: H) -> Compressed<H> {
        Compressed {
            compress: self.clone(),
            inner: handler,
        }
    }

    /// Check whether a response may be compressed
    ///
    /// Pure function of the response and the configuration, so the same
    /// response always gets the same answer.
    pub fn skip_reason(&self, response: &Response<Body>) -> Option<SkipReason> {
        let Some(len) = response.body().len() else {
            return Some(SkipReason::Streaming);
        };

        if !response.status().is_success() {
            return Some(SkipReason::Status(response.status()));
        }

        let already_encoded = response
            .headers()
            .get(header::CONTENT_ENCODING)
            .is_some_and(|v| !v.as_bytes().eq_ignore_ascii_case(b"identity"));
        if already_encoded {
            return Some(SkipReason::AlreadyEncoded);
        }

        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok());
        match content_type {
            Some(ct) if self.config.is_eligible_mimetype(ct) => {}
            other => {
                return Some(SkipReason::ContentType(other.map(|ct| essence(ct).to_string())))
            }
        }

        if !self.config.meets_min_size(len) {
            return Some(SkipReason::TooSmall(len));
        }

        None
    }

    /// Run `inner` for `req` and compress its response when allowed
    async fn apply<F, Fut>(&self, req: Request<Body>, inner: F) -> Result<Response<Body>>
    where
        F: FnOnce(Request<Body>) -> Fut,
        Fut: Future<Output = Result<Response<Body>>>,
    {
        let Some(encoding) = requested_encoding(&req) else {
            return inner(req).await;
        };

        let response = inner(req).await?;

        if let Some(reason) = self.skip_reason(&response) {
            trace!(%reason, "Response passed through uncompressed");
            return Ok(response);
        }

        self.compress_response(response, encoding).await
    }

    /// Replace the body with its compressed form and fix up the headers
    async fn compress_response(
        &self,
        response: Response<Body>,
        encoding: Encoding,
    ) -> Result<Response<Body>> {
        let (mut parts, body) = response.into_parts();

        let original = body
            .as_bytes()
            .cloned()
            .ok_or_else(|| Error::Internal("Cannot compress a streaming body".to_string()))?;
        let original_size = original.len();

        let compressed = self
            .pool
            .run(original, encoding, self.config.compress_level)
            .await?;

        parts.headers.insert(
            header::CONTENT_ENCODING,
            HeaderValue::from_static(encoding.content_encoding()),
        );
        parts
            .headers
            .insert(header::CONTENT_LENGTH, HeaderValue::from(compressed.len()));
        parts.headers.remove(header::TRANSFER_ENCODING);

        debug!(
            %encoding,
            original_size,
            compressed_size = compressed.len(),
            "Response compressed"
        );

        Ok(Response::from_parts(parts, Body::full(compressed)))
    }
}

impl Default for Compress {
    fn default() -> Self {
        Self {
            config: Arc::new(CompressionConfig::default()),
            pool: Arc::new(CompressionPool::default()),
        }
    }
}

/// Encoding the client asked for, if any
///
/// A missing, empty, or non-ASCII Accept-Encoding means no compression.
fn requested_encoding(req: &Request<Body>) -> Option<Encoding> {
    let accept = req
        .headers()
        .get(header::ACCEPT_ENCODING)
        .and_then(|v| v.to_str().ok())?
        .to_ascii_lowercase();

    if accept.trim().is_empty() {
        return None;
    }

    Encoding::negotiate(&accept)
}

#[async_trait]
impl Middleware for Compress {
    async fn call(&self, req: Request<Body>, next: Next) -> Result<Response<Body>> {
        self.apply(req, |req| next.run(req)).await
    }
}

/// A handler whose responses pass through [`Compress`]
#[derive(Clone)]
pub struct Compressed<H> {
    compress: Compress,
    inner: H,
}

impl<H> Compressed<H> {
    /// The wrapped handler
    pub fn inner(&self) -> &H {
        &self.inner
    }

    /// Unwrap the handler
    pub fn into_inner(self) -> H {
        self.inner
    }
}

impl<H> fmt::Debug for Compressed<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Compressed")
            .field("compress", &self.compress)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl<H: Handler> Handler for Compressed<H> {
    async fn call(&self, req: Request<Body>) -> Result<Response<Body>> {
        self.compress.apply(req, |req| self.inner.call(req)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use flate2::read::{GzDecoder, ZlibDecoder};
    use futures::stream;
    use http::header::{ACCEPT_ENCODING, CONTENT_ENCODING, CONTENT_LENGTH, CONTENT_TYPE};
    use std::io::Read;
    use tamp_core::response::responses;

    fn body_600() -> String {
        "x".repeat(600)
    }

    fn plain_text(body: String) -> Response<Body> {
        Response::builder()
            .status(StatusCode::OK)
            .header(CONTENT_TYPE, "text/plain")
            .body(Body::from(body))
            .unwrap()
    }

    fn request(accept_encoding: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().uri("/test");
        if let Some(value) = accept_encoding {
            builder = builder.header(ACCEPT_ENCODING, value);
        }
        builder.body(Body::empty()).unwrap()
    }

    async fn run(compress: &Compress, accept: Option<&str>, response: Response<Body>) -> Response<Body> {
        compress
            .apply(request(accept), |_req| async move { Ok::<_, Error>(response) })
            .await
            .unwrap()
    }

    fn bytes_of(response: &Response<Body>) -> Bytes {
        response.body().as_bytes().cloned().unwrap()
    }

    #[tokio::test]
    async fn test_gzip_scenario() {
        let compress = Compress::default();
        let response = run(&compress, Some("gzip"), plain_text(body_600())).await;

        assert_eq!(response.headers().get(CONTENT_ENCODING).unwrap(), "gzip");
        let compressed = bytes_of(&response);
        assert!(compressed.len() < 600);
        assert_eq!(
            response.headers().get(CONTENT_LENGTH).unwrap(),
            &compressed.len().to_string()
        );

        let mut decoded = String::new();
        GzDecoder::new(&compressed[..])
            .read_to_string(&mut decoded)
            .unwrap();
        assert_eq!(decoded, body_600());
    }

    #[tokio::test]
    async fn test_deflate_only() {
        let compress = Compress::default();
        let response = run(&compress, Some("deflate"), plain_text(body_600())).await;

        assert_eq!(response.headers().get(CONTENT_ENCODING).unwrap(), "deflate");
        let compressed = bytes_of(&response);
        assert_eq!(
            response.headers().get(CONTENT_LENGTH).unwrap(),
            &compressed.len().to_string()
        );

        let mut decoded = String::new();
        ZlibDecoder::new(&compressed[..])
            .read_to_string(&mut decoded)
            .unwrap();
        assert_eq!(decoded, body_600());
    }

    #[tokio::test]
    async fn test_gzip_preferred_over_deflate() {
        let compress = Compress::default();
        let response = run(&compress, Some("deflate, gzip"), plain_text(body_600())).await;
        assert_eq!(response.headers().get(CONTENT_ENCODING).unwrap(), "gzip");
    }

    #[tokio::test]
    async fn test_accept_encoding_is_case_insensitive() {
        let compress = Compress::default();
        let response = run(&compress, Some("GZip"), plain_text(body_600())).await;
        assert_eq!(response.headers().get(CONTENT_ENCODING).unwrap(), "gzip");
    }

    #[tokio::test]
    async fn test_identity_passthrough() {
        let compress = Compress::default();
        let response = run(&compress, Some("identity"), plain_text(body_600())).await;

        assert!(!response.headers().contains_key(CONTENT_ENCODING));
        assert_eq!(bytes_of(&response), Bytes::from(body_600()));
    }

    #[tokio::test]
    async fn test_missing_or_empty_accept_encoding() {
        let compress = Compress::default();

        let response = run(&compress, None, plain_text(body_600())).await;
        assert!(!response.headers().contains_key(CONTENT_ENCODING));
        assert_eq!(bytes_of(&response).len(), 600);

        let response = run(&compress, Some(""), plain_text(body_600())).await;
        assert!(!response.headers().contains_key(CONTENT_ENCODING));
        assert_eq!(bytes_of(&response).len(), 600);
    }

    #[tokio::test]
    async fn test_below_min_size() {
        let compress = Compress::default();
        let body = "x".repeat(499);
        let response = run(&compress, Some("gzip"), plain_text(body.clone())).await;

        assert!(!response.headers().contains_key(CONTENT_ENCODING));
        assert_eq!(bytes_of(&response), Bytes::from(body));
    }

    #[tokio::test]
    async fn test_ineligible_content_type() {
        let compress = Compress::default();
        let response = Response::builder()
            .header(CONTENT_TYPE, "image/png")
            .body(Body::from(vec![0u8; 2048]))
            .unwrap();

        let response = run(&compress, Some("gzip"), response).await;
        assert!(!response.headers().contains_key(CONTENT_ENCODING));
        assert_eq!(bytes_of(&response).len(), 2048);
    }

    #[tokio::test]
    async fn test_content_type_parameters_ignored() {
        let compress = Compress::default();
        let response = Response::builder()
            .header(CONTENT_TYPE, "text/html; charset=utf-8")
            .body(Body::from(body_600()))
            .unwrap();

        let response = run(&compress, Some("gzip"), response).await;
        assert_eq!(response.headers().get(CONTENT_ENCODING).unwrap(), "gzip");
    }

    #[tokio::test]
    async fn test_error_status_passthrough() {
        let compress = Compress::default();
        let mut response = plain_text(body_600());
        *response.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;

        let response = run(&compress, Some("gzip"), response).await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!response.headers().contains_key(CONTENT_ENCODING));
    }

    #[tokio::test]
    async fn test_streaming_passthrough() {
        let compress = Compress::default();
        let chunks = stream::iter(vec![Ok::<_, Error>(Bytes::from(body_600()))]);
        let response = responses::ok()
            .content_type("text/plain")
            .stream(chunks)
            .unwrap();

        let response = run(&compress, Some("gzip"), response).await;
        assert!(response.body().is_streaming());
        assert!(!response.headers().contains_key(CONTENT_ENCODING));
    }

    #[tokio::test]
    async fn test_already_encoded_passthrough() {
        let compress = Compress::default();
        let mut response = plain_text(body_600());
        response
            .headers_mut()
            .insert(CONTENT_ENCODING, HeaderValue::from_static("br"));

        let response = run(&compress, Some("gzip"), response).await;
        assert_eq!(response.headers().get(CONTENT_ENCODING).unwrap(), "br");
        assert_eq!(bytes_of(&response).len(), 600);
    }

    #[tokio::test]
    async fn test_identity_encoding_is_compressed() {
        let compress = Compress::default();
        let mut response = plain_text(body_600());
        response
            .headers_mut()
            .insert(CONTENT_ENCODING, HeaderValue::from_static("Identity"));

        assert_eq!(compress.skip_reason(&response), None);
        let response = run(&compress, Some("gzip"), response).await;
        assert_eq!(response.headers().get(CONTENT_ENCODING).unwrap(), "gzip");
        assert!(bytes_of(&response).len() < 600);
    }

    #[tokio::test]
    async fn test_handler_errors_propagate() {
        let compress = Compress::default();
        let result = compress
            .apply(request(Some("gzip")), |_req| async {
                Err::<Response<Body>, _>(Error::Handler("boom".to_string()))
            })
            .await;
        assert!(matches!(result, Err(Error::Handler(_))));
    }

    #[test]
    fn test_skip_reason_is_deterministic() {
        let compress = Compress::default();
        let response = plain_text("x".repeat(10));

        let first = compress.skip_reason(&response);
        let second = compress.skip_reason(&response);
        assert_eq!(first, Some(SkipReason::TooSmall(10)));
        assert_eq!(first, second);

        assert_eq!(compress.skip_reason(&plain_text(body_600())), None);
    }

    #[test]
    fn test_skip_reason_missing_content_type() {
        let compress = Compress::default();
        let response = Response::new(Body::from(body_600()));
        assert_eq!(
            compress.skip_reason(&response),
            Some(SkipReason::ContentType(None))
        );
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        let config = CompressionConfig::default().with_level(12);
        assert!(matches!(Compress::new(config), Err(Error::Config(_))));
    }

    #[tokio::test]
    async fn test_as_middleware() {
        let compress = Compress::new(CompressionConfig::default().with_min_size(1)).unwrap();
        let stack: Arc<[Arc<dyn Middleware>]> = Arc::new([Arc::new(compress) as Arc<dyn Middleware>]);
        let next = Next::with_handler(stack, |_req: Request<Body>| async {
            responses::ok().content_type("application/json").bytes(r#"{"ok":true}"#)
        });

        let response = next.run(request(Some("gzip, deflate"))).await.unwrap();
        assert_eq!(response.headers().get(CONTENT_ENCODING).unwrap(), "gzip");
    }

    #[tokio::test]
    async fn test_wrapped_handler() {
        let compress = Compress::new(CompressionConfig::default().with_max_threads(2)).unwrap();
        let handler = compress.wrap(|_req: Request<Body>| async {
            responses::ok().text("y".repeat(1000))
        });

        let response = handler.call(request(Some("deflate"))).await.unwrap();
        assert_eq!(response.headers().get(CONTENT_ENCODING).unwrap(), "deflate");
        assert!(bytes_of(&response).len() < 1000);
    }
}
