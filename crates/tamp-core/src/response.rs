//! Response builder and utilities

use crate::{Body, Error, Result};
use bytes::Bytes;
use futures::Stream;
use http::{header, Response, StatusCode};
use serde::Serialize;

/// Response builder for convenient response construction
#[derive(Debug)]
pub struct ResponseBuilder {
    status: StatusCode,
    headers: Vec<(header::HeaderName, String)>,
}

impl ResponseBuilder {
    /// Create a new response builder
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            headers: Vec::new(),
        }
    }

    /// Set a header
    pub fn header(mut self, name: header::HeaderName, value: impl Into<String>) -> Self {
        self.headers.push((name, value.into()));
        self
    }

    /// Set the content type
    pub fn content_type(self, content_type: impl Into<String>) -> Self {
        self.header(header::CONTENT_TYPE, content_type)
    }

    /// Build response with the given body
    pub fn body(self, body: Body) -> Result<Response<Body>> {
        let mut response = Response::builder().status(self.status);

        for (name, value) in self.headers {
            response = response.header(name, value);
        }

        Ok(response.body(body)?)
    }

    /// Build response with empty body
    pub fn build(self) -> Result<Response<Body>> {
        self.body(Body::empty())
    }

    /// Build response with raw bytes
    pub fn bytes(self, data: impl Into<Bytes>) -> Result<Response<Body>> {
        self.body(Body::full(data))
    }

    /// Build response with text body
    pub fn text(self, body: impl Into<String>) -> Result<Response<Body>> {
        self.content_type("text/plain; charset=utf-8")
            .body(Body::from(body.into()))
    }

    /// Build response with HTML body
    pub fn html(self, body: impl Into<String>) -> Result<Response<Body>> {
        self.content_type("text/html; charset=utf-8")
            .body(Body::from(body.into()))
    }

    /// Build response with JSON body
    pub fn json_body<T: Serialize>(self, body: &T) -> Result<Response<Body>> {
        let json = serde_json::to_vec(body)?;
        self.content_type("application/json").body(Body::from(json))
    }

    /// Build response with a streaming body
    pub fn stream<S, E>(self, stream: S) -> Result<Response<Body>>
    where
        S: Stream<Item = std::result::Result<Bytes, E>> + Send + 'static,
        E: Into<Error> + 'static,
    {
        self.body(Body::from_stream(stream))
    }
}

/// Convenience functions for common responses
pub mod responses {
    use super::*;

    /// 200 OK
    pub fn ok() -> ResponseBuilder {
        ResponseBuilder::new(StatusCode::OK)
    }

    /// 403 Forbidden
    pub fn forbidden(message: impl Into<String>) -> Result<Response<Body>> {
        ResponseBuilder::new(StatusCode::FORBIDDEN).text(message)
    }

    /// 404 Not Found
    pub fn not_found(message: impl Into<String>) -> Result<Response<Body>> {
        ResponseBuilder::new(StatusCode::NOT_FOUND).text(message)
    }

    /// 500 Internal Server Error
    pub fn internal_error(message: impl Into<String>) -> Result<Response<Body>> {
        ResponseBuilder::new(StatusCode::INTERNAL_SERVER_ERROR).text(message)
    }

    /// Plain-text response describing an error, with the matching status
    pub fn from_error(error: &Error) -> Result<Response<Body>> {
        ResponseBuilder::new(error.to_status_code()).text(format!("Error: {error}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::stream;

    #[test]
    fn test_response_builder() {
        let response = ResponseBuilder::new(StatusCode::OK)
            .header(header::HeaderName::from_static("x-custom"), "value")
            .text("Hello, World!")
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers().get("x-custom").unwrap(), "value");
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            "text/plain; charset=utf-8"
        );
    }

    #[test]
    fn test_json_response() {
        use serde_json::json;

        let data = json!({
            "message": "success"
        });

        let response = ResponseBuilder::new(StatusCode::OK)
            .json_body(&data)
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            "application/json"
        );
    }

    #[test]
    fn test_stream_response() {
        let chunks = stream::iter(vec![Ok::<_, Error>(Bytes::from_static(b"chunk"))]);
        let response = responses::ok()
            .content_type("text/plain")
            .stream(chunks)
            .unwrap();

        assert!(response.body().is_streaming());
    }

    #[test]
    fn test_error_response() {
        let response = responses::from_error(&Error::NotFound("/nope".to_string())).unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
