//! Response and request body type
//!
//! A [`Body`] is either fully buffered in memory or streamed frame by frame.
//! Buffered bodies expose their bytes so middleware can inspect and replace
//! them; streaming bodies are opaque and only ever forwarded.

use crate::Error;
use bytes::Bytes;
use futures::{Stream, StreamExt};
use http_body::{Body as HttpBody, Frame, SizeHint};
use http_body_util::{combinators::UnsyncBoxBody, BodyExt, StreamBody};
use std::fmt;
use std::pin::Pin;
use std::task::{Context, Poll};

/// HTTP body used throughout Tamp
pub struct Body {
    kind: Kind,
}

enum Kind {
    Full(Bytes),
    Streaming(UnsyncBoxBody<Bytes, Error>),
}

impl Body {
    /// Create an empty buffered body
    pub fn empty() -> Self {
        Self::full(Bytes::new())
    }

    /// Create a buffered body from bytes
    pub fn full(data: impl Into<Bytes>) -> Self {
        Self {
            kind: Kind::Full(data.into()),
        }
    }

    /// Create a streaming body from a stream of byte chunks
    pub fn from_stream<S, E>(stream: S) -> Self
    where
        S: Stream<Item = std::result::Result<Bytes, E>> + Send + 'static,
        E: Into<Error> + 'static,
    {
        let frames = stream.map(|chunk| -> crate::Result<Frame<Bytes>> {
            chunk.map(Frame::data).map_err(Into::into)
        });
        Self {
            kind: Kind::Streaming(StreamBody::new(frames).boxed_unsync()),
        }
    }

    /// Wrap any other body (for example hyper's `Incoming`) as a streaming body
    pub fn streaming<B>(body: B) -> Self
    where
        B: HttpBody<Data = Bytes> + Send + 'static,
        B::Error: Into<Error>,
    {
        Self {
            kind: Kind::Streaming(body.map_err(|e| -> Error { e.into() }).boxed_unsync()),
        }
    }

    /// Whether the body is produced incrementally rather than buffered
    pub fn is_streaming(&self) -> bool {
        matches!(self.kind, Kind::Streaming(_))
    }

    /// Buffered bytes, or `None` for streaming bodies
    pub fn as_bytes(&self) -> Option<&Bytes> {
        match &self.kind {
            Kind::Full(bytes) => Some(bytes),
            Kind::Streaming(_) => None,
        }
    }

    /// Length of a buffered body
    pub fn len(&self) -> Option<usize> {
        self.as_bytes().map(Bytes::len)
    }

    /// Whether a buffered body is empty (streaming bodies are never considered empty)
    pub fn is_empty(&self) -> bool {
        self.len() == Some(0)
    }

    /// Read the whole body into memory
    pub async fn into_bytes(self) -> crate::Result<Bytes> {
        match self.kind {
            Kind::Full(bytes) => Ok(bytes),
            Kind::Streaming(body) => Ok(body.collect().await?.to_bytes()),
        }
    }
}

impl Default for Body {
    fn default() -> Self {
        Self::empty()
    }
}

impl fmt::Debug for Body {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            Kind::Full(bytes) => f.debug_struct("Body").field("len", &bytes.len()).finish(),
            Kind::Streaming(_) => f.debug_struct("Body").field("streaming", &true).finish(),
        }
    }
}

impl From<Bytes> for Body {
    fn from(data: Bytes) -> Self {
        Self::full(data)
    }
}

impl From<Vec<u8>> for Body {
    fn from(data: Vec<u8>) -> Self {
        Self::full(data)
    }
}

impl From<String> for Body {
    fn from(data: String) -> Self {
        Self::full(data)
    }
}

impl From<&'static str> for Body {
    fn from(data: &'static str) -> Self {
        Self::full(data)
    }
}

impl From<&'static [u8]> for Body {
    fn from(data: &'static [u8]) -> Self {
        Self::full(data)
    }
}

impl HttpBody for Body {
    type Data = Bytes;
    type Error = Error;

    fn poll_frame(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<std::result::Result<Frame<Self::Data>, Self::Error>>> {
        match &mut self.get_mut().kind {
            Kind::Full(bytes) => {
                if bytes.is_empty() {
                    Poll::Ready(None)
                } else {
                    Poll::Ready(Some(Ok(Frame::data(std::mem::take(bytes)))))
                }
            }
            Kind::Streaming(body) => Pin::new(body).poll_frame(cx),
        }
    }

    fn is_end_stream(&self) -> bool {
        match &self.kind {
            Kind::Full(bytes) => bytes.is_empty(),
            Kind::Streaming(body) => body.is_end_stream(),
        }
    }

    fn size_hint(&self) -> SizeHint {
        match &self.kind {
            Kind::Full(bytes) => SizeHint::with_exact(bytes.len() as u64),
            Kind::Streaming(body) => body.size_hint(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::stream;

    #[test]
    fn test_full_body() {
        let body = Body::from("hello");
        assert!(!body.is_streaming());
        assert_eq!(body.len(), Some(5));
        assert_eq!(body.as_bytes().unwrap(), &Bytes::from_static(b"hello"));
        assert_eq!(HttpBody::size_hint(&body).exact(), Some(5));
    }

    #[test]
    fn test_empty_body() {
        let body = Body::empty();
        assert!(body.is_empty());
        assert!(HttpBody::is_end_stream(&body));
    }

    #[tokio::test]
    async fn test_streaming_body() {
        let chunks = vec![
            Ok::<_, Error>(Bytes::from_static(b"hel")),
            Ok(Bytes::from_static(b"lo")),
        ];
        let body = Body::from_stream(stream::iter(chunks));

        assert!(body.is_streaming());
        assert!(body.as_bytes().is_none());
        assert_eq!(body.len(), None);
        assert!(!body.is_empty());

        let collected = body.into_bytes().await.unwrap();
        assert_eq!(collected, Bytes::from_static(b"hello"));
    }

    #[tokio::test]
    async fn test_full_body_collects_once() {
        let body = Body::from(vec![1u8, 2, 3]);
        let collected = body.collect().await.unwrap().to_bytes();
        assert_eq!(&collected[..], &[1, 2, 3]);
    }

    #[tokio::test]
    async fn test_streaming_error_propagates() {
        let chunks = vec![
            Ok(Bytes::from_static(b"partial")),
            Err(Error::Generic("connection reset".to_string())),
        ];
        let body = Body::from_stream(stream::iter(chunks));
        assert!(body.into_bytes().await.is_err());
    }
}
