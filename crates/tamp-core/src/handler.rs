//! Request handler abstraction
//!
//! Anything that turns a request into a response is a [`Handler`]: plain async
//! functions and closures get an implementation for free, and structs can
//! implement the trait directly when the handler is a method that needs
//! access to `self`.

use crate::{Body, Result};
use async_trait::async_trait;
use http::{Request, Response};
use std::future::Future;

/// An asynchronous request handler
#[async_trait]
pub trait Handler: Send + Sync + 'static {
    /// Handle a request and produce a response
    async fn call(&self, req: Request<Body>) -> Result<Response<Body>>;
}

#[async_trait]
impl<F, Fut> Handler for F
where
    F: Fn(Request<Body>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Response<Body>>> + Send,
{
    async fn call(&self, req: Request<Body>) -> Result<Response<Body>> {
        (self)(req).await
    }
}
