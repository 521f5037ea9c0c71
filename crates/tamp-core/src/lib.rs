//! # Tamp Core
//!
//! Core types, traits, and error handling for Tamp.
//!
//! This crate provides the foundational abstractions the compression
//! middleware is built on:
//! - A body type that is either buffered or streaming
//! - Handler and middleware traits
//! - Error types
//! - Response construction helpers

#![forbid(unsafe_code)]
#![warn(
    missing_docs,
    missing_debug_implementations,
    rust_2018_idioms,
    unreachable_pub
)]

pub mod body;
pub mod error;
pub mod handler;
pub mod middleware;
pub mod response;

pub use body::Body;
pub use error::{Error, Result};
pub use handler::Handler;
pub use middleware::{Chain, Middleware, Next};
pub use response::ResponseBuilder;

// Re-export commonly used HTTP types
pub use bytes::Bytes;
pub use http::{Method, Request, Response, StatusCode};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::body::Body;
    pub use crate::error::{Error, Result};
    pub use crate::handler::Handler;
    pub use crate::middleware::{Chain, Middleware, Next};
    pub use crate::response::{responses, ResponseBuilder};
}
