//! Response compression middleware for Tamp
//!
//! Compresses buffered handler responses with:
//! - gzip (preferred whenever the client accepts it)
//! - deflate (zlib stream, used when only `deflate` is accepted)
//!
//! Features:
//! - Wraps a single handler or sits in a middleware stack
//! - Content-type allow-list, parameters such as `charset` ignored
//! - Minimum size threshold
//! - Configurable compression level
//! - CPU-bound work offloaded to a bounded worker pool
//! - Automatic Content-Encoding and Content-Length handling

#![forbid(unsafe_code)]
#![warn(
    missing_docs,
    missing_debug_implementations,
    rust_2018_idioms,
    unreachable_pub
)]

pub mod compressor;
pub mod config;
pub mod middleware;
pub mod pool;

pub use compressor::{Compressor, Encoding};
pub use config::CompressionConfig;
pub use middleware::{Compress, Compressed, SkipReason};
pub use pool::CompressionPool;
