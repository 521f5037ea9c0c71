//! Core compression functionality

use bytes::Bytes;
use flate2::write::{GzEncoder, ZlibEncoder};
use flate2::Compression;
use std::fmt;
use std::io::Write;
use tamp_core::{Error, Result};

use crate::config::MAX_LEVEL;

/// Supported content encodings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Encoding {
    /// gzip container around deflate
    Gzip,
    /// zlib container around deflate (HTTP `deflate`)
    Deflate,
}

impl Encoding {
    /// Get the Content-Encoding header value
    pub fn content_encoding(&self) -> &'static str {
        match self {
            Self::Gzip => "gzip",
            Self::Deflate => "deflate",
        }
    }

    /// Pick an encoding from a lower-cased Accept-Encoding value
    ///
    /// `gzip` wins over `deflate`; each is honoured on its own. Tokens are
    /// matched as substrings, so quality values are not interpreted.
    pub fn negotiate(accept_encoding: &str) -> Option<Self> {
        if accept_encoding.contains("gzip") {
            Some(Self::Gzip)
        } else if accept_encoding.contains("deflate") {
            Some(Self::Deflate)
        } else {
            None
        }
    }
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.content_encoding())
    }
}

impl std::str::FromStr for Encoding {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "gzip" => Ok(Self::Gzip),
            "deflate" => Ok(Self::Deflate),
            other => Err(Error::Config(format!("Unsupported encoding: {other}"))),
        }
    }
}

/// Compressor for response bodies
#[derive(Debug)]
pub struct Compressor;

impl Compressor {
    /// Compress data using the specified encoding and level
    pub fn compress(data: &[u8], encoding: Encoding, level: u32) -> Result<Bytes> {
        let level = Compression::new(level.min(MAX_LEVEL));
        let compressed = match encoding {
            Encoding::Gzip => {
                let mut encoder = GzEncoder::new(Vec::with_capacity(data.len() / 2), level);
                encoder.write_all(data).map_err(Error::compression)?;
                encoder.finish().map_err(Error::compression)?
            }
            Encoding::Deflate => {
                let mut encoder = ZlibEncoder::new(Vec::with_capacity(data.len() / 2), level);
                encoder.write_all(data).map_err(Error::compression)?;
                encoder.finish().map_err(Error::compression)?
            }
        };
        Ok(Bytes::from(compressed))
    }
}
