//! Configuration for compression middleware

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeSet;
use tamp_core::{Error, Result};

/// Highest level accepted by gzip and zlib
pub const MAX_LEVEL: u32 = 9;

/// MIME types compressed when nothing else is configured
pub const DEFAULT_MIMETYPES: &[&str] = &[
    "text/html",
    "text/css",
    "text/xml",
    "text/plain",
    "application/json",
    "application/javascript",
];

/// Compression configuration
///
/// Built once when the middleware is constructed and shared read-only between
/// all requests afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompressionConfig {
    /// Content types (without parameters) eligible for compression
    #[serde(
        default = "default_mimetypes",
        deserialize_with = "deserialize_mimetypes"
    )]
    pub compress_mimetypes: BTreeSet<String>,

    /// Compression level (0-9, higher = better compression but slower)
    #[serde(default = "default_level")]
    pub compress_level: u32,

    /// Minimum response size to compress (in bytes)
    #[serde(default = "default_min_size")]
    pub compress_min_size: usize,

    /// Size of the compression worker pool (`None` or 0 = number of CPUs)
    #[serde(default)]
    pub max_threads: Option<usize>,
}

impl Default for CompressionConfig {
    fn default() -> Self {
        Self {
            compress_mimetypes: default_mimetypes(),
            compress_level: default_level(),
            compress_min_size: default_min_size(),
            max_threads: None,
        }
    }
}

fn default_mimetypes() -> BTreeSet<String> {
    DEFAULT_MIMETYPES.iter().map(|m| m.to_string()).collect()
}

fn default_level() -> u32 {
    6
}

fn default_min_size() -> usize {
    500
}

fn deserialize_mimetypes<'de, D>(deserializer: D) -> std::result::Result<BTreeSet<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Vec::<String>::deserialize(deserializer)?;
    Ok(normalize_mimetypes(raw))
}

fn normalize_mimetypes<I, S>(mimetypes: I) -> BTreeSet<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    mimetypes
        .into_iter()
        .map(|m| m.as_ref().trim().to_ascii_lowercase())
        .filter(|m| !m.is_empty())
        .collect()
}

/// Strip parameters such as `; charset=utf-8` from a content type
pub fn essence(content_type: &str) -> &str {
    content_type.split(';').next().unwrap_or_default().trim()
}

impl CompressionConfig {
    /// Replace the set of eligible MIME types
    pub fn with_mimetypes<I, S>(mut self, mimetypes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.compress_mimetypes = normalize_mimetypes(mimetypes);
        self
    }

    /// Set the compression level
    pub fn with_level(mut self, level: u32) -> Self {
        self.compress_level = level;
        self
    }

    /// Set the minimum body size
    pub fn with_min_size(mut self, min_size: usize) -> Self {
        self.compress_min_size = min_size;
        self
    }

    /// Set the worker pool size
    pub fn with_max_threads(mut self, max_threads: usize) -> Self {
        self.max_threads = Some(max_threads);
        self
    }

    /// Check if a content type should be compressed
    ///
    /// Parameters after `;` are ignored and the comparison is case-insensitive.
    pub fn is_eligible_mimetype(&self, content_type: &str) -> bool {
        let mime = essence(content_type).to_ascii_lowercase();
        self.compress_mimetypes.contains(&mime)
    }

    /// Check if a body of `size` bytes is large enough to compress
    pub fn meets_min_size(&self, size: usize) -> bool {
        size >= self.compress_min_size
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.compress_level > MAX_LEVEL {
            return Err(Error::Config(format!(
                "compress_level must be between 0 and {MAX_LEVEL}, got {}",
                self.compress_level
            )));
        }

        if self.compress_mimetypes.is_empty() {
            return Err(Error::Config(
                "compress_mimetypes cannot be empty".to_string(),
            ));
        }

        if let Some(bad) = self.compress_mimetypes.iter().find(|m| !m.contains('/')) {
            return Err(Error::Config(format!("Invalid MIME type: {bad}")));
        }

        Ok(())
    }
}
