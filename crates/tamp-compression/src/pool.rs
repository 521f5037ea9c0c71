//! Bounded worker pool for compression jobs
//!
//! Compression is CPU-bound, so jobs run on tokio's blocking thread pool
//! instead of the async workers. A semaphore caps how many jobs may run at
//! once; requests beyond the cap wait for a permit rather than spawning more
//! threads.

use crate::compressor::{Compressor, Encoding};
use bytes::Bytes;
use std::sync::Arc;
use tamp_core::{Error, Result};
use tokio::sync::Semaphore;

/// Fixed-size pool running compression off the async workers
#[derive(Debug)]
pub struct CompressionPool {
    permits: Arc<Semaphore>,
    size: usize,
}

impl CompressionPool {
    /// Create a pool with `max_threads` slots (`None` or 0 = number of CPUs)
    pub fn new(max_threads: Option<usize>) -> Self {
        let size = match max_threads {
            Some(threads) if threads > 0 => threads,
            _ => num_cpus::get(),
        };

        tracing::debug!(size, "Compression pool created");

        Self {
            permits: Arc::new(Semaphore::new(size)),
            size,
        }
    }

    /// Number of jobs that may run concurrently
    pub fn size(&self) -> usize {
        self.size
    }

    /// Number of free slots right now
    pub fn available(&self) -> usize {
        self.permits.available_permits()
    }

    /// Compress `data` on the pool and wait for the result
    ///
    /// If the returned future is dropped while the job runs, the job still
    /// completes and keeps its slot until then; the output is discarded.
    pub async fn run(&self, data: Bytes, encoding: Encoding, level: u32) -> Result<Bytes> {
        let permit = Arc::clone(&self.permits)
            .acquire_owned()
            .await
            .map_err(|_| Error::Internal("Compression pool is closed".to_string()))?;

        let job = tokio::task::spawn_blocking(move || {
            let _permit = permit;
            Compressor::compress(&data, encoding, level)
        });

        job.await
            .map_err(|e| Error::Internal(format!("Compression job failed: {e}")))?
    }

    /// Stop accepting jobs; waiting and future calls to [`run`](Self::run) fail
    pub fn close(&self) {
        self.permits.close();
    }
}

impl Default for CompressionPool {
    fn default() -> Self {
        Self::new(None)
    }
}
