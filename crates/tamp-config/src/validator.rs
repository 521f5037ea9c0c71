//! Configuration validation

use crate::Config;
use tamp_core::{Error, Result};

/// Validate configuration
pub fn validate_config(config: &Config) -> Result<()> {
    validate_server(config)?;
    validate_compression(config)?;

    Ok(())
}

fn validate_server(config: &Config) -> Result<()> {
    let index = config.server.index.trim();
    if index.is_empty() {
        return Err(Error::Config("server.index cannot be empty".to_string()));
    }

    if index.contains('/') || index.contains('\\') {
        return Err(Error::Config(format!(
            "server.index must be a file name, got '{index}'"
        )));
    }

    if config.server.shutdown_timeout.as_secs() > 300 {
        tracing::warn!("shutdown_timeout is very high (>5 minutes)");
    }

    Ok(())
}

fn validate_compression(config: &Config) -> Result<()> {
    config.compression.validate()?;

    if config.compression.compress_min_size == 0 {
        tracing::warn!("compress_min_size is 0, every eligible response will be compressed");
    }

    Ok(())
}
