//! Configuration builder

use crate::types::{Config, ServerConfig};
use std::net::SocketAddr;
use std::path::PathBuf;
use tamp_compression::CompressionConfig;
use tamp_core::Result;

/// Builder for constructing configuration programmatically
#[derive(Debug, Default)]
pub struct ConfigBuilder {
    server: Option<ServerConfig>,
    compression: Option<CompressionConfig>,
}

impl ConfigBuilder {
    /// Create a new configuration builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Set server configuration
    pub fn server(mut self, server: ServerConfig) -> Self {
        self.server = Some(server);
        self
    }

    /// Set listen address
    pub fn listen(mut self, addr: SocketAddr) -> Self {
        self.server.get_or_insert_with(ServerConfig::default).listen = addr;
        self
    }

    /// Set the directory to serve
    pub fn root(mut self, root: impl Into<PathBuf>) -> Self {
        self.server.get_or_insert_with(ServerConfig::default).root = root.into();
        self
    }

    /// Set compression configuration
    pub fn compression(mut self, compression: CompressionConfig) -> Self {
        self.compression = Some(compression);
        self
    }

    /// Build and validate the configuration
    pub fn build(self) -> Result<Config> {
        let config = Config {
            server: self.server.unwrap_or_default(),
            compression: self.compression.unwrap_or_default(),
        };

        crate::validator::validate_config(&config)?;

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_builder() {
        let addr: SocketAddr = "127.0.0.1:9000".parse().unwrap();

        let config = ConfigBuilder::new()
            .listen(addr)
            .root("/srv/www")
            .build()
            .unwrap();

        assert_eq!(config.server.listen, addr);
        assert_eq!(config.server.root, PathBuf::from("/srv/www"));
        assert_eq!(config.server.index, "index.html");
    }

    #[test]
    fn test_builder_defaults() {
        let config = ConfigBuilder::new().build().unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_builder_validates() {
        let result = ConfigBuilder::new()
            .compression(CompressionConfig::default().with_level(11))
            .build();
        assert!(result.is_err());
    }
}
