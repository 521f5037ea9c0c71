//! Tamp CLI

mod files;
mod server;
mod shutdown;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use files::StaticFiles;
use server::Server;
use shutdown::SignalHandler;
use std::path::{Path, PathBuf};
use tamp_compression::{Compress, Compressor, Encoding};
use tamp_config::load_config;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "tamp")]
#[command(about = "gzip/deflate response compression", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve a directory with response compression
    Serve {
        /// Path to configuration file
        #[arg(short, long, default_value = "tamp.yaml")]
        config: PathBuf,

        /// Log level (trace, debug, info, warn, error)
        #[arg(short, long, default_value = "info")]
        log_level: String,
    },

    /// Compress a single file
    Compress {
        /// File to compress
        input: PathBuf,

        /// Output file (defaults to the input with .gz or .zz appended)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Encoding to apply (gzip or deflate)
        #[arg(short, long, default_value = "gzip")]
        encoding: Encoding,

        /// Compression level (0-9)
        #[arg(short = 'L', long, default_value_t = 6)]
        level: u32,
    },

    /// Validate configuration file
    Validate {
        /// Path to configuration file
        #[arg(short, long, default_value = "tamp.yaml")]
        config: PathBuf,
    },

    /// Show version information
    Version,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { config, log_level } => {
            init_tracing(&log_level)?;

            tracing::info!("Starting Tamp");
            tracing::info!("Config file: {}", config.display());

            let config = load_config(&config)?;
            let compress = Compress::new(config.compression.clone())?;

            tracing::info!(
                listen = %config.server.listen,
                level = config.compression.compress_level,
                min_size = config.compression.compress_min_size,
                workers = compress.pool().size(),
                "Configuration loaded"
            );

            let files = StaticFiles::new(&config.server.root, &config.server.index);
            let server = Server::new(config.server, compress.wrap(files));

            let shutdown_signal = server.shutdown_signal();
            tokio::spawn(async move {
                SignalHandler::new(shutdown_signal).run().await;
            });

            server.run().await?;

            tracing::info!("Server stopped");
            Ok(())
        }

        Commands::Compress {
            input,
            output,
            encoding,
            level,
        } => {
            init_tracing("info")?;

            if level > tamp_compression::config::MAX_LEVEL {
                anyhow::bail!("level must be between 0 and 9, got {level}");
            }

            let output = output.unwrap_or_else(|| default_output(&input, encoding));
            let data = tokio::fs::read(&input)
                .await
                .with_context(|| format!("Failed to read {}", input.display()))?;

            let compressed = tokio::task::spawn_blocking(move || {
                Compressor::compress(&data, encoding, level).map(|c| (data.len(), c))
            })
            .await??;
            let (original_size, compressed) = compressed;

            tokio::fs::write(&output, &compressed)
                .await
                .with_context(|| format!("Failed to write {}", output.display()))?;

            tracing::info!(
                %encoding,
                original_size,
                compressed_size = compressed.len(),
                output = %output.display(),
                "File compressed"
            );
            Ok(())
        }

        Commands::Validate { config } => {
            tracing_subscriber::fmt().with_target(false).init();

            tracing::info!("Validating configuration: {}", config.display());

            match load_config(&config) {
                Ok(cfg) => {
                    tracing::info!("✓ Configuration is valid");
                    tracing::info!("  Listen: {}", cfg.server.listen);
                    tracing::info!("  Root: {}", cfg.server.root.display());
                    tracing::info!("  Level: {}", cfg.compression.compress_level);
                    tracing::info!("  Min size: {}", cfg.compression.compress_min_size);
                    tracing::info!("  MIME types: {}", cfg.compression.compress_mimetypes.len());
                    Ok(())
                }
                Err(e) => {
                    tracing::error!("✗ Configuration validation failed: {}", e);
                    std::process::exit(1);
                }
            }
        }

        Commands::Version => {
            println!("Tamp");
            println!("Version: {}", env!("CARGO_PKG_VERSION"));
            println!("Rust version: {}", env!("CARGO_PKG_RUST_VERSION"));
            Ok(())
        }
    }
}

fn default_output(input: &Path, encoding: Encoding) -> PathBuf {
    let suffix = match encoding {
        Encoding::Gzip => "gz",
        Encoding::Deflate => "zz",
    };
    let mut name = input.as_os_str().to_owned();
    name.push(".");
    name.push(suffix);
    PathBuf::from(name)
}

fn init_tracing(level: &str) -> Result<()> {
    let filter = match level.to_lowercase().as_str() {
        "trace" => tracing::Level::TRACE,
        "debug" => tracing::Level::DEBUG,
        "info" => tracing::Level::INFO,
        "warn" => tracing::Level::WARN,
        "error" => tracing::Level::ERROR,
        _ => tracing::Level::INFO,
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_level(true),
        )
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(filter.into())
                .add_directive("hyper=warn".parse()?),
        )
        .init();

    Ok(())
}
