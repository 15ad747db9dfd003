//! Command-line arguments
//!
//! Flag names follow the service's historical short options; each flag also
//! reads a plain environment variable of the same meaning.

use clap::Parser;

#[derive(Parser, Debug, Clone, Default)]
#[command(name = "shortener", version, about = "Multi-tenant URL shortener")]
pub struct CliArgs {
    /// Path to a TOML configuration file
    #[arg(short = 'c', long = "config", env = "CONFIG")]
    pub config: Option<String>,

    /// Listen address as host:port
    #[arg(short = 'a', long = "address", env = "SERVER_ADDRESS")]
    pub server_address: Option<String>,

    /// Prefix of returned short URLs
    #[arg(short = 'b', long = "base-url", env = "BASE_URL")]
    pub base_url: Option<String>,

    /// JSON file used to persist links (in-memory when unset)
    #[arg(short = 'f', long = "file-storage-path", env = "FILE_STORAGE_PATH")]
    pub file_storage_path: Option<String>,

    /// CIDR allowed to query /api/internal/stats
    #[arg(short = 't', long = "trusted-subnet", env = "TRUSTED_SUBNET")]
    pub trusted_subnet: Option<String>,

    /// Also serve the gRPC transport
    #[arg(short = 'g', long = "enable-grpc", env = "ENABLE_GRPC")]
    pub enable_grpc: bool,

    /// Print a sample configuration file and exit
    #[arg(long = "generate-config")]
    pub generate_config: bool,
}
