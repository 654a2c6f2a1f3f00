use std::path::PathBuf;

use clap::Parser;

/// Duck image generator relay
#[derive(Debug, Parser)]
#[command(name = "duckgen", about = "HTTP relay for OpenAI and Google image generation with a feed of recent images")]
pub struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "duckgen.toml", env = "DUCKGEN_CONFIG")]
    pub config: PathBuf,

    /// Override the listen address
    #[arg(long, env = "DUCKGEN_LISTEN")]
    pub listen: Option<std::net::SocketAddr>,
}
