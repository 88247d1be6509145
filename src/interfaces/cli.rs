use clap::Parser;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "product-reviews")]
#[command(about = "HTTP service for product reviews.")]
#[command(version)]
pub struct Cli {
    /// Path to the configuration file
    #[arg(short = 'c', long)]
    pub config: Option<PathBuf>,

    /// Address to listen on, overrides `server.listen`
    #[arg(short = 'l', long)]
    pub listen: Option<String>,

    /// Generate config sample
    #[arg(long)]
    pub generate_config: bool,

    /// Show status
    #[arg(long)]
    pub status: bool,
}
