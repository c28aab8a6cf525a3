use clap::Parser;
use std::path::PathBuf;

/// Observable HTTP service: health aggregation and computation dispatch.
#[derive(Parser, Debug)]
#[command(name = "observable-service", version, about)]
struct Cli {
    /// Path to a TOML configuration file. Defaults plus APP_* variables when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    observable_service::lifecycle::startup::run(cli.config).await
}
