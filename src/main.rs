mod cli;

use clap::Parser;
use cli::{Cli, Commands};
use cookie_persist::config::Config;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let cli = Cli::parse();
    let mut config = Config::load()?;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.telemetry.log_filter));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match cli.command {
        Commands::Serve(args) => {
            if let Some(address) = args.address {
                config.server.bind_addr = address;
            }
            cookie_persist::api::run(config).await?
        }
        Commands::Inspect(args) => cli::inspect(&config, &args.cookie).await?,
    }

    Ok(())
}
