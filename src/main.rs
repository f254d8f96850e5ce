//! azure-nuke - remove all resources from an Azure tenant, in dependency order

use clap::Parser;
use log::warn;
use tokio_util::sync::CancellationToken;

mod azure;
mod cli;
mod client;
mod config;
mod error;
mod models;
mod nuke;
mod output;
mod registry;
mod resource;
mod resources;
mod scanner;

use cli::{Cli, Commands};
use error::Result;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(&cli.log_level);

    if let Err(err) = run(cli).await {
        eprintln!("Error: {}", err);
        std::process::exit(1);
    }
}

/// `RUST_LOG` wins over `--log-level`.
fn init_logging(level: &str) {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .init();
}

async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Run(args) => {
            let cancel = CancellationToken::new();
            let on_interrupt = cancel.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    warn!("interrupted, cancelling run");
                    on_interrupt.cancel();
                }
            });

            cli::run::run(cli.config.as_deref(), &args, &cancel).await
        }
        Commands::ResourceTypes { format } => {
            cli::resource_types::run(&resources::registry(), format)
        }
        Commands::Completion { shell } => {
            cli::completions::run(shell);
            Ok(())
        }
        Commands::Version => {
            println!("azure-nuke version {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}
