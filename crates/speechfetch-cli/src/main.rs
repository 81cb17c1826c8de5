mod args;
mod commands;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use args::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    let filter = match cli.verbose {
        0 => "speechfetch=info,speechfetch_core=warn",
        1 => "speechfetch=debug,speechfetch_core=debug",
        2 => "speechfetch=trace,speechfetch_core=trace",
        _ => "trace",
    };

    // stdout is reserved for results (--json)
    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(false)
                .without_time()
                .with_writer(std::io::stderr),
        )
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .init();

    // Handle commands
    match cli.command {
        Some(Commands::Download { url, options }) => {
            commands::download::run(&url, &options, cli.config.as_deref()).await
        }
        Some(Commands::Validate { urls }) => commands::validate::run(&urls),
        Some(Commands::Doctor) => commands::doctor::run(cli.config.as_deref()).await,
        Some(Commands::Config) => commands::config::run(cli.config.as_deref()).await,
        None => {
            // If URL provided directly, treat as download command
            if let Some(url) = cli.url {
                commands::download::run(&url, &cli.options, cli.config.as_deref()).await
            } else {
                // No URL, print help
                use clap::CommandFactory;
                Cli::command().print_help()?;
                println!();
                Ok(())
            }
        }
    }
}
