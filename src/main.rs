//! Foundry CLI entry point.

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use foundry::cli::{Cli, Commands};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Init(args) => foundry::cli::commands::init::execute(args, cli.json).await,
        Commands::Up(args) => foundry::cli::commands::up::execute(args, cli.json).await,
        Commands::Stop(args) => foundry::cli::commands::stop::execute(args, cli.json).await,
        Commands::Status(args) => foundry::cli::commands::status::execute(args, cli.json).await,
        Commands::Generate(args) => foundry::cli::commands::generate::execute(args, cli.json).await,
        Commands::Evolve(args) => foundry::cli::commands::evolve::execute(args, cli.json).await,
    };

    if let Err(err) = result {
        foundry::cli::handle_error(err, cli.json);
    }
}
