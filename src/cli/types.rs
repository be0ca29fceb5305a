//! CLI type definitions.
//!
//! Clap command structures that define the command-line interface.

use clap::{Parser, Subcommand};

use super::commands;

/// Top-level CLI entry.
#[derive(Parser)]
#[command(name = "foundry")]
#[command(about = "Foundry - Self-Bootstrapping AI Company", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Selected subcommand.
    #[command(subcommand)]
    pub command: Commands,

    /// Output in JSON format
    #[arg(short, long, global = true)]
    pub json: bool,
}

/// Available subcommands.
#[derive(Subcommand)]
pub enum Commands {
    /// Bootstrap a new AI company from a seed prompt
    Init(commands::init::InitArgs),

    /// Generate files and start the autonomous loop
    Up(commands::up::UpArgs),

    /// Stop the autonomous loop
    Stop(commands::stop::StopArgs),

    /// Show current company status
    Status(commands::status::StatusArgs),

    /// Generate runtime artifacts without starting the loop
    Generate(commands::generate::GenerateArgs),

    /// Evaluate recent cycles and propose configuration adjustments
    Evolve(commands::evolve::EvolveArgs),
}
