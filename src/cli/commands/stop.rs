//! Implementation of the `foundry stop` command.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;

use crate::application::LoopRuntime;
use crate::cli::output::{output, CommandOutput};

/// Arguments for `foundry stop`.
#[derive(Args, Debug)]
pub struct StopArgs {
    /// Output directory the loop was started with
    #[arg(short, long, default_value = "output")]
    pub output: PathBuf,

    /// Kill the loop after the graceful timeout
    #[arg(short, long)]
    pub force: bool,
}

#[derive(Debug, serde::Serialize)]
struct StopOutput {
    message: String,
    forced: bool,
}

impl CommandOutput for StopOutput {
    fn to_human(&self) -> String {
        self.message.clone()
    }
}

/// Stop the running loop.
pub async fn execute(args: StopArgs, json_mode: bool) -> Result<()> {
    LoopRuntime::new(&args.output).stop(args.force).await?;

    let output_data = StopOutput {
        message: "Auto-loop stopped".to_string(),
        forced: args.force,
    };
    output(&output_data, json_mode);
    Ok(())
}
