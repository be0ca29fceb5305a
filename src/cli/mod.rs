//! CLI layer: argument parsing, command execution, and output rendering.

pub mod commands;
pub mod output;
mod types;

pub use types::{Cli, Commands};

/// Report a fatal error in the selected output mode and exit nonzero.
pub fn handle_error(err: anyhow::Error, json_mode: bool) -> ! {
    if json_mode {
        let value = serde_json::json!({ "error": format!("{err:#}") });
        eprintln!("{}", serde_json::to_string_pretty(&value).unwrap_or_default());
    } else {
        eprintln!("{} {err:#}", console::style("error:").red().bold());
    }
    std::process::exit(1);
}
