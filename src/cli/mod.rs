//! Command-line interface.

pub mod bootstrap;
pub mod commands;
pub mod output;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "compass",
    version,
    about = "Guided career-assessment chat",
    long_about = "Compass runs a guided career interview in your terminal: it asks questions \
across education, skills, work style, and goals, then turns your answers into career \
recommendations."
)]
pub struct Cli {
    /// Emit machine-readable JSON instead of human output
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start or resume an interactive assessment chat
    Chat(commands::chat::ChatArgs),
    /// Inspect and manage sessions
    Sessions(commands::sessions::SessionsArgs),
    /// Create the .compass directory and a default config file
    Init(commands::init::InitArgs),
}

/// Prints a command error and exits non-zero.
pub fn handle_error(err: anyhow::Error, json_mode: bool) -> ! {
    if json_mode {
        println!(
            "{}",
            serde_json::json!({ "success": false, "error": format!("{err:#}") })
        );
    } else {
        eprintln!("{}", console::style(format!("Error: {err:#}")).red());
    }
    std::process::exit(1);
}
