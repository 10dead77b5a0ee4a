//! Application orchestration and command routing.
//!
//! Handles command-line argument parsing and delegates to appropriate command handlers.

use crate::commands;
use crate::logging;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use std::io;

/// Real-time audio spectrum bars in your terminal
#[derive(Parser)]
#[command(name = "barscope")]
#[command(version)]
#[command(about = "\n\n ▁▃▅▇ barscope\n\nReal-time audio spectrum bars in your terminal")]
#[command(long_about = "\n\n ▁▃▅▇ barscope\n\nReal-time audio spectrum bars in your terminal.\n\nDEFAULT COMMAND:\n    If no command is specified, 'run' is used by default.\n\nKEYS:\n    q, Esc, Ctrl+C    Quit\n\nEXAMPLES:\n    # Visualize the configured input device\n    $ barscope\n\n    # Find the ID of another input device\n    $ barscope list-devices\n\n    # Edit colors, offsets and window state\n    $ barscope config")]
#[command(
    after_help = "CONFIGURATION:\n    Config file:        ~/.config/barscope/barscope.toml\n    Logs:               ~/.local/state/barscope/barscope.log.*"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Capture audio and draw spectrum bars (default)
    ///
    /// Bars stop redrawing while the input is silent and resume as soon as
    /// sound returns. Press q, Escape or Ctrl+C to quit.
    Run,

    /// Open configuration file in your preferred editor
    ///
    /// Uses $EDITOR environment variable or falls back to nano/vi.
    #[command(visible_alias = "c")]
    Config,

    /// List available audio input devices
    ///
    /// Shows device IDs, names, and configurations. Use the ID as
    /// `source` in barscope.toml.
    #[command(name = "list-devices")]
    ListDevices,

    /// Show recent log entries from the application
    ///
    /// Display the last 50 lines of the most recent log file.
    Logs,

    /// Generate shell completion script
    ///
    /// Examples:
    ///   barscope completions bash > barscope.bash
    ///   barscope completions zsh > _barscope
    ///   barscope completions fish > barscope.fish
    Completions {
        /// The shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Runs the main application based on command-line arguments.
///
/// # Errors
/// - If logging initialization fails
/// - If command execution fails
pub async fn run() -> Result<(), anyhow::Error> {
    let cli = Cli::parse();

    // Commands that don't need logging
    match &cli.command {
        Some(Commands::Completions { shell }) => {
            generate(*shell, &mut Cli::command(), "barscope", &mut io::stdout());
            return Ok(());
        }
        Some(Commands::ListDevices) => return commands::handle_list_devices(),
        Some(Commands::Logs) => return commands::handle_logs(),
        _ => {}
    }

    logging::init_logging()?;
    tracing::info!("barscope {} starting", env!("CARGO_PKG_VERSION"));

    match cli.command {
        None | Some(Commands::Run) => commands::handle_run().await?,
        Some(Commands::Config) => commands::handle_config()?,
        Some(Commands::Completions { .. }) | Some(Commands::ListDevices) | Some(Commands::Logs) => {
            unreachable!("These commands are handled earlier")
        }
    }

    Ok(())
}
