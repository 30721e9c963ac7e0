//! Command-line interface for the vswitch Python environment switcher.

use std::fmt;
use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::debug;

use vswitch_core::config::{default_settings_path, LogLevel, Settings};
use vswitch_core::logging;

mod commands;
mod output;
pub mod shell;
mod watcher;

pub use commands::*;
pub use output::*;

use shell::Shell;

/// Marker for failures already shown to the user
#[derive(Debug)]
pub struct Reported;

impl fmt::Display for Reported {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("operation failed")
    }
}

impl std::error::Error for Reported {}

/// CLI arguments parser
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Settings file path
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Verbose output (forces DEBUG logging)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Project folder checked for a .venv (repeatable, defaults to the current directory)
    #[arg(short, long, value_name = "DIR", global = true)]
    project: Vec<PathBuf>,

    /// Shell dialect for generated scripts (detected from $SHELL by default)
    #[arg(long, value_enum, global = true)]
    shell: Option<Shell>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List discovered environments
    List,

    /// Print a script activating an environment, for `eval "$(vswitch activate NAME)"`
    Activate {
        /// Environment name (pick interactively when omitted)
        name: Option<String>,

        /// Only consider environments under this root
        #[arg(long, value_name = "DIR")]
        root: Option<PathBuf>,
    },

    /// Print a script returning to the previous environment
    Deactivate,

    /// Interactive session that keeps an activation stack
    Session,

    /// Create or open the settings file
    Settings,
}

/// Run the CLI application
pub fn run() -> Result<()> {
    let cli = Cli::parse();
    let logger = Logger::new();

    let settings_path = cli.config.clone().unwrap_or_else(default_settings_path);
    let (settings, events) = match Settings::from_file(&settings_path) {
        Ok(loaded) => loaded,
        Err(e) => {
            logger.warning(format!("{}, using defaults", e));
            (Settings::with_path(&settings_path), Vec::new())
        }
    };

    let level = if cli.verbose {
        LogLevel::Debug
    } else {
        settings.log_level()
    };
    let log_handle = logging::init(level, cli.verbose);
    debug!("Settings loaded from {}", settings_path.display());

    let project_folders = if cli.project.is_empty() {
        vec![std::env::current_dir()?]
    } else {
        cli.project.clone()
    };

    let ctx = CommandContext {
        settings,
        events,
        project_folders,
        log_handle,
        logger,
        shell: cli.shell.unwrap_or_else(Shell::detect),
    };

    match cli.command {
        Commands::List => commands::execute_list(&ctx),
        Commands::Activate { name, root } => commands::execute_activate(name, root, &ctx),
        Commands::Deactivate => commands::execute_deactivate(&ctx),
        Commands::Session => commands::execute_session(&ctx),
        Commands::Settings => commands::execute_settings(&ctx),
    }
}

/// Main entry point for the CLI binary
pub fn main() {
    if let Err(e) = run() {
        if e.downcast_ref::<Reported>().is_none() {
            Logger::new().error(format!("{:#}", e));
        }
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_activate() {
        let cli = Cli::try_parse_from(["vswitch", "activate", "myenv", "--shell", "fish"]).unwrap();
        assert_eq!(cli.shell, Some(Shell::Fish));
        match cli.command {
            Commands::Activate { name, root } => {
                assert_eq!(name.as_deref(), Some("myenv"));
                assert!(root.is_none());
            }
            _ => panic!("expected activate"),
        }
    }
}
