//! DevEnv CLI
//!
//! Command-line interface for linking projects to the shared Cursor rules.

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

use commands::Session;

#[derive(Parser)]
#[command(name = "devenv")]
#[command(
    author,
    version,
    about = "Manage Cursor rules and development tools across projects"
)]
#[command(propagate_version = true)]
struct Cli {
    /// Installation root containing the cursor-rules directory
    #[arg(long, global = true, env = "DEVENV_ROOT")]
    root: Option<PathBuf>,

    /// Show debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Link .cursor in a project to the central cursor-rules directory
    Setup {
        /// Target project directory
        #[arg(short, long, default_value = ".")]
        target_dir: PathBuf,

        /// Back up an existing .cursor directory or replace a foreign link
        #[arg(short, long)]
        force: bool,
    },

    /// Show whether .cursor is correctly linked
    Status {
        /// Target project directory
        #[arg(short, long, default_value = ".")]
        target_dir: PathBuf,

        /// Output machine-readable JSON
        #[arg(long)]
        json: bool,
    },

    /// Remove the .cursor symlink from a project
    Unlink {
        /// Target project directory
        #[arg(short, long, default_value = ".")]
        target_dir: PathBuf,

        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// Show where devenv and its cursor-rules are installed
    Info,

    /// Diagnose setup issues and suggest fixes
    Doctor {
        /// Target project directory
        #[arg(short, long, default_value = ".")]
        target_dir: PathBuf,

        /// Output machine-readable JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let root = cli.root.as_deref();

    match cli.command {
        Commands::Setup { target_dir, force } => {
            let target_dir = commands::resolve_target_dir(&target_dir)?;
            let session = Session::resolve(root, &target_dir);
            commands::link::run_setup(&session, &target_dir, force)
        }
        Commands::Status { target_dir, json } => {
            let target_dir = commands::resolve_target_dir(&target_dir)?;
            let session = Session::resolve(root, &target_dir);
            commands::status::run_status(&session, &target_dir, json)
        }
        Commands::Unlink { target_dir, yes } => {
            let target_dir = commands::resolve_target_dir(&target_dir)?;
            commands::link::run_unlink(&target_dir, yes)
        }
        Commands::Info => {
            let cwd = std::env::current_dir()?;
            let session = Session::resolve(root, &cwd);
            commands::info::run_info(&session)
        }
        Commands::Doctor { target_dir, json } => {
            let target_dir = commands::resolve_target_dir(&target_dir)?;
            let session = Session::resolve(root, &target_dir);
            commands::doctor::run_doctor(&session, &target_dir, json)
        }
    }
}

fn init_logging(verbose: bool) {
    let level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };

    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();
}
