use anyhow::{Result, bail};
use colored::Colorize;
use devenv::linker::{self, Intent};
use dialoguer::Confirm;
use is_terminal::IsTerminal;
use std::path::Path;
use std::process::ExitCode;

use super::Session;

pub fn run_setup(session: &Session, target_dir: &Path, force: bool) -> Result<ExitCode> {
    println!(
        "\n{} {}",
        "Setting up devenv in:".bold().cyan(),
        target_dir.display()
    );

    match linker::apply(target_dir, session.root(), Intent::Setup, force) {
        Ok(outcome) => {
            println!("{} {}", "✔".green(), outcome);
            println!("\n{}", "Setup complete!".green().bold());
            println!("\nYour .cursor directory is now symlinked to central rules.");
            println!("Run {} to verify the setup.\n", "devenv status".cyan());
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => {
            println!("{} {}", "✗".red(), e.to_string().red());
            if !force && e.needs_force() {
                println!(
                    "\n{} Run with {} to backup and replace.\n",
                    "Tip:".yellow(),
                    "--force".cyan()
                );
            }
            Ok(ExitCode::FAILURE)
        }
    }
}

pub fn run_unlink(target_dir: &Path, yes: bool) -> Result<ExitCode> {
    if !yes {
        if !std::io::stdin().is_terminal() {
            bail!("Refusing to unlink without confirmation; pass --yes to skip the prompt");
        }
        let confirmed = Confirm::new()
            .with_prompt("Are you sure you want to remove the .cursor symlink?")
            .default(false)
            .interact()?;
        if !confirmed {
            println!("Aborted.");
            return Ok(ExitCode::FAILURE);
        }
    }

    println!(
        "\n{} {}",
        "Unlinking from:".bold().cyan(),
        target_dir.display()
    );

    // Unlink never needs the installation root
    match linker::unlink(target_dir) {
        Ok(outcome) => {
            println!("{} {}\n", "✔".green(), outcome);
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => {
            println!("{} {}\n", "✗".red(), e.to_string().red());
            Ok(ExitCode::FAILURE)
        }
    }
}
