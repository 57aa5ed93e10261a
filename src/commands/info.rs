use anyhow::Result;
use colored::Colorize;
use devenv::resources;
use std::process::ExitCode;

use super::Session;

pub fn run_info(session: &Session) -> Result<ExitCode> {
    println!("\n{}\n", "DevEnv Installation Info".bold().cyan());

    let root = match session.root() {
        Ok(root) => root,
        Err(e) => {
            println!("{} {}\n", "✗".red(), e.to_string().red());
            return Ok(ExitCode::FAILURE);
        }
    };

    println!(
        "  {:<14} {}",
        "DevEnv Root".cyan(),
        root.installation().display()
    );
    println!(
        "  {:<14} {}",
        "Root Source".cyan(),
        session.source_label()
    );
    println!(
        "  {:<14} {}",
        "Cursor Rules".cyan(),
        root.rules_dir().display()
    );
    println!(
        "  {:<14} {}",
        "Rules Exist".cyan(),
        if root.rules_dir().is_dir() {
            "✔ Yes".green().to_string()
        } else {
            "✗ No".red().to_string()
        }
    );

    let counts = resources::count_resources(root.rules_dir());
    println!("\n{}", "Available Resources:".bold());
    println!("  Commands: {}", counts.commands);
    println!("  Rules: {}\n", counts.rules);

    Ok(ExitCode::SUCCESS)
}
