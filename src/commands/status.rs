use anyhow::Result;
use colored::Colorize;
use devenv::linker::{self, LinkState, StatusReport};
use std::path::Path;
use std::process::ExitCode;

use super::Session;

pub fn run_status(session: &Session, target_dir: &Path, json: bool) -> Result<ExitCode> {
    let report = match linker::status(target_dir, session.root()) {
        Ok(report) => report,
        Err(e) => {
            println!("{} {}", "✗".red(), e);
            return Ok(ExitCode::FAILURE);
        }
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(ExitCode::SUCCESS);
    }

    println!(
        "\n{} {}\n",
        "Checking status for:".bold().cyan(),
        target_dir.display()
    );

    print_row("Target Directory", report.target_dir.display().to_string());
    print_row(
        "DevEnv Root",
        match &report.installation_root {
            Some(root) => root.display().to_string(),
            None => "Not found".red().to_string(),
        },
    );
    print_row("Root Source", session.source_label());
    if let Some(expected) = &report.expected_target {
        print_row("Expected Source", expected.display().to_string());
    }

    match &report.link {
        LinkState::Absent => print_row(".cursor Status", "Not Found".red().to_string()),
        LinkState::RealDirectory { .. } => {
            print_row(".cursor Status", "Regular Directory".yellow().to_string())
        }
        state => {
            print_row(".cursor Status", "Symlink".yellow().to_string());
            print_row(
                "Linked To",
                state
                    .current_target()
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|| "Unknown".red().to_string()),
            );
        }
    }
    print_row(
        "Correctly Linked",
        if report.link.is_correct() {
            "✔ Yes".green().to_string()
        } else {
            "✗ No".red().to_string()
        },
    );

    print_summary(&report);
    Ok(ExitCode::SUCCESS)
}

fn print_row(property: &str, value: String) {
    println!("  {:<18} {}", property.cyan(), value);
}

fn print_summary(report: &StatusReport) {
    if report.link.is_correct() {
        println!("\n{}", "✔ Setup is correct!".green().bold());
        println!("Your .cursor rules are properly linked.\n");
        return;
    }

    println!("\n{}", "⚠ Setup needs attention".yellow().bold());
    match &report.link {
        LinkState::Absent => {
            println!("Run {} to create the symlink.\n", "devenv setup".cyan())
        }
        LinkState::RealDirectory { .. } => {
            println!("Run {} to backup and link.\n", "devenv setup --force".cyan())
        }
        _ if report.expected_target.is_none() => println!(
            "The devenv installation could not be found. Run {} for details.\n",
            "devenv doctor".cyan()
        ),
        _ => println!("Run {} to fix the link.\n", "devenv setup --force".cyan()),
    }
}
