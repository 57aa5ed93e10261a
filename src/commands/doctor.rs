use anyhow::Result;
use colored::Colorize;
use devenv::diagnostics::{self, DiagnosticReport};
use std::path::Path;
use std::process::ExitCode;

use super::Session;

pub fn run_doctor(session: &Session, target_dir: &Path, json: bool) -> Result<ExitCode> {
    let report = diagnostics::diagnose(target_dir, session.root());

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(ExitCode::SUCCESS);
    }

    println!(
        "\n{} {}\n",
        "🩺 Running diagnostics for:".bold().cyan(),
        target_dir.display()
    );

    print_report(&report);
    Ok(ExitCode::SUCCESS)
}

fn print_report(report: &DiagnosticReport) {
    for check in &report.checks {
        if check.passed {
            println!("  {} {}", "✔".green(), check.name);
        } else {
            match &check.detail {
                Some(detail) => println!("  {} {}: {}", "✗".red(), check.name, detail),
                None => println!("  {} {}", "✗".red(), check.name),
            }
        }
    }
    println!();

    if !report.issues.is_empty() {
        println!("{}", "Issues Found:".red().bold());
        for issue in &report.issues {
            println!("  • {}", issue);
        }
        println!();
    }

    if !report.warnings.is_empty() {
        println!("{}", "Warnings:".yellow().bold());
        for warning in &report.warnings {
            println!("  • {}", warning);
        }
        println!();
    }

    if report.all_passed() {
        println!("{}\n", "✨ All checks passed!".green().bold());
        return;
    }

    if !report.recommendations.is_empty() {
        println!("{}", "Recommendations:".cyan().bold());
        for hint in &report.recommendations {
            println!("  → {}", hint);
        }
        println!();
    }
}
