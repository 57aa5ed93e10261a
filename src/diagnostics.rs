//! Setup diagnostics
//!
//! Runs the installation and link checks in order and collects every failure
//! into a [`DiagnosticReport`]. Diagnosis itself never fails.

use serde::Serialize;
use std::path::Path;

use crate::config::{ROOT_ENV_VAR, RootError, RulesRoot};
use crate::linker::{self, LinkState};

pub const CHECK_INSTALLATION: &str = "DevEnv installed";
pub const CHECK_RULES: &str = "Cursor rules found";
pub const CHECK_LINK: &str = "Cursor rules linked";

/// A single named check
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Check {
    pub name: &'static str,
    pub passed: bool,
    pub detail: Option<String>,
}

impl Check {
    fn pass(name: &'static str) -> Self {
        Self {
            name,
            passed: true,
            detail: None,
        }
    }

    fn fail(name: &'static str, detail: impl Into<String>) -> Self {
        Self {
            name,
            passed: false,
            detail: Some(detail.into()),
        }
    }
}

/// Outcome of [`diagnose`]
#[derive(Debug, Clone, Default, Serialize)]
pub struct DiagnosticReport {
    pub checks: Vec<Check>,
    /// Actionable defects
    pub issues: Vec<String>,
    /// Expected pre-setup states
    pub warnings: Vec<String>,
    /// Remediation hints, installation problems first
    pub recommendations: Vec<String>,
}

impl DiagnosticReport {
    pub fn all_passed(&self) -> bool {
        self.issues.is_empty() && self.warnings.is_empty()
    }
}

/// Diagnose the installation and the managed link in `target_dir`.
pub fn diagnose(target_dir: &Path, root: Result<&RulesRoot, &RootError>) -> DiagnosticReport {
    let mut report = DiagnosticReport::default();

    match root {
        Ok(_) => {
            report.checks.push(Check::pass(CHECK_INSTALLATION));
            report.checks.push(Check::pass(CHECK_RULES));
        }
        Err(RootError::NotFound(missing)) => {
            if missing.installation_exists() {
                report.checks.push(Check::pass(CHECK_INSTALLATION));
            } else {
                report
                    .checks
                    .push(Check::fail(CHECK_INSTALLATION, "Installation not found"));
                report.issues.push(format!(
                    "DevEnv installation not found at {}",
                    missing.installation.display()
                ));
                report.recommendations.push(format!(
                    "Reinstall devenv, or point --root / {} at an installation",
                    ROOT_ENV_VAR
                ));
            }

            report
                .checks
                .push(Check::fail(CHECK_RULES, "cursor-rules directory missing"));
            report.issues.push(format!(
                "Cursor rules directory not found at {}",
                missing.rules_dir.display()
            ));
            report.recommendations.push(format!(
                "Restore {} or reinstall devenv",
                missing.rules_dir.display()
            ));
        }
        Err(unresolved) => {
            let (detail, hint) = match unresolved {
                RootError::InvalidConfig { path, .. } => (
                    "Invalid config file",
                    format!("Fix or remove {}", path.display()),
                ),
                _ => (
                    "Installation not found",
                    format!("Pass --root or set {} to the installation", ROOT_ENV_VAR),
                ),
            };
            report.checks.push(Check::fail(CHECK_INSTALLATION, detail));
            report.issues.push(unresolved.to_string());
            report.recommendations.push(hint);

            report
                .checks
                .push(Check::fail(CHECK_RULES, "Installation root unknown"));
            report.recommendations.push(
                "Run `devenv info` to confirm the cursor-rules location".to_string(),
            );
        }
    }

    let state = match linker::inspect(target_dir, root.ok()) {
        Ok(state) => state,
        Err(e) => {
            report
                .checks
                .push(Check::fail(CHECK_LINK, "Could not inspect .cursor"));
            report.issues.push(e.to_string());
            report.recommendations.push(format!(
                "Check permissions on {}",
                linker::link_path(target_dir).display()
            ));
            return report;
        }
    };

    match &state {
        LinkState::CorrectSymlink { .. } => report.checks.push(Check::pass(CHECK_LINK)),

        LinkState::WrongSymlink { expected: None, .. } => {
            report
                .checks
                .push(Check::fail(CHECK_LINK, "Cannot verify link target"));
            report.warnings.push(format!(
                ".cursor is linked to {} but the expected location is unknown",
                display_target(&state)
            ));
            report
                .recommendations
                .push("Fix the installation, then run `devenv status`".to_string());
        }

        LinkState::WrongSymlink {
            expected: Some(expected),
            ..
        } => {
            report
                .checks
                .push(Check::fail(CHECK_LINK, "Linked to wrong location"));
            report.issues.push(format!(
                ".cursor is linked to {} instead of {}",
                display_target(&state),
                expected.display()
            ));
            report
                .recommendations
                .push("Run `devenv setup --force` to fix the link".to_string());
        }

        LinkState::RealDirectory { .. } => {
            report.checks.push(Check::fail(CHECK_LINK, "Not a symlink"));
            report
                .warnings
                .push(".cursor exists as a regular directory, not a symlink".to_string());
            report
                .recommendations
                .push("Run `devenv setup --force` to backup and link".to_string());
        }

        LinkState::Absent => {
            report.checks.push(Check::fail(CHECK_LINK, "Not set up"));
            report
                .warnings
                .push(".cursor directory not found in target".to_string());
            report
                .recommendations
                .push("Run `devenv setup` to create the symlink".to_string());
        }
    }

    report
}

fn display_target(state: &LinkState) -> String {
    state
        .current_target()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "<unknown>".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{RULES_DIR_NAME, resolve_root};
    use std::fs;
    use tempfile::TempDir;

    fn installation(temp_dir: &TempDir) -> RulesRoot {
        let install = temp_dir.path().join("install");
        fs::create_dir_all(install.join(RULES_DIR_NAME)).unwrap();
        resolve_root(&install).unwrap()
    }

    fn project(temp_dir: &TempDir) -> std::path::PathBuf {
        let project = temp_dir.path().join("project");
        fs::create_dir_all(&project).unwrap();
        project
    }

    fn failing_checks(report: &DiagnosticReport) -> usize {
        report.checks.iter().filter(|c| !c.passed).count()
    }

    fn check<'a>(report: &'a DiagnosticReport, name: &str) -> &'a Check {
        report.checks.iter().find(|c| c.name == name).unwrap()
    }

    #[test]
    #[cfg(unix)]
    fn test_healthy_setup_passes_everything() {
        let temp_dir = TempDir::new().unwrap();
        let root = installation(&temp_dir);
        let project = project(&temp_dir);
        linker::setup(&project, &root, false).unwrap();

        let report = diagnose(&project, Ok(&root));

        assert!(report.checks.iter().all(|c| c.passed));
        assert!(report.all_passed());
        assert!(report.recommendations.is_empty());
    }

    #[test]
    fn test_checks_run_in_order() {
        let temp_dir = TempDir::new().unwrap();
        let root = installation(&temp_dir);
        let project = project(&temp_dir);

        let report = diagnose(&project, Ok(&root));

        let names: Vec<_> = report.checks.iter().map(|c| c.name).collect();
        assert_eq!(names, vec![CHECK_INSTALLATION, CHECK_RULES, CHECK_LINK]);
    }

    #[test]
    fn test_absent_link_is_warning() {
        let temp_dir = TempDir::new().unwrap();
        let root = installation(&temp_dir);
        let project = project(&temp_dir);

        let report = diagnose(&project, Ok(&root));

        assert!(!check(&report, CHECK_LINK).passed);
        assert!(report.issues.is_empty());
        assert_eq!(report.warnings.len(), 1);
        assert_eq!(
            report.recommendations,
            vec!["Run `devenv setup` to create the symlink".to_string()]
        );
    }

    #[test]
    fn test_real_directory_is_warning() {
        let temp_dir = TempDir::new().unwrap();
        let root = installation(&temp_dir);
        let project = project(&temp_dir);
        fs::create_dir(project.join(".cursor")).unwrap();

        let report = diagnose(&project, Ok(&root));

        assert_eq!(
            check(&report, CHECK_LINK).detail.as_deref(),
            Some("Not a symlink")
        );
        assert!(report.issues.is_empty());
        assert!(report.warnings[0].contains("regular directory"));
        assert!(report.recommendations[0].contains("--force"));
    }

    #[test]
    #[cfg(unix)]
    fn test_wrong_symlink_is_issue() {
        let temp_dir = TempDir::new().unwrap();
        let root = installation(&temp_dir);
        let project = project(&temp_dir);
        let other = temp_dir.path().join("other");
        fs::create_dir(&other).unwrap();
        std::os::unix::fs::symlink(&other, project.join(".cursor")).unwrap();

        let report = diagnose(&project, Ok(&root));

        assert_eq!(report.issues.len(), 1);
        assert!(report.issues[0].contains("instead of"));
        assert!(report.issues[0].contains(&root.rules_dir().display().to_string()));
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn test_missing_rules_dir_is_issue() {
        let temp_dir = TempDir::new().unwrap();
        let project = project(&temp_dir);
        let missing = RootError::from(resolve_root(temp_dir.path()).unwrap_err());

        let report = diagnose(&project, Err(&missing));

        assert!(check(&report, CHECK_INSTALLATION).passed);
        assert!(!check(&report, CHECK_RULES).passed);
        assert!(report.issues.iter().any(|i| i.contains("not found")));
        assert!(report.recommendations[0].contains(RULES_DIR_NAME));
    }

    #[test]
    fn test_missing_installation_is_issue_and_ranked_first() {
        let temp_dir = TempDir::new().unwrap();
        let project = project(&temp_dir);
        let missing = RootError::from(resolve_root(&temp_dir.path().join("nowhere")).unwrap_err());

        let report = diagnose(&project, Err(&missing));

        assert!(!check(&report, CHECK_INSTALLATION).passed);
        assert!(!check(&report, CHECK_RULES).passed);
        assert!(report.issues.len() >= 2);
        assert!(report.issues.iter().all(|i| i.contains("not found")));
        assert_eq!(report.recommendations.len(), 3);
        assert!(report.recommendations[0].starts_with("Reinstall"));
        assert!(report.recommendations[2].contains("devenv setup"));
    }

    #[test]
    #[cfg(unix)]
    fn test_symlink_without_installation_cannot_be_verified() {
        let temp_dir = TempDir::new().unwrap();
        let project = project(&temp_dir);
        let other = temp_dir.path().join("other");
        fs::create_dir(&other).unwrap();
        std::os::unix::fs::symlink(&other, project.join(".cursor")).unwrap();
        let missing = RootError::from(resolve_root(temp_dir.path()).unwrap_err());

        let report = diagnose(&project, Err(&missing));

        assert_eq!(
            check(&report, CHECK_LINK).detail.as_deref(),
            Some("Cannot verify link target")
        );
        assert!(report.warnings[0].contains("unknown"));
        assert_eq!(failing_checks(&report), 2);
        assert_eq!(report.recommendations.len(), 2);
        assert!(report.recommendations[1].contains("devenv status"));
    }

    #[test]
    fn test_uninspectable_target_gets_hint() {
        let temp_dir = TempDir::new().unwrap();
        let root = installation(&temp_dir);
        let not_a_dir = temp_dir.path().join("file");
        fs::write(&not_a_dir, "").unwrap();

        let report = diagnose(&not_a_dir, Ok(&root));

        assert_eq!(
            check(&report, CHECK_LINK).detail.as_deref(),
            Some("Could not inspect .cursor")
        );
        assert_eq!(report.issues.len(), 1);
        assert_eq!(failing_checks(&report), report.recommendations.len());
        assert!(report.recommendations[0].starts_with("Check permissions on"));
    }

    #[test]
    fn test_invalid_config_is_issue_not_failure() {
        let temp_dir = TempDir::new().unwrap();
        let project = project(&temp_dir);
        let config_path = project.join("devenv.toml");
        let error = RootError::InvalidConfig {
            path: config_path.clone(),
            message: format!("Failed to parse config file: {}", config_path.display()),
        };

        let report = diagnose(&project, Err(&error));

        assert!(!check(&report, CHECK_INSTALLATION).passed);
        assert!(!check(&report, CHECK_RULES).passed);
        assert!(report.issues[0].contains("not found"));
        assert!(report.recommendations[0].contains(&config_path.display().to_string()));
        assert_eq!(failing_checks(&report), report.recommendations.len());
    }

    #[test]
    fn test_every_failing_check_has_a_hint() {
        let temp_dir = TempDir::new().unwrap();
        let root = installation(&temp_dir);
        let project = project(&temp_dir);
        let missing = RootError::from(resolve_root(&temp_dir.path().join("nowhere")).unwrap_err());
        let unknown = RootError::ExecutableUnknown {
            message: "Failed to locate the running executable".to_string(),
        };

        for report in [
            diagnose(&project, Ok(&root)),
            diagnose(&project, Err(&missing)),
            diagnose(&project, Err(&unknown)),
        ] {
            assert_eq!(failing_checks(&report), report.recommendations.len());
        }
    }
}
