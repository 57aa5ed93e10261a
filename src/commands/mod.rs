pub mod doctor;
pub mod info;
pub mod link;
pub mod status;

use anyhow::{Context, Result, bail};
use devenv::config::{self, Installation, RootError, RulesRoot};
use std::fs;
use std::path::{Path, PathBuf};

/// Installation root resolved once per invocation
pub struct Session {
    /// Candidate root, `None` when no candidate could be determined
    pub installation: Option<Installation>,
    pub root: Result<RulesRoot, RootError>,
}

impl Session {
    pub fn resolve(explicit: Option<&Path>, start_dir: &Path) -> Self {
        let installation = match config::locate_installation(explicit, start_dir) {
            Ok(installation) => installation,
            Err(e) => {
                tracing::debug!(error = %e, "Could not locate installation root");
                return Self {
                    installation: None,
                    root: Err(e),
                };
            }
        };

        let root = config::resolve_root(&installation.path).map_err(RootError::from);
        tracing::debug!(
            root = %installation.path.display(),
            source = %installation.source,
            found = root.is_ok(),
            "Resolved installation root"
        );
        Self {
            installation: Some(installation),
            root,
        }
    }

    pub fn root(&self) -> Result<&RulesRoot, &RootError> {
        self.root.as_ref()
    }

    /// Human-readable origin of the installation root
    pub fn source_label(&self) -> String {
        self.installation
            .as_ref()
            .map(|installation| installation.source.to_string())
            .unwrap_or_else(|| "Not found".to_string())
    }
}

/// Canonicalize `--target-dir`, which must be an existing directory
pub fn resolve_target_dir(path: &Path) -> Result<PathBuf> {
    let resolved = fs::canonicalize(path)
        .with_context(|| format!("Target directory does not exist: {}", path.display()))?;
    if !resolved.is_dir() {
        bail!("Target is not a directory: {}", path.display());
    }
    Ok(resolved)
}
