//! Configuration and installation root resolution
//!
//! Locates the central `cursor-rules` directory. The installation root is
//! resolved once at startup and then handed to every link operation.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Configuration file name, searched upward from the target directory
pub const CONFIG_FILE_NAME: &str = "devenv.toml";

/// Name of the shared rules directory inside the installation root
pub const RULES_DIR_NAME: &str = "cursor-rules";

/// Environment variable that overrides the installation root
pub const ROOT_ENV_VAR: &str = "DEVENV_ROOT";

/// Root configuration structure
#[derive(Debug, Default, Deserialize)]
pub struct Config {
    /// Installation root containing `cursor-rules` (relative to the config file)
    #[serde(default)]
    pub root: Option<PathBuf>,
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Find a configuration file by searching up from `start_dir`
    pub fn find_config(start_dir: &Path) -> Option<PathBuf> {
        start_dir
            .ancestors()
            .map(|dir| dir.join(CONFIG_FILE_NAME))
            .find(|candidate| candidate.is_file())
    }

    /// Installation root named by this config, resolved against the config file's directory
    pub fn installation_root(&self, config_path: &Path) -> Option<PathBuf> {
        let config_dir = config_path.parent().unwrap_or(config_path);
        self.root.as_ref().map(|root| config_dir.join(root))
    }
}

/// Where the installation root came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RootSource {
    /// `--root` flag or the `DEVENV_ROOT` environment variable
    Explicit,
    /// `root` key of a `devenv.toml`
    ConfigFile(PathBuf),
    /// Location of the running executable
    Executable,
}

impl fmt::Display for RootSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RootSource::Explicit => write!(f, "--root / {}", ROOT_ENV_VAR),
            RootSource::ConfigFile(path) => write!(f, "config file {}", path.display()),
            RootSource::Executable => write!(f, "executable location"),
        }
    }
}

/// A candidate installation root, not yet validated
#[derive(Debug, Clone)]
pub struct Installation {
    pub path: PathBuf,
    pub source: RootSource,
}

/// Pick the installation root candidate.
///
/// Priority: explicit path > `devenv.toml` found above `start_dir` > executable location.
pub fn locate_installation(
    explicit: Option<&Path>,
    start_dir: &Path,
) -> Result<Installation, RootError> {
    if let Some(path) = explicit {
        return Ok(Installation {
            path: path.to_path_buf(),
            source: RootSource::Explicit,
        });
    }

    if let Some(config_path) = Config::find_config(start_dir) {
        let config = Config::load(&config_path).map_err(|e| RootError::InvalidConfig {
            path: config_path.clone(),
            message: format!("{:#}", e),
        })?;
        if let Some(path) = config.installation_root(&config_path) {
            tracing::debug!(config = %config_path.display(), root = %path.display(), "Using root from config");
            return Ok(Installation {
                path,
                source: RootSource::ConfigFile(config_path),
            });
        }
    }

    let path = executable_installation_dir().map_err(|e| RootError::ExecutableUnknown {
        message: format!("{:#}", e),
    })?;
    Ok(Installation {
        path,
        source: RootSource::Executable,
    })
}

/// Installation directory derived from the running executable (`<exe-dir>/..`)
pub fn executable_installation_dir() -> Result<PathBuf> {
    let exe = std::env::current_exe().context("Failed to locate the running executable")?;
    let exe = fs::canonicalize(&exe).unwrap_or(exe);
    let bin_dir = exe
        .parent()
        .with_context(|| format!("Executable has no parent directory: {}", exe.display()))?;
    Ok(bin_dir.parent().unwrap_or(bin_dir).to_path_buf())
}

/// The installation root is missing its `cursor-rules` directory
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error(
    "cursor-rules directory not found at {}. The installation may be incomplete or corrupted.",
    .rules_dir.display()
)]
pub struct RootNotFound {
    /// Installation root that was tried
    pub installation: PathBuf,
    /// Rules directory that was expected inside it
    pub rules_dir: PathBuf,
}

impl RootNotFound {
    /// Whether the installation root itself is a directory
    pub fn installation_exists(&self) -> bool {
        self.installation.is_dir()
    }
}

/// Why no rules directory is available for this invocation
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RootError {
    #[error(transparent)]
    NotFound(#[from] RootNotFound),

    /// A `devenv.toml` was found but could not be read or parsed
    #[error("Installation root not found: {message}")]
    InvalidConfig { path: PathBuf, message: String },

    /// No explicit or configured root, and the executable location is unknown
    #[error("Installation root not found: {message}")]
    ExecutableUnknown { message: String },
}

/// A validated installation root with its canonical rules directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RulesRoot {
    installation: PathBuf,
    rules_dir: PathBuf,
}

impl RulesRoot {
    /// Canonical installation root
    pub fn installation(&self) -> &Path {
        &self.installation
    }

    /// Canonical `cursor-rules` directory, the target of every managed link
    pub fn rules_dir(&self) -> &Path {
        &self.rules_dir
    }
}

/// Validate that `installation` contains a `cursor-rules` directory.
pub fn resolve_root(installation: &Path) -> Result<RulesRoot, RootNotFound> {
    let rules_dir = installation.join(RULES_DIR_NAME);
    let not_found = || RootNotFound {
        installation: installation.to_path_buf(),
        rules_dir: rules_dir.clone(),
    };

    if !rules_dir.is_dir() {
        return Err(not_found());
    }

    let installation = fs::canonicalize(installation).map_err(|_| not_found())?;
    let rules_dir = fs::canonicalize(&rules_dir).map_err(|_| not_found())?;

    Ok(RulesRoot {
        installation,
        rules_dir,
    })
}
