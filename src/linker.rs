//! Managed `.cursor` link inspection and reconciliation
//!
//! Classifies a project's `.cursor` entry against the central rules
//! directory and applies the setup and unlink transitions.
//!
//! Nothing here locks the project directory: two processes running setup or
//! unlink against the same target race, and the last writer wins.

use chrono::{DateTime, Local};
use serde::Serialize;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::config::{RootError, RulesRoot};

/// Name of the managed link inside a project directory
pub const LINK_NAME: &str = ".cursor";

/// Prefix of backup directories created by a forced setup
pub const BACKUP_PREFIX: &str = ".cursor.backup.";

const BACKUP_TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Errors returned by link operations
#[derive(Debug, Error)]
pub enum LinkError {
    #[error(transparent)]
    InstallationNotFound(#[from] RootError),

    #[error(
        ".cursor is symlinked to {}, not {}. Use --force to replace.",
        .current.display(),
        .expected.display()
    )]
    AlreadyLinkedElsewhere { current: PathBuf, expected: PathBuf },

    #[error(
        ".cursor directory already exists at {}. Use --force to backup and replace.",
        .path.display()
    )]
    AlreadyExists { path: PathBuf },

    #[error(".cursor at {} is not a symlink, refusing to remove it", .path.display())]
    NotASymlink { path: PathBuf },

    #[error("Backup {} already exists, refusing to overwrite it", .path.display())]
    BackupExists { path: PathBuf },

    #[error("Failed to {action} {}: {source}", .path.display())]
    Io {
        action: &'static str,
        path: PathBuf,
        source: io::Error,
    },
}

impl LinkError {
    /// Whether rerunning with force would get past this error
    pub fn needs_force(&self) -> bool {
        matches!(
            self,
            LinkError::AlreadyLinkedElsewhere { .. } | LinkError::AlreadyExists { .. }
        )
    }
}

fn io_error<'a>(
    action: &'static str,
    path: &'a Path,
) -> impl FnOnce(io::Error) -> LinkError + 'a {
    move |source| LinkError::Io {
        action,
        path: path.to_path_buf(),
        source,
    }
}

/// Current state of a project's `.cursor` entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum LinkState {
    /// Nothing at `.cursor`
    Absent,
    /// Symlink whose canonical target is the rules directory
    CorrectSymlink { target: PathBuf },
    /// Symlink resolving anywhere else, or dangling.
    ///
    /// `expected` is `None` when the installation root could not be resolved,
    /// in which case correctness is unknown.
    WrongSymlink {
        link: PathBuf,
        resolved: Option<PathBuf>,
        expected: Option<PathBuf>,
    },
    /// A real directory or file
    RealDirectory { is_dir: bool },
}

impl LinkState {
    pub fn exists(&self) -> bool {
        !matches!(self, LinkState::Absent)
    }

    pub fn is_symlink(&self) -> bool {
        matches!(
            self,
            LinkState::CorrectSymlink { .. } | LinkState::WrongSymlink { .. }
        )
    }

    pub fn is_correct(&self) -> bool {
        matches!(self, LinkState::CorrectSymlink { .. })
    }

    /// True for a symlink that could not be checked because no rules directory is known
    pub fn expected_unknown(&self) -> bool {
        matches!(self, LinkState::WrongSymlink { expected: None, .. })
    }

    /// Where the symlink currently points, preferring the resolved path
    pub fn current_target(&self) -> Option<&Path> {
        match self {
            LinkState::CorrectSymlink { target } => Some(target.as_path()),
            LinkState::WrongSymlink { link, resolved, .. } => {
                Some(resolved.as_deref().unwrap_or(link.as_path()))
            }
            _ => None,
        }
    }
}

/// Operation requested of [`apply`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    Setup,
    Unlink,
}

/// Successful result of a link operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// A new symlink was created
    Linked {
        link: PathBuf,
        target: PathBuf,
        /// Previous symlink target, when a wrong link was replaced
        replaced: Option<PathBuf>,
        /// Where a real directory was moved before linking
        backup: Option<PathBuf>,
    },
    /// The link was already correct
    AlreadyLinked { target: PathBuf },
    /// A symlink was removed
    Removed { link: PathBuf },
    /// Unlink found nothing at `.cursor`
    NothingToRemove,
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Linked {
                target,
                replaced,
                backup,
                ..
            } => {
                write!(f, "Linked .cursor to {}", target.display())?;
                if let Some(previous) = replaced {
                    write!(f, " (replaced link to {})", previous.display())?;
                }
                if let Some(backup) = backup {
                    let name = backup.file_name().map(Path::new).unwrap_or(backup.as_path());
                    write!(f, " (backed up to {})", name.display())?;
                }
                Ok(())
            }
            Outcome::AlreadyLinked { target } => {
                write!(f, "Already linked to {}", target.display())
            }
            Outcome::Removed { link } => write!(f, "Removed symlink at {}", link.display()),
            Outcome::NothingToRemove => write!(f, "No .cursor entry found, nothing to remove"),
        }
    }
}

/// Snapshot used by the status view
#[derive(Debug, Clone, Serialize)]
pub struct StatusReport {
    pub target_dir: PathBuf,
    pub installation_root: Option<PathBuf>,
    pub expected_target: Option<PathBuf>,
    pub link_path: PathBuf,
    pub link: LinkState,
}

/// Path of the managed link inside `target_dir`
pub fn link_path(target_dir: &Path) -> PathBuf {
    target_dir.join(LINK_NAME)
}

/// Classify `target_dir/.cursor` without touching the filesystem.
///
/// Symlink targets are compared after canonicalization, so a link reaching the
/// rules directory through an aliased or relative path is still correct.
pub fn inspect(target_dir: &Path, root: Option<&RulesRoot>) -> Result<LinkState, LinkError> {
    let path = link_path(target_dir);

    let metadata = match fs::symlink_metadata(&path) {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(LinkState::Absent),
        Err(e) => return Err(io_error("inspect", &path)(e)),
    };

    if !metadata.file_type().is_symlink() {
        return Ok(LinkState::RealDirectory {
            is_dir: metadata.is_dir(),
        });
    }

    let link = fs::read_link(&path).map_err(io_error("read symlink", &path))?;
    let resolved = fs::canonicalize(&path).ok();

    let state = match (root, resolved) {
        (Some(root), Some(resolved)) if resolved == root.rules_dir() => {
            LinkState::CorrectSymlink { target: resolved }
        }
        (root, resolved) => LinkState::WrongSymlink {
            link,
            resolved,
            expected: root.map(|r| r.rules_dir().to_path_buf()),
        },
    };

    Ok(state)
}

/// Build the status snapshot for `target_dir`
pub fn status(
    target_dir: &Path,
    root: Result<&RulesRoot, &RootError>,
) -> Result<StatusReport, LinkError> {
    let root = root.ok();
    Ok(StatusReport {
        target_dir: target_dir.to_path_buf(),
        installation_root: root.map(|r| r.installation().to_path_buf()),
        expected_target: root.map(|r| r.rules_dir().to_path_buf()),
        link_path: link_path(target_dir),
        link: inspect(target_dir, root)?,
    })
}

/// Run `intent` against `target_dir`.
///
/// Setup needs a resolved root and fails with [`LinkError::InstallationNotFound`]
/// otherwise. Unlink ignores both the root and `force`.
pub fn apply(
    target_dir: &Path,
    root: Result<&RulesRoot, &RootError>,
    intent: Intent,
    force: bool,
) -> Result<Outcome, LinkError> {
    match intent {
        Intent::Setup => setup(target_dir, root.map_err(Clone::clone)?, force),
        Intent::Unlink => unlink(target_dir),
    }
}

/// Link `target_dir/.cursor` to the rules directory.
///
/// With `force`, a wrong symlink is replaced and a real directory is moved to
/// `.cursor.backup.<YYYYMMDD_HHMMSS>` first. A failed link creation rolls the
/// replaced entry back; only a failed rollback leaves an intermediate state.
pub fn setup(target_dir: &Path, root: &RulesRoot, force: bool) -> Result<Outcome, LinkError> {
    setup_with(target_dir, root, force, create_symlink)
}

/// [`setup`] with the creation of the new link supplied by the caller
fn setup_with<L>(
    target_dir: &Path,
    root: &RulesRoot,
    force: bool,
    link_to: L,
) -> Result<Outcome, LinkError>
where
    L: FnOnce(&Path, &Path) -> Result<(), LinkError>,
{
    let path = link_path(target_dir);
    let expected = root.rules_dir();

    match inspect(target_dir, Some(root))? {
        LinkState::CorrectSymlink { target } => Ok(Outcome::AlreadyLinked { target }),

        LinkState::WrongSymlink { link, resolved, .. } => {
            let current = resolved.unwrap_or_else(|| link.clone());
            if !force {
                return Err(LinkError::AlreadyLinkedElsewhere {
                    current,
                    expected: expected.to_path_buf(),
                });
            }

            tracing::debug!(link = %path.display(), previous = %link.display(), "Removing old symlink");
            remove_symlink(&path)?;

            with_rollback(
                || link_to(expected, &path),
                || {
                    if let Err(e) = create_symlink(&link, &path) {
                        tracing::warn!(link = %path.display(), error = %e, "Failed to restore previous symlink");
                    }
                },
            )?;

            Ok(Outcome::Linked {
                link: path,
                target: expected.to_path_buf(),
                replaced: Some(current),
                backup: None,
            })
        }

        LinkState::RealDirectory { .. } => {
            if !force {
                return Err(LinkError::AlreadyExists { path });
            }

            let backup = backup_path(target_dir, Local::now());
            move_to_backup(&path, &backup)?;

            with_rollback(
                || link_to(expected, &path),
                || {
                    if let Err(e) = fs::rename(&backup, &path) {
                        tracing::warn!(
                            backup = %backup.display(),
                            error = %e,
                            "Failed to move backup back, original contents remain in the backup"
                        );
                    }
                },
            )?;

            Ok(Outcome::Linked {
                link: path,
                target: expected.to_path_buf(),
                replaced: None,
                backup: Some(backup),
            })
        }

        LinkState::Absent => {
            link_to(expected, &path)?;
            Ok(Outcome::Linked {
                link: path,
                target: expected.to_path_buf(),
                replaced: None,
                backup: None,
            })
        }
    }
}

/// Remove `target_dir/.cursor` if it is a symlink. Real content is never deleted.
pub fn unlink(target_dir: &Path) -> Result<Outcome, LinkError> {
    let path = link_path(target_dir);

    match inspect(target_dir, None)? {
        LinkState::Absent => Ok(Outcome::NothingToRemove),
        LinkState::RealDirectory { .. } => Err(LinkError::NotASymlink { path }),
        LinkState::CorrectSymlink { .. } | LinkState::WrongSymlink { .. } => {
            tracing::debug!(link = %path.display(), "Removing symlink");
            remove_symlink(&path)?;
            Ok(Outcome::Removed { link: path })
        }
    }
}

/// Backup location for a real `.cursor` directory replaced at `now`
pub fn backup_path(target_dir: &Path, now: DateTime<Local>) -> PathBuf {
    target_dir.join(format!(
        "{}{}",
        BACKUP_PREFIX,
        now.format(BACKUP_TIMESTAMP_FORMAT)
    ))
}

fn move_to_backup(path: &Path, backup: &Path) -> Result<(), LinkError> {
    // rename() may replace an existing empty directory, so check first
    if fs::symlink_metadata(backup).is_ok() {
        return Err(LinkError::BackupExists {
            path: backup.to_path_buf(),
        });
    }

    tracing::debug!(from = %path.display(), to = %backup.display(), "Backing up existing entry");
    fs::rename(path, backup).map_err(io_error("back up", path))
}

/// Runs the operation. If it fails, runs the rollback before returning the error.
fn with_rollback<T, F, C>(f: F, cleanup: C) -> Result<T, LinkError>
where
    F: FnOnce() -> Result<T, LinkError>,
    C: FnOnce(),
{
    match f() {
        Ok(value) => Ok(value),
        Err(e) => {
            cleanup();
            Err(e)
        }
    }
}

fn create_symlink(target: &Path, link: &Path) -> Result<(), LinkError> {
    tracing::debug!(link = %link.display(), target = %target.display(), "Creating symlink");

    #[cfg(unix)]
    let result = std::os::unix::fs::symlink(target, link);

    #[cfg(windows)]
    let result = std::os::windows::fs::symlink_dir(target, link);

    result.map_err(io_error("create symlink", link))
}

fn remove_symlink(link: &Path) -> Result<(), LinkError> {
    let result = fs::remove_file(link);

    // Directory symlinks on Windows are removed as directories
    #[cfg(windows)]
    let result = result.or_else(|_| fs::remove_dir(link));

    result.map_err(io_error("remove symlink", link))
}
