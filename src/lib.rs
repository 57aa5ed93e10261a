//! DevEnv - shared Cursor rules for every project
//!
//! Keeps a project's `.cursor` directory as a symbolic link to one central
//! `cursor-rules` directory, so every linked project sees the same rules.

pub mod config;
pub mod diagnostics;
pub mod linker;
pub mod resources;

pub use config::{Config, RootError, RootNotFound, RulesRoot, resolve_root};
pub use diagnostics::{Check, DiagnosticReport, diagnose};
pub use linker::{Intent, LinkError, LinkState, Outcome, StatusReport, apply, inspect};
