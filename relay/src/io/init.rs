//! Initialization helpers for `.relay/` scaffolding.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use tracing::info;

use super::config::{RelayConfig, write_config};

const RELAY_GITIGNORE: &str = "sessions/\n";

/// All canonical paths within `.relay/` for a project root.
#[derive(Debug, Clone)]
pub struct RelayPaths {
    pub root: PathBuf,
    pub relay_dir: PathBuf,
    pub sessions_dir: PathBuf,
    pub config_path: PathBuf,
    pub gitignore_path: PathBuf,
}

impl RelayPaths {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let relay_dir = root.join(".relay");
        Self {
            root: root.clone(),
            relay_dir: relay_dir.clone(),
            sessions_dir: relay_dir.join("sessions"),
            config_path: relay_dir.join("config.toml"),
            gitignore_path: relay_dir.join(".gitignore"),
        }
    }
}

/// Options for `init_relay`.
#[derive(Debug, Clone)]
pub struct InitOptions {
    /// If true, overwrite existing relay-owned files.
    pub force: bool,
}

/// Create `.relay/` scaffolding in `root`.
///
/// Fails if `.relay/` already exists unless `options.force` is set. Existing
/// session files are never removed.
pub fn init_relay(root: &Path, options: &InitOptions) -> Result<RelayPaths> {
    let paths = RelayPaths::new(root);
    if paths.relay_dir.exists() && !paths.relay_dir.is_dir() {
        return Err(anyhow!("relay init: .relay exists but is not a directory"));
    }
    if paths.relay_dir.exists() && !options.force {
        return Err(anyhow!(
            "relay init: .relay already exists (use --force to overwrite)"
        ));
    }

    fs::create_dir_all(&paths.sessions_dir)
        .with_context(|| format!("create directory {}", paths.sessions_dir.display()))?;
    fs::write(&paths.gitignore_path, RELAY_GITIGNORE)
        .with_context(|| format!("write file {}", paths.gitignore_path.display()))?;
    write_config(&paths.config_path, &RelayConfig::default())?;

    info!(root = %paths.root.display(), "initialized .relay");
    Ok(paths)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::config::load_config;

    #[test]
    fn init_creates_config_and_sessions_dir() {
        let temp = tempfile::tempdir().expect("tempdir");
        let paths = init_relay(temp.path(), &InitOptions { force: false }).expect("init");

        assert!(paths.sessions_dir.is_dir());
        assert!(paths.gitignore_path.is_file());
        let cfg = load_config(&paths.config_path).expect("load");
        assert_eq!(cfg, RelayConfig::default());
    }

    #[test]
    fn init_refuses_existing_without_force() {
        let temp = tempfile::tempdir().expect("tempdir");
        init_relay(temp.path(), &InitOptions { force: false }).expect("init");
        let err = init_relay(temp.path(), &InitOptions { force: false }).unwrap_err();
        assert!(err.to_string().contains("already exists"));
    }

    #[test]
    fn force_rewrites_config_and_keeps_sessions() {
        let temp = tempfile::tempdir().expect("tempdir");
        let paths = init_relay(temp.path(), &InitOptions { force: false }).expect("init");
        let kept = paths.sessions_dir.join("old.json");
        fs::write(&kept, "{}").expect("write session");
        fs::write(&paths.config_path, "continue_token = \"go\"\n").expect("edit config");

        init_relay(temp.path(), &InitOptions { force: true }).expect("force init");
        assert!(kept.exists());
        let cfg = load_config(&paths.config_path).expect("load");
        assert_eq!(cfg.continue_token, "continue");
    }
}
