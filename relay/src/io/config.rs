//! Relay configuration stored under `.relay/config.toml`.

use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};

use crate::core::danger::{DEFAULT_PATTERNS, DangerPolicy};
use crate::core::exit_policy::{ExitPolicy, ExitRule, default_rules};

/// Relay configuration (TOML).
///
/// Meant to be edited by humans. Missing fields take the defaults below.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct RelayConfig {
    /// Per-command wall-clock limit in seconds.
    pub command_timeout_secs: u64,

    /// Keep at most this many bytes of stdout (and of stderr) per command.
    pub output_limit_bytes: usize,

    /// Shell prefix each command is appended to (e.g. `["sh","-c"]`).
    pub shell: Vec<String>,

    /// Human reply that resumes an interrupted session.
    pub continue_token: String,

    /// Upper bound on batches issued by one `relay play` run.
    pub max_batches: u32,

    pub exit_rules: Vec<ExitRule>,

    pub danger: DangerConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct DangerConfig {
    /// Regexes that flag a command as dangerous (advisory).
    pub patterns: Vec<String>,
}

impl Default for DangerConfig {
    fn default() -> Self {
        Self {
            patterns: DEFAULT_PATTERNS.iter().map(|p| (*p).to_string()).collect(),
        }
    }
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            command_timeout_secs: 10 * 60,
            output_limit_bytes: 100_000,
            shell: vec!["sh".to_string(), "-c".to_string()],
            continue_token: "continue".to_string(),
            max_batches: 50,
            exit_rules: default_rules(),
            danger: DangerConfig::default(),
        }
    }
}

impl RelayConfig {
    pub fn validate(&self) -> Result<()> {
        if self.command_timeout_secs == 0 {
            return Err(anyhow!("command_timeout_secs must be > 0"));
        }
        if self.output_limit_bytes == 0 {
            return Err(anyhow!("output_limit_bytes must be > 0"));
        }
        if self.max_batches == 0 {
            return Err(anyhow!("max_batches must be > 0"));
        }
        if self.shell.is_empty() || self.shell[0].trim().is_empty() {
            return Err(anyhow!("shell must be a non-empty array"));
        }
        if self.continue_token.trim().is_empty() {
            return Err(anyhow!("continue_token must not be blank"));
        }
        if let Some(rule) = self.exit_rules.iter().find(|r| r.prefix.trim().is_empty()) {
            return Err(anyhow!(
                "exit_rules prefix must not be blank (accepted {:?})",
                rule.accepted
            ));
        }
        self.danger_policy()?;
        Ok(())
    }

    pub fn command_timeout(&self) -> Duration {
        Duration::from_secs(self.command_timeout_secs)
    }

    pub fn exit_policy(&self) -> ExitPolicy {
        ExitPolicy::new(self.exit_rules.clone())
    }

    pub fn danger_policy(&self) -> Result<DangerPolicy> {
        DangerPolicy::new(self.danger.patterns.as_slice()).context("danger.patterns")
    }
}

/// Load config from a TOML file.
///
/// If the file is missing, returns `RelayConfig::default()`.
pub fn load_config(path: &Path) -> Result<RelayConfig> {
    if !path.exists() {
        let cfg = RelayConfig::default();
        cfg.validate()?;
        return Ok(cfg);
    }
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let cfg: RelayConfig =
        toml::from_str(&contents).with_context(|| format!("parse {}", path.display()))?;
    cfg.validate()
        .with_context(|| format!("validate {}", path.display()))?;
    Ok(cfg)
}

/// Atomically write config to disk (temp file + rename).
pub fn write_config(path: &Path, cfg: &RelayConfig) -> Result<()> {
    cfg.validate()?;
    let mut buf = toml::to_string_pretty(cfg).context("serialize config toml")?;
    buf.push('\n');
    write_atomic(path, &buf, "toml.tmp")
}

pub(crate) fn write_atomic(path: &Path, contents: &str, tmp_extension: &str) -> Result<()> {
    let parent = path
        .parent()
        .with_context(|| format!("path missing parent {}", path.display()))?;
    fs::create_dir_all(parent).with_context(|| format!("create directory {}", parent.display()))?;
    let tmp_path = path.with_extension(tmp_extension);
    fs::write(&tmp_path, contents)
        .with_context(|| format!("write temp file {}", tmp_path.display()))?;
    fs::rename(&tmp_path, path).with_context(|| format!("replace {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_missing_returns_default() {
        let temp = tempfile::tempdir().expect("tempdir");
        let cfg = load_config(&temp.path().join("missing.toml")).expect("load");
        assert_eq!(cfg, RelayConfig::default());
        assert_eq!(cfg.continue_token, "continue");
        assert_eq!(cfg.exit_policy().accepted_codes("grep x"), &[0, 1]);
    }

    #[test]
    fn write_then_load_round_trips() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("config.toml");
        let mut cfg = RelayConfig::default();
        cfg.exit_rules.push(ExitRule::new("test", vec![0, 1]));
        write_config(&path, &cfg).expect("write");
        let loaded = load_config(&path).expect("load");
        assert_eq!(loaded, cfg);
    }

    #[test]
    fn partial_file_fills_defaults() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("config.toml");
        fs::write(&path, "continue_token = \"go\"\n").expect("write");
        let cfg = load_config(&path).expect("load");
        assert_eq!(cfg.continue_token, "go");
        assert_eq!(cfg.shell, vec!["sh".to_string(), "-c".to_string()]);
        assert_eq!(cfg.command_timeout(), Duration::from_secs(600));
    }

    #[test]
    fn validate_rejects_bad_values() {
        let mut cfg = RelayConfig {
            command_timeout_secs: 0,
            ..RelayConfig::default()
        };
        assert!(cfg.validate().is_err());

        cfg = RelayConfig {
            shell: Vec::new(),
            ..RelayConfig::default()
        };
        assert!(cfg.validate().is_err());

        cfg = RelayConfig {
            continue_token: "  ".to_string(),
            ..RelayConfig::default()
        };
        assert!(cfg.validate().is_err());

        cfg = RelayConfig::default();
        cfg.danger.patterns.push("(".to_string());
        let err = cfg.validate().unwrap_err();
        assert!(format!("{err:#}").contains("danger.patterns"));
    }
}
