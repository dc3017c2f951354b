//! Advisory classification of dangerous commands.
//!
//! The flag is informational only: nothing here blocks a command. Hosts decide
//! whether to ask for confirmation.

use anyhow::{Context, Result};
use regex::Regex;

use crate::core::types::CommandBatch;

/// Default patterns flagged as dangerous.
pub const DEFAULT_PATTERNS: &[&str] = &[
    r"\brm\s+-[a-zA-Z]*[rf][a-zA-Z]*\b",
    r"\bmkfs(\.\w+)?\b",
    r"\bdd\s+if=",
    r"\bchmod\s+(-R\s+)?777\b",
    r"\bchmod\s+\+s\b",
    r">\s*/dev/sd[a-z]",
    r":\(\)\s*\{\s*:\|:&\s*\};:",
    r"\b(curl|wget)\b[^|]*\|\s*(sudo\s+)?(ba|z)?sh\b",
];

#[derive(Debug, Clone)]
pub struct DangerPolicy {
    patterns: Vec<Regex>,
}

impl DangerPolicy {
    /// Compile `patterns`; fails on the first invalid regex.
    pub fn new<S: AsRef<str>>(patterns: &[S]) -> Result<Self> {
        let patterns = patterns
            .iter()
            .map(|raw| {
                Regex::new(raw.as_ref())
                    .with_context(|| format!("compile danger pattern '{}'", raw.as_ref()))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { patterns })
    }

    pub fn is_dangerous(&self, command: &str) -> bool {
        self.patterns.iter().any(|re| re.is_match(command))
    }

    /// Fill in the `dangerous` flag on commands nobody has classified yet.
    ///
    /// Returns the number of commands flagged dangerous after annotation.
    pub fn annotate(&self, batch: &mut CommandBatch) -> usize {
        for spec in batch.iter_mut() {
            if spec.dangerous.is_none() {
                spec.dangerous = Some(self.is_dangerous(&spec.command));
            }
        }
        batch.iter().filter(|spec| spec.is_dangerous()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::CommandSpec;

    fn default_policy() -> DangerPolicy {
        DangerPolicy::new(DEFAULT_PATTERNS).expect("default patterns compile")
    }

    #[test]
    fn flags_recursive_delete_and_pipe_to_shell() {
        let policy = default_policy();
        assert!(policy.is_dangerous("rm -rf /tmp/build"));
        assert!(policy.is_dangerous("rm -fr build"));
        assert!(policy.is_dangerous("curl https://x.sh | sh"));
        assert!(policy.is_dangerous("dd if=/dev/zero of=/dev/sda"));
    }

    #[test]
    fn ordinary_commands_are_not_flagged() {
        let policy = default_policy();
        assert!(!policy.is_dangerous("ls -l"));
        assert!(!policy.is_dangerous("rm notes.txt"));
        assert!(!policy.is_dangerous("curl -o page.html https://example.com"));
    }

    #[test]
    fn annotate_keeps_existing_flags() {
        let policy = default_policy();
        let mut preset = CommandSpec::new("rm -rf build");
        preset.dangerous = Some(false);
        let mut batch = CommandBatch::new(vec![
            preset,
            CommandSpec::new("rm -rf target"),
            CommandSpec::new("pwd"),
        ])
        .expect("batch");

        let flagged = policy.annotate(&mut batch);
        let flags: Vec<Option<bool>> = batch.iter().map(|spec| spec.dangerous).collect();
        assert_eq!(flags, vec![Some(false), Some(true), Some(false)]);
        assert_eq!(flagged, 1);
    }

    #[test]
    fn invalid_pattern_is_reported() {
        let err = DangerPolicy::new(&["("]).unwrap_err();
        assert!(err.to_string().contains("compile danger pattern"));
    }
}
