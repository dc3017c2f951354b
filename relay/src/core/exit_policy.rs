//! Per-command accepted exit codes.
//!
//! Some tools use non-zero codes for ordinary answers (`grep` exits 1 when
//! nothing matched, `diff` exits 1 when files differ). The policy maps a
//! command prefix to the codes that count as success; the first matching rule
//! wins and unmatched commands accept only `0`.

use serde::{Deserialize, Serialize};

use crate::core::types::ExitStatus;

const DEFAULT_ACCEPTED: &[i32] = &[0];

/// One prefix rule, e.g. `grep -> [0, 1]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExitRule {
    pub prefix: String,
    pub accepted: Vec<i32>,
}

impl ExitRule {
    pub fn new(prefix: impl Into<String>, accepted: Vec<i32>) -> Self {
        Self {
            prefix: prefix.into(),
            accepted,
        }
    }
}

/// Default rules: `grep` and `diff` accept `0` and `1`.
pub fn default_rules() -> Vec<ExitRule> {
    vec![ExitRule::new("grep", vec![0, 1]), ExitRule::new("diff", vec![0, 1])]
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExitPolicy {
    rules: Vec<ExitRule>,
}

impl Default for ExitPolicy {
    fn default() -> Self {
        Self::new(default_rules())
    }
}

impl ExitPolicy {
    pub fn new(rules: Vec<ExitRule>) -> Self {
        Self { rules }
    }

    /// Accepted codes for `command`.
    pub fn accepted_codes(&self, command: &str) -> &[i32] {
        let command = command.trim_start();
        self.rules
            .iter()
            .find(|rule| matches_prefix(command, &rule.prefix))
            .map(|rule| rule.accepted.as_slice())
            .unwrap_or(DEFAULT_ACCEPTED)
    }

    /// Judge a raw exit code. A timeout or a missing code is abnormal.
    pub fn judge(&self, command: &str, code: Option<i32>, timed_out: bool) -> ExitStatus {
        if timed_out {
            return ExitStatus::Abnormal {
                reason: "timed out".to_string(),
            };
        }
        match code {
            None => ExitStatus::Abnormal {
                reason: "terminated without an exit code".to_string(),
            },
            Some(code) if self.accepted_codes(command).contains(&code) => {
                ExitStatus::Success { code }
            }
            Some(code) => ExitStatus::Failure { code },
        }
    }
}

/// True if `command` starts with `prefix` as whole words (`grepx` is not `grep`).
fn matches_prefix(command: &str, prefix: &str) -> bool {
    let prefix = prefix.trim();
    if prefix.is_empty() {
        return false;
    }
    match command.strip_prefix(prefix) {
        Some(rest) => rest.is_empty() || rest.starts_with(char::is_whitespace),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grep_accepts_no_match_exit_code() {
        let policy = ExitPolicy::default();
        assert_eq!(
            policy.judge("grep foo file.txt", Some(1), false),
            ExitStatus::Success { code: 1 }
        );
        assert_eq!(
            policy.judge("grep foo file.txt", Some(2), false),
            ExitStatus::Failure { code: 2 }
        );
    }

    #[test]
    fn unmatched_command_accepts_only_zero() {
        let policy = ExitPolicy::default();
        assert_eq!(policy.accepted_codes("ls -l"), &[0]);
        assert_eq!(
            policy.judge("ls -l", Some(1), false),
            ExitStatus::Failure { code: 1 }
        );
    }

    #[test]
    fn similar_prefix_does_not_match() {
        let policy = ExitPolicy::default();
        assert_eq!(policy.accepted_codes("grepx foo"), &[0]);
        assert_eq!(policy.accepted_codes("  diff a b"), &[0, 1]);
    }

    #[test]
    fn first_matching_rule_wins() {
        let policy = ExitPolicy::new(vec![
            ExitRule::new("git diff", vec![0, 1]),
            ExitRule::new("git", vec![0]),
        ]);
        assert_eq!(policy.accepted_codes("git diff --quiet"), &[0, 1]);
        assert_eq!(policy.accepted_codes("git status"), &[0]);
    }

    #[test]
    fn timeout_and_missing_code_are_abnormal() {
        let policy = ExitPolicy::default();
        assert!(matches!(
            policy.judge("sleep 100", Some(0), true),
            ExitStatus::Abnormal { .. }
        ));
        assert!(matches!(
            policy.judge("kill -9 $$", None, false),
            ExitStatus::Abnormal { .. }
        ));
    }
}
