//! Session persistence under `.relay/sessions/<id>.json`.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use tracing::debug;

use crate::core::session::Session;
use crate::io::config::write_atomic;

/// Path of the session file for `id` inside `sessions_dir`.
///
/// Rejects ids that are not a single plain path component.
pub fn session_path(sessions_dir: &Path, id: &str) -> Result<PathBuf> {
    let valid = !id.is_empty()
        && id != "."
        && id != ".."
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if !valid {
        return Err(anyhow!("invalid session id '{id}'"));
    }
    Ok(sessions_dir.join(format!("{id}.json")))
}

pub fn load_session(path: &Path) -> Result<Session> {
    debug!(path = %path.display(), "loading session");
    let contents =
        fs::read_to_string(path).with_context(|| format!("read session {}", path.display()))?;
    let session: Session = serde_json::from_str(&contents)
        .with_context(|| format!("parse session {}", path.display()))?;
    debug!(id = session.id(), turns = session.turn_count(), mode = %session.mode(), "session loaded");
    Ok(session)
}

/// Atomically write a session to disk (temp file + rename).
pub fn write_session(path: &Path, session: &Session) -> Result<()> {
    debug!(path = %path.display(), turns = session.turn_count(), "writing session");
    let mut buf = serde_json::to_string_pretty(session).context("serialize session")?;
    buf.push('\n');
    write_atomic(path, &buf, "json.tmp")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{CommandBatch, Mode};

    /// Verifies write then load preserves mode, turns, and the in-flight batch.
    #[test]
    fn session_round_trips_through_disk() {
        let temp = tempfile::tempdir().expect("tempdir");
        let mut session = Session::with_id("s-1", "list files");
        session
            .begin_batch(CommandBatch::from_commands(["pwd", "ls"]).expect("batch"))
            .expect("begin");

        let path = session_path(temp.path(), session.id()).expect("path");
        write_session(&path, &session).expect("write");
        let loaded = load_session(&path).expect("load");

        assert_eq!(loaded, session);
        assert_eq!(loaded.mode(), Mode::AwaitingExecution);
        assert_eq!(loaded.in_flight_batch().map(CommandBatch::len), Some(2));
    }

    #[test]
    fn written_file_ends_with_newline() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("nested/s.json");
        write_session(&path, &Session::with_id("s", "goal")).expect("write");
        let contents = fs::read_to_string(&path).expect("read");
        assert!(contents.ends_with("}\n"));
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[test]
    fn session_path_rejects_traversal() {
        let dir = Path::new("/tmp/sessions");
        assert!(session_path(dir, "../secret").is_err());
        assert!(session_path(dir, "").is_err());
        assert!(session_path(dir, "a/b").is_err());
        assert_eq!(
            session_path(dir, "1f0e-ab").expect("path"),
            dir.join("1f0e-ab.json")
        );
    }

    #[test]
    fn load_missing_session_reports_path() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("nope.json");
        let err = load_session(&path).unwrap_err();
        assert!(format!("{err:#}").contains("nope.json"));
    }
}
