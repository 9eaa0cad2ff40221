//! The resumable rebase state (`svn_rebase.state`).
//!
//! One JSON record per working directory. It is written before every group
//! is merged, so after a halt or crash it lists exactly the groups that still
//! need to be merged and committed.

use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tracing::{debug, info};

use crate::errors::StateError;
use crate::plan::{Disposition, MergeGroup};
use crate::revisions::Revnum;

/// File name of the state record inside the working directory.
pub const STATE_FILE_NAME: &str = "svn_rebase.state";

/// Schema version written by this build.
pub const STATE_VERSION: u32 = 1;

fn default_true() -> bool {
    true
}

/// Everything needed to resume a rebase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RebaseState {
    pub version: u32,

    /// Source URL or path the revisions are merged from.
    pub source: String,

    /// Groups still to be merged, in order.
    pub groups: Vec<MergeGroup>,

    /// Target path handed to `svn merge`.
    #[serde(default)]
    pub destination: Option<String>,

    /// `false` halts after each merge so the operator commits by hand.
    #[serde(default = "default_true")]
    pub auto_commit: bool,

    #[serde(default)]
    pub interactive: bool,

    /// Dispositions chosen in the interactive plan, keyed by the first
    /// revision of each group.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub dispositions: BTreeMap<Revnum, Disposition>,

    pub started_at: DateTime<Utc>,
}

impl RebaseState {
    pub fn new(source: impl Into<String>, groups: Vec<MergeGroup>) -> Self {
        Self {
            version: STATE_VERSION,
            source: source.into(),
            groups,
            destination: None,
            auto_commit: true,
            interactive: false,
            dispositions: BTreeMap::new(),
            started_at: Utc::now(),
        }
    }

    /// Same run, different remaining groups.
    pub fn with_groups(&self, groups: &[MergeGroup]) -> Self {
        Self {
            groups: groups.to_vec(),
            ..self.clone()
        }
    }

    /// Number of revisions still to be merged.
    pub fn pending_revisions(&self) -> usize {
        self.groups.iter().map(MergeGroup::len).sum()
    }
}

/// Reads and writes the state file of one working directory.
#[derive(Debug, Clone)]
pub struct StateStore {
    path: PathBuf,
}

impl StateStore {
    pub fn new(workdir: &Path) -> Self {
        Self {
            path: workdir.join(STATE_FILE_NAME),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Replace the stored record atomically.
    pub fn save(&self, state: &RebaseState) -> Result<(), StateError> {
        let json = serde_json::to_string_pretty(state).map_err(StateError::Serialize)?;
        let dir = self.path.parent().unwrap_or_else(|| Path::new("."));

        let mut tmp = NamedTempFile::new_in(dir)?;
        tmp.write_all(json.as_bytes())?;
        tmp.write_all(b"\n")?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path)?;

        debug!(
            path = %self.path.display(),
            groups = state.groups.len(),
            "saved rebase state"
        );
        Ok(())
    }

    /// Read the record and delete the file; `None` when there is none.
    pub fn load(&self) -> Result<Option<RebaseState>, StateError> {
        let Some(state) = self.peek()? else {
            return Ok(None);
        };
        std::fs::remove_file(&self.path)?;
        info!(path = %self.path.display(), "loaded rebase state");
        Ok(Some(state))
    }

    /// Read the record without consuming it.
    pub fn peek(&self) -> Result<Option<RebaseState>, StateError> {
        let contents = match std::fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        self.decode(&contents).map(Some)
    }

    /// Delete the state file. Returns whether one existed.
    pub fn clear(&self) -> Result<bool, StateError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => {
                info!(path = %self.path.display(), "removed rebase state");
                Ok(true)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    fn decode(&self, contents: &str) -> Result<RebaseState, StateError> {
        let parse_err = |source| StateError::Parse {
            path: self.path.display().to_string(),
            source,
        };
        let value: serde_json::Value = serde_json::from_str(contents).map_err(parse_err)?;

        // Check the version before the shape so a newer schema is reported as such.
        let found = value
            .get("version")
            .and_then(serde_json::Value::as_u64)
            .unwrap_or(0);
        if found > u64::from(STATE_VERSION) {
            return Err(StateError::UnsupportedVersion {
                found: u32::try_from(found).unwrap_or(u32::MAX),
                supported: STATE_VERSION,
            });
        }
        serde_json::from_value(value).map_err(parse_err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_state() -> RebaseState {
        let mut squashed = MergeGroup::new(1000);
        squashed.push(999);
        let mut state = RebaseState::new(
            "https://svn.example.com/repo/branches/feature",
            vec![squashed, MergeGroup::new(1001)],
        );
        state.destination = Some("dir2".into());
        state.interactive = true;
        state.dispositions =
            BTreeMap::from([(1000, Disposition::Edit), (1001, Disposition::Pick)]);
        state
    }

    #[test]
    fn test_save_then_load_consumes() {
        let dir = tempfile::tempdir().unwrap();
        let store = StateStore::new(dir.path());
        let state = sample_state();

        store.save(&state).unwrap();
        assert!(store.exists());
        assert_eq!(store.load().unwrap(), Some(state));
        assert!(!store.exists());
        assert_eq!(store.load().unwrap(), None);
    }

    #[test]
    fn test_peek_keeps_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = StateStore::new(dir.path());
        store.save(&sample_state()).unwrap();

        assert!(store.peek().unwrap().is_some());
        assert!(store.exists());
    }

    #[test]
    fn test_save_replaces_previous_record() {
        let dir = tempfile::tempdir().unwrap();
        let store = StateStore::new(dir.path());
        let state = sample_state();
        store.save(&state).unwrap();

        let rest = state.with_groups(&state.groups[1..]);
        store.save(&rest).unwrap();
        let loaded = store.load().unwrap().unwrap();
        assert_eq!(loaded.groups, vec![MergeGroup::new(1001)]);
        assert_eq!(loaded.started_at, state.started_at);
    }

    #[test]
    fn test_dispositions_survive_save() {
        let dir = tempfile::tempdir().unwrap();
        let store = StateStore::new(dir.path());
        let state = sample_state();
        store.save(&state.with_groups(&state.groups[1..])).unwrap();

        let json = std::fs::read_to_string(store.path()).unwrap();
        assert!(json.contains(r#""1000": "edit""#), "unexpected state: {json}");

        let loaded = store.load().unwrap().unwrap();
        assert_eq!(loaded.dispositions.get(&1000), Some(&Disposition::Edit));
        assert_eq!(loaded.dispositions, state.dispositions);
    }

    #[test]
    fn test_clear_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let store = StateStore::new(dir.path());
        assert!(!store.clear().unwrap());

        store.save(&sample_state()).unwrap();
        assert!(store.clear().unwrap());
        assert!(!store.exists());
        assert!(!store.clear().unwrap());
    }

    #[test]
    fn test_defaults_and_unknown_fields() {
        let dir = tempfile::tempdir().unwrap();
        let store = StateStore::new(dir.path());
        std::fs::write(
            store.path(),
            r#"{
  "version": 1,
  "source": "file:///repo/branch",
  "groups": [[5], [7, 6]],
  "started_at": "2010-07-27T11:14:29Z",
  "written_by": "a later build"
}"#,
        )
        .unwrap();

        let state = store.peek().unwrap().unwrap();
        assert!(state.auto_commit);
        assert!(!state.interactive);
        assert_eq!(state.destination, None);
        assert!(state.dispositions.is_empty());
        assert_eq!(state.groups[1].revisions(), &[7, 6]);
        assert_eq!(state.pending_revisions(), 3);
    }

    #[test]
    fn test_rejects_newer_version() {
        let dir = tempfile::tempdir().unwrap();
        let store = StateStore::new(dir.path());
        std::fs::write(store.path(), r#"{"version": 2, "queue": []}"#).unwrap();

        let err = store.load().unwrap_err();
        assert!(matches!(
            err,
            StateError::UnsupportedVersion {
                found: 2,
                supported: 1
            }
        ));
        assert!(store.exists(), "a rejected state must stay on disk");
    }

    #[test]
    fn test_rejects_garbage_and_empty_groups() {
        let dir = tempfile::tempdir().unwrap();
        let store = StateStore::new(dir.path());

        std::fs::write(store.path(), "not json").unwrap();
        assert!(matches!(store.peek(), Err(StateError::Parse { .. })));

        std::fs::write(
            store.path(),
            r#"{"version":1,"source":"s","groups":[[]],"started_at":"2010-07-27T11:14:29Z"}"#,
        )
        .unwrap();
        assert!(matches!(store.peek(), Err(StateError::Parse { .. })));
    }
}
