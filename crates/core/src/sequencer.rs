//! The merge sequencer: replays planned groups one commit at a time.
//!
//! State is saved before each group is merged, never after, so the state
//! file always lists every group that has not been committed yet.

use std::fmt;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::commit_message;
use crate::errors::{RebaseError, SvnError};
use crate::history;
use crate::plan::{Disposition, MergeGroup};
use crate::revisions::Revnum;
use crate::state::{RebaseState, StateStore};
use crate::svn::{SvnClient, SvnRunner};

/// Where a run currently is; logged at every transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequencerState {
    Planning,
    Running,
    HaltedForConflict,
    HaltedForManualCommit,
    Done,
}

impl fmt::Display for SequencerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Planning => "planning",
            Self::Running => "running",
            Self::HaltedForConflict => "halted for conflict",
            Self::HaltedForManualCommit => "halted for manual commit",
            Self::Done => "done",
        };
        f.write_str(s)
    }
}

/// Why a run stopped before the last group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HaltKind {
    /// `svn commit` failed, usually because of conflicts.
    Conflict,
    /// Manual-commit mode: the operator commits each group.
    ManualCommit,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Halt {
    pub kind: HaltKind,
    /// The group that is merged but not committed.
    pub group: MergeGroup,
    /// Message file prepared for the pending commit.
    pub message_file: PathBuf,
}

/// A group that was merged and committed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergedGroup {
    pub revisions: Vec<Revnum>,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunOutcome {
    pub merged: Vec<MergedGroup>,
    pub halt: Option<Halt>,
}

impl RunOutcome {
    pub fn is_complete(&self) -> bool {
        self.halt.is_none()
    }

    pub fn state(&self) -> SequencerState {
        match self.halt.as_ref().map(|h| h.kind) {
            None => SequencerState::Done,
            Some(HaltKind::Conflict) => SequencerState::HaltedForConflict,
            Some(HaltKind::ManualCommit) => SequencerState::HaltedForManualCommit,
        }
    }
}

/// Drives one run over the groups of a [`RebaseState`].
pub struct Sequencer<'a, R> {
    client: &'a SvnClient<R>,
    store: &'a StateStore,
    workdir: &'a Path,
}

impl<'a, R: SvnRunner> Sequencer<'a, R> {
    pub fn new(client: &'a SvnClient<R>, store: &'a StateStore, workdir: &'a Path) -> Self {
        Self {
            client,
            store,
            workdir,
        }
    }

    /// Merge and commit every group of `state` in order.
    ///
    /// `state` is saved before any svn command runs, so a failing pre-flight
    /// check leaves the run resumable. A working copy with local
    /// modifications is refused before anything is merged.
    pub async fn run(&self, state: RebaseState) -> Result<RunOutcome, RebaseError> {
        transition(SequencerState::Planning);
        self.store.save(&state)?;
        if self.client.has_local_modifications().await? {
            warn!("working copy has local modifications, saved state without merging");
            return Err(RebaseError::LocalModifications);
        }

        // A commit made by hand leaves a mixed-revision working copy, which
        // svn refuses to merge into.
        self.client.update().await?;

        transition(SequencerState::Running);
        let mut outcome = RunOutcome::default();
        for (i, group) in state.groups.iter().enumerate() {
            self.store.save(&state.with_groups(&state.groups[i..]))?;
            info!(
                group = %group,
                step = i + 1,
                total = state.groups.len(),
                "merging group"
            );
            if state.dispositions.get(&group.first()) == Some(&Disposition::Edit) {
                info!(revision = group.first(), "revision is marked for edit");
            }

            let message = merge_group(
                self.client,
                &state.source,
                state.destination.as_deref(),
                group,
                self.workdir,
            )
            .await?;
            let message_file = commit_message::message_path(self.workdir);

            if !state.auto_commit {
                self.store.save(&state.with_groups(&state.groups[i + 1..]))?;
                transition(SequencerState::HaltedForManualCommit);
                outcome.halt = Some(Halt {
                    kind: HaltKind::ManualCommit,
                    group: group.clone(),
                    message_file,
                });
                return Ok(outcome);
            }

            // svn runs inside the working directory, so the bare name resolves.
            let relative = Path::new(commit_message::MESSAGE_FILE_NAME);
            match self.client.commit(relative).await {
                Ok(_) => {}
                Err(SvnError::CommandFailed { stderr, .. }) => {
                    warn!(group = %group, %stderr, "commit failed, leaving merge for the operator");
                    transition(SequencerState::HaltedForConflict);
                    outcome.halt = Some(Halt {
                        kind: HaltKind::Conflict,
                        group: group.clone(),
                        message_file,
                    });
                    return Ok(outcome);
                }
                Err(e) => return Err(e.into()),
            }

            if let Err(e) = std::fs::remove_file(&message_file) {
                warn!(error = %e, "failed to remove commit message file");
            }
            self.client.update().await?;
            info!(group = %group, message = %message, "merged");
            outcome.merged.push(MergedGroup {
                revisions: group.revisions().to_vec(),
                message,
            });
        }

        self.store.clear()?;
        transition(SequencerState::Done);
        Ok(outcome)
    }
}

fn transition(state: SequencerState) {
    info!(state = %state, "sequencer state");
}

/// Merge every revision of `group` into the working copy and write the
/// commit message file for it. Returns the message.
///
/// The message is built from the log of the group's last revision.
pub async fn merge_group<R: SvnRunner>(
    client: &SvnClient<R>,
    source: &str,
    destination: Option<&str>,
    group: &MergeGroup,
    workdir: &Path,
) -> Result<String, RebaseError> {
    for &rev in group.revisions() {
        client.merge(rev, source, destination).await?;
    }

    let record = history::fetch_one(client, group.last(), source).await?;
    let message = commit_message::synthesize(&record);
    let path = commit_message::message_path(workdir);
    std::fs::write(&path, &message).map_err(|e| RebaseError::MessageFile {
        path: path.display().to_string(),
        source: e,
    })?;
    Ok(message)
}
