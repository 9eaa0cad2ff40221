//! Entry points of the rebase workflow, bound to one working copy.

use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::commit_message;
use crate::config::RebaseConfig;
use crate::editor::{ExternalEditor, PlanEditor};
use crate::errors::{RebaseError, SvnError};
use crate::plan::{self, MergeGroup};
use crate::revisions::Revnum;
use crate::sequencer::{self, Halt, HaltKind, MergedGroup, RunOutcome, Sequencer};
use crate::state::{RebaseState, StateStore};
use crate::svn::{ProcessRunner, SvnClient, SvnRunner};

/// Property listing the revisions `svnmerge` has already integrated.
const INTEGRATED_PROPERTY: &str = "svnmerge-integrated";

/// Parameters of a fresh rebase.
#[derive(Debug, Clone)]
pub struct RebaseRequest {
    pub source: String,
    /// Revision spec such as `1000-1005,1008`; all revisions since the
    /// branch point when `None`.
    pub revisions: Option<String>,
    pub destination: Option<String>,
    pub auto_commit: bool,
    pub interactive: bool,
}

impl RebaseRequest {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            revisions: None,
            destination: None,
            auto_commit: true,
            interactive: false,
        }
    }
}

/// The svn client, editor and state store of one working directory.
pub struct RebaseContext<R, E> {
    client: SvnClient<R>,
    editor: E,
    store: StateStore,
    workdir: PathBuf,
}

impl RebaseContext<ProcessRunner, ExternalEditor> {
    /// Context that runs the configured svn binary and editor in `workdir`.
    pub fn from_config(config: &RebaseConfig, workdir: impl Into<PathBuf>) -> Self {
        let workdir = workdir.into();
        let runner = ProcessRunner::new(&config.svn.binary, &workdir, config.svn.auth());
        let editor = ExternalEditor::resolve(config.editor.command.as_deref());
        Self::new(runner, editor, workdir)
    }
}

impl<R: SvnRunner, E: PlanEditor> RebaseContext<R, E> {
    pub fn new(runner: R, editor: E, workdir: impl Into<PathBuf>) -> Self {
        let workdir = workdir.into();
        Self {
            client: SvnClient::new(runner),
            editor,
            store: StateStore::new(&workdir),
            workdir,
        }
    }

    pub fn client(&self) -> &SvnClient<R> {
        &self.client
    }

    pub fn editor(&self) -> &E {
        &self.editor
    }

    pub fn store(&self) -> &StateStore {
        &self.store
    }

    pub fn workdir(&self) -> &Path {
        &self.workdir
    }

    /// Plan and run a fresh rebase.
    pub async fn start(&self, request: RebaseRequest) -> Result<RunOutcome, RebaseError> {
        if self.store.exists() {
            return Err(RebaseError::AlreadyInProgress(
                self.store.path().display().to_string(),
            ));
        }

        let plan = plan::build_plan(
            &self.client,
            &self.editor,
            &self.workdir,
            &request.source,
            request.revisions.as_deref(),
            request.interactive,
        )
        .await?;
        info!(
            source = %request.source,
            groups = plan.groups.len(),
            revisions = plan.revisions().len(),
            "planned rebase"
        );

        let mut state = RebaseState::new(request.source, plan.groups);
        state.destination = request.destination;
        state.auto_commit = request.auto_commit;
        state.interactive = request.interactive;
        state.dispositions = plan.dispositions;

        Sequencer::new(&self.client, &self.store, &self.workdir)
            .run(state)
            .await
    }

    /// Continue the saved rebase.
    pub async fn resume(&self) -> Result<RunOutcome, RebaseError> {
        let state = self.store.load()?.ok_or(RebaseError::NoRebaseInProgress)?;
        info!(
            source = %state.source,
            groups = state.groups.len(),
            started_at = %state.started_at,
            "resuming rebase"
        );
        Sequencer::new(&self.client, &self.store, &self.workdir)
            .run(state)
            .await
    }

    /// Forget the saved rebase. Returns whether there was one.
    ///
    /// The working copy itself is left as it is.
    pub fn abort(&self) -> Result<bool, RebaseError> {
        Ok(self.store.clear()?)
    }

    /// The saved rebase, if any, without consuming it.
    pub fn status(&self) -> Result<Option<RebaseState>, RebaseError> {
        Ok(self.store.peek()?)
    }

    /// Revisions already integrated according to `svnmerge` bookkeeping.
    pub async fn available(&self) -> Result<String, RebaseError> {
        Ok(self.client.propget(INTEGRATED_PROPERTY, ".").await?)
    }

    /// Merge a single revision and prepare its commit message, committing it
    /// when `auto_commit` is set. No state file is involved.
    pub async fn merge_single(
        &self,
        source: &str,
        rev: Revnum,
        destination: Option<&str>,
        auto_commit: bool,
    ) -> Result<RunOutcome, RebaseError> {
        let group = MergeGroup::new(rev);
        let message =
            sequencer::merge_group(&self.client, source, destination, &group, &self.workdir)
                .await?;
        let message_file = commit_message::message_path(&self.workdir);

        let halt = |kind| RunOutcome {
            merged: Vec::new(),
            halt: Some(Halt {
                kind,
                group: group.clone(),
                message_file: message_file.clone(),
            }),
        };
        if !auto_commit {
            return Ok(halt(HaltKind::ManualCommit));
        }

        let relative = Path::new(commit_message::MESSAGE_FILE_NAME);
        match self.client.commit(relative).await {
            Ok(_) => {}
            Err(SvnError::CommandFailed { stderr, .. }) => {
                warn!(rev, %stderr, "commit failed");
                return Ok(halt(HaltKind::Conflict));
            }
            Err(e) => return Err(e.into()),
        }
        if let Err(e) = std::fs::remove_file(&message_file) {
            warn!(error = %e, "failed to remove commit message file");
        }
        self.client.update().await?;

        Ok(RunOutcome {
            merged: vec![MergedGroup {
                revisions: vec![rev],
                message,
            }],
            halt: None,
        })
    }
}
