//! The interactive plan file (`svn_rebase.todo`).
//!
//! The operator receives one `pick` line per candidate revision and may
//! drop lines or change their command before the plan is read back. Picked
//! revisions must stay in ascending order; only `squash` may fold an older
//! revision into the group above it.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use super::{Disposition, MergeGroup, PlanCommand, RebasePlan};
use crate::editor::PlanEditor;
use crate::errors::{PlanError, RebaseError};
use crate::history::RevisionRecord;
use crate::revisions::Revnum;

/// File name of the plan inside the working directory.
pub const PLAN_FILE_NAME: &str = "svn_rebase.todo";

/// Width of the message excerpt on each plan line.
const SUMMARY_WIDTH: usize = 72;

const HELP_TEXT: &str = "\
#
# Commands:
#  p, pick <revision> = merge and commit the revision
#  e, edit <revision> = merge and commit the revision, marked for review
#  s, squash <revision> = merge into the previous commit
#
# Lines are merged from top to bottom.
# Keep pick and edit lines in ascending revision order.
# The commit of a squashed group uses the message of its last revision.
# Remove a line to skip that revision.
# If you remove everything, nothing will be merged.
";

/// Path of the plan file for a working directory.
pub fn plan_path(workdir: &Path) -> PathBuf {
    workdir.join(PLAN_FILE_NAME)
}

/// Render the proposed plan, one `pick` line per record.
pub fn render_plan(records: &[RevisionRecord]) -> String {
    let mut text = String::new();
    for record in records {
        let summary: String = record.summary().chars().take(SUMMARY_WIDTH).collect();
        text.push_str(&format!("pick {} {}", record.id, summary).trim_end());
        text.push('\n');
    }
    text.push_str(HELP_TEXT);
    text
}

/// Parse an edited plan.
///
/// Blank lines and lines starting with `#` are skipped. Every revision must
/// come from `allowed`, may appear only once, and each pick/edit must follow
/// the previous group's first revision.
pub fn read_plan(text: &str, allowed: &BTreeSet<Revnum>) -> Result<RebasePlan, PlanError> {
    let mut groups: Vec<MergeGroup> = Vec::new();
    let mut dispositions = BTreeMap::new();
    let mut seen = BTreeSet::new();

    for (idx, raw) in text.lines().enumerate() {
        let line = idx + 1;
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        let mut fields = trimmed.split_whitespace();
        let command = match fields.next() {
            Some(word) => word
                .parse::<PlanCommand>()
                .map_err(|command| PlanError::UnknownCommand { line, command })?,
            None => continue,
        };
        let field = fields.next().ok_or(PlanError::MissingRevision { line })?;
        let revision = field
            .parse::<Revnum>()
            .map_err(|_| PlanError::InvalidRevision {
                line,
                field: field.to_string(),
            })?;
        if !allowed.contains(&revision) {
            return Err(PlanError::UnknownRevision { line, revision });
        }
        if !seen.insert(revision) {
            return Err(PlanError::DuplicateRevision { line, revision });
        }

        match command {
            PlanCommand::Squash => match groups.last_mut() {
                Some(group) => group.push(revision),
                None => return Err(PlanError::SquashFirst { line, revision }),
            },
            PlanCommand::Pick | PlanCommand::Edit => {
                if let Some(previous) = groups.last().map(MergeGroup::first) {
                    if revision <= previous {
                        return Err(PlanError::OutOfOrder {
                            line,
                            revision,
                            previous,
                        });
                    }
                }
                let disposition = if command == PlanCommand::Edit {
                    Disposition::Edit
                } else {
                    Disposition::Pick
                };
                dispositions.insert(revision, disposition);
                groups.push(MergeGroup::new(revision));
            }
        }
    }

    debug!(groups = groups.len(), "parsed interactive plan");
    Ok(RebasePlan {
        groups,
        dispositions,
    })
}

/// Write the proposed plan and let the operator edit it.
///
/// The plan file is removed again if the editor fails.
pub async fn propose<E: PlanEditor>(
    editor: &E,
    workdir: &Path,
    records: &[RevisionRecord],
) -> Result<PathBuf, RebaseError> {
    let path = plan_path(workdir);
    std::fs::write(&path, render_plan(records)).map_err(PlanError::Io)?;
    info!(path = %path.display(), candidates = records.len(), "wrote interactive plan");

    if let Err(e) = editor.edit(&path).await {
        if let Err(rm) = std::fs::remove_file(&path) {
            warn!(error = %rm, "failed to remove plan file");
        }
        return Err(e.into());
    }
    Ok(path)
}

/// Read back the edited plan file and delete it.
pub fn collect(workdir: &Path, allowed: &BTreeSet<Revnum>) -> Result<RebasePlan, PlanError> {
    let path = plan_path(workdir);
    let text = std::fs::read_to_string(&path)?;
    let plan = read_plan(&text, allowed)?;
    std::fs::remove_file(&path)?;
    Ok(plan)
}

/// Propose `records` to the operator and return the plan they saved.
pub async fn edit_interactively<E: PlanEditor>(
    editor: &E,
    workdir: &Path,
    records: &[RevisionRecord],
) -> Result<RebasePlan, RebaseError> {
    propose(editor, workdir, records).await?;
    let allowed: BTreeSet<Revnum> = records.iter().map(|r| r.id).collect();
    Ok(collect(workdir, &allowed)?)
}
