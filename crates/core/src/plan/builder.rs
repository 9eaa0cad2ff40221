//! Resolving a source and an optional revision spec into a [`RebasePlan`].
//!
//! Selection is pure; only [`build_plan`] talks to svn and the editor.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use tracing::info;

use super::{todo, Disposition, MergeGroup, RebasePlan};
use crate::editor::PlanEditor;
use crate::errors::RebaseError;
use crate::history::{self, RevisionRecord};
use crate::revisions::{self, Revnum};
use crate::svn::{SvnClient, SvnRunner};

/// Keep the records named in `wanted` (all of them when `None`), ascending.
///
/// Wanted revisions that do not exist on the source are dropped silently.
pub fn select_records(
    mut records: Vec<RevisionRecord>,
    wanted: Option<&[Revnum]>,
) -> Vec<RevisionRecord> {
    if let Some(wanted) = wanted {
        let wanted: BTreeSet<Revnum> = wanted.iter().copied().collect();
        records.retain(|r| wanted.contains(&r.id));
    }
    records.sort_by_key(|r| r.id);
    records.dedup_by_key(|r| r.id);
    records
}

/// One single-revision `pick` group per record.
pub fn plan_from_records(records: &[RevisionRecord]) -> RebasePlan {
    RebasePlan {
        groups: records.iter().map(|r| MergeGroup::new(r.id)).collect(),
        dispositions: records
            .iter()
            .map(|r| (r.id, Disposition::Pick))
            .collect::<BTreeMap<_, _>>(),
    }
}

/// Build the plan for a fresh run.
///
/// Without a revision spec every revision since the branch point is a
/// candidate; with one, the spec is intersected with the full history of
/// `source`.
pub async fn build_plan<R: SvnRunner, E: PlanEditor>(
    client: &SvnClient<R>,
    editor: &E,
    workdir: &Path,
    source: &str,
    revision_spec: Option<&str>,
    interactive: bool,
) -> Result<RebasePlan, RebaseError> {
    let wanted = revision_spec.map(revisions::parse).transpose()?;
    let records = history::fetch(client, source, wanted.is_none()).await?;
    let candidates = select_records(records, wanted.as_deref());
    info!(
        candidates = %revisions::compact(&candidates.iter().map(|r| r.id).collect::<Vec<_>>()),
        "selected revisions"
    );

    if interactive {
        todo::edit_interactively(editor, workdir, &candidates).await
    } else {
        Ok(plan_from_records(&candidates))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn records(ids: &[Revnum]) -> Vec<RevisionRecord> {
        ids.iter()
            .map(|&id| RevisionRecord {
                id,
                author: "karen".into(),
                date: String::new(),
                message: format!("change {id}"),
            })
            .collect()
    }

    fn ids(records: &[RevisionRecord]) -> Vec<Revnum> {
        records.iter().map(|r| r.id).collect()
    }

    #[test]
    fn test_select_all_sorts_ascending() {
        let selected = select_records(records(&[6643, 6583, 6546]), None);
        assert_eq!(ids(&selected), vec![6546, 6583, 6643]);
    }

    #[test]
    fn test_select_intersects_with_history() {
        let history = records(&[1010, 1008, 1005, 1004, 1000]);
        let wanted = revisions::parse("1004-1006,1008,2000,1004").unwrap();
        let selected = select_records(history, Some(&wanted));
        assert_eq!(ids(&selected), vec![1004, 1005, 1008]);
    }

    #[test]
    fn test_select_nothing_matches() {
        let selected = select_records(records(&[3, 2, 1]), Some(&[7, 8]));
        assert!(selected.is_empty());
    }

    #[test]
    fn test_plan_from_records() {
        let plan = plan_from_records(&records(&[1, 4, 9]));
        assert_eq!(plan.groups.len(), 3);
        assert!(plan.groups.iter().all(|g| g.len() == 1));
        assert_eq!(plan.revisions(), vec![1, 4, 9]);
        assert_eq!(plan.dispositions.get(&4), Some(&Disposition::Pick));
    }
}
