//! Rebase plans: which revisions are merged, grouped into which commits.

pub mod builder;
pub mod todo;

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::revisions::{self, Revnum};

pub use builder::{build_plan, plan_from_records, select_records};

/// Revisions merged in order and committed as one commit.
///
/// Always holds at least one revision. Serialized as a plain JSON array.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Revnum>", into = "Vec<Revnum>")]
pub struct MergeGroup(Vec<Revnum>);

impl MergeGroup {
    pub fn new(first: Revnum) -> Self {
        Self(vec![first])
    }

    /// Fold another revision into this group.
    pub fn push(&mut self, rev: Revnum) {
        self.0.push(rev);
    }

    pub fn first(&self) -> Revnum {
        self.0[0]
    }

    /// The revision whose log message the commit is based on.
    pub fn last(&self) -> Revnum {
        self.0[self.0.len() - 1]
    }

    pub fn revisions(&self) -> &[Revnum] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always false; kept for symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        false
    }
}

impl TryFrom<Vec<Revnum>> for MergeGroup {
    type Error = String;

    fn try_from(revs: Vec<Revnum>) -> Result<Self, Self::Error> {
        if revs.is_empty() {
            Err("a merge group must contain at least one revision".into())
        } else {
            Ok(Self(revs))
        }
    }
}

impl From<MergeGroup> for Vec<Revnum> {
    fn from(group: MergeGroup) -> Self {
        group.0
    }
}

impl fmt::Display for MergeGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&revisions::label(&self.0))
    }
}

/// What to do with the first revision of a group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Disposition {
    Pick,
    /// Recorded and logged only; the run does not pause.
    Edit,
}

/// One command word of an interactive plan line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanCommand {
    Pick,
    Edit,
    Squash,
}

impl PlanCommand {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pick => "pick",
            Self::Edit => "edit",
            Self::Squash => "squash",
        }
    }
}

impl fmt::Display for PlanCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PlanCommand {
    type Err = String;

    /// The first character picks the command, so `p`, `pick` and `Pick`
    /// are all a pick.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.chars().next().map(|c| c.to_ascii_lowercase()) {
            Some('p') => Ok(Self::Pick),
            Some('e') => Ok(Self::Edit),
            Some('s') => Ok(Self::Squash),
            _ => Err(s.to_string()),
        }
    }
}

/// Ordered merge groups plus the disposition of each group's first revision.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RebasePlan {
    pub groups: Vec<MergeGroup>,
    pub dispositions: BTreeMap<Revnum, Disposition>,
}

impl RebasePlan {
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Every revision in the plan, in merge order.
    pub fn revisions(&self) -> Vec<Revnum> {
        self.groups
            .iter()
            .flat_map(|g| g.revisions().iter().copied())
            .collect()
    }
}
