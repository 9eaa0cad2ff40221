//! Revision history of a source location.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::errors::SvnError;
use crate::revisions::Revnum;
use crate::svn::{SvnClient, SvnLogEntry, SvnRunner};

/// One committed changeset on the source location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevisionRecord {
    pub id: Revnum,
    pub author: String,
    pub date: String,
    /// Log message with surrounding whitespace trimmed.
    pub message: String,
}

impl RevisionRecord {
    /// First line of the message, or an empty string.
    pub fn summary(&self) -> &str {
        self.message.lines().next().unwrap_or("")
    }
}

impl From<SvnLogEntry> for RevisionRecord {
    fn from(entry: SvnLogEntry) -> Self {
        Self {
            id: entry.revision,
            author: entry.author,
            date: entry.date,
            message: entry.message.trim().to_string(),
        }
    }
}

/// Fetch the history of `source`, newest first.
///
/// With `stop_on_copy` the log stops at the branch point and the oldest entry,
/// the copy that created the branch, is dropped.
pub async fn fetch<R: SvnRunner>(
    client: &SvnClient<R>,
    source: &str,
    stop_on_copy: bool,
) -> Result<Vec<RevisionRecord>, SvnError> {
    let mut entries = client.log(source, stop_on_copy).await?;
    if stop_on_copy {
        if let Some(copy) = entries.pop() {
            debug!(revision = copy.revision, "dropping branch copy entry");
        }
    }
    info!(source, count = entries.len(), "fetched revision history");
    Ok(entries.into_iter().map(RevisionRecord::from).collect())
}

/// Fetch the log record of a single revision.
pub async fn fetch_one<R: SvnRunner>(
    client: &SvnClient<R>,
    rev: Revnum,
    source: &str,
) -> Result<RevisionRecord, SvnError> {
    client.log_revision(rev, source).await.map(RevisionRecord::from)
}
