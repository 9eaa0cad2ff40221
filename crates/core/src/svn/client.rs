//! Typed svn operations used by the rebase engine.

use std::path::Path;

use tracing::{debug, info, instrument};

use super::parser::{parse_svn_log, SvnLogEntry};
use super::runner::SvnRunner;
use crate::errors::SvnError;
use crate::revisions::Revnum;

/// Client for the handful of svn subcommands the rebase needs.
#[derive(Debug, Clone)]
pub struct SvnClient<R> {
    runner: R,
}

impl<R: SvnRunner> SvnClient<R> {
    pub fn new(runner: R) -> Self {
        Self { runner }
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    /// `svn log --xml [--stop-on-copy] <location>`, newest first.
    #[instrument(skip(self))]
    pub async fn log(&self, location: &str, stop_on_copy: bool) -> Result<Vec<SvnLogEntry>, SvnError> {
        let mut args = vec!["log", "--xml"];
        if stop_on_copy {
            args.push("--stop-on-copy");
        }
        args.push(location);
        let output = self.runner.run(&args).await?;
        parse_svn_log(&output)
    }

    /// `svn log --xml -r <rev> <location>`.
    #[instrument(skip(self))]
    pub async fn log_revision(&self, rev: Revnum, location: &str) -> Result<SvnLogEntry, SvnError> {
        let rev_str = rev.to_string();
        let output = self
            .runner
            .run(&["log", "--xml", "-r", rev_str.as_str(), location])
            .await?;
        parse_svn_log(&output)?
            .into_iter()
            .next()
            .ok_or(SvnError::RevisionNotFound(rev))
    }

    /// `svn merge --accept postpone -c <rev> <source> [<destination>]`.
    ///
    /// Conflicts are postponed, so a conflicting merge still succeeds here;
    /// the conflict surfaces when committing.
    #[instrument(skip(self))]
    pub async fn merge(
        &self,
        rev: Revnum,
        source: &str,
        destination: Option<&str>,
    ) -> Result<String, SvnError> {
        let rev_str = rev.to_string();
        let mut args = vec!["merge", "--accept", "postpone", "-c", rev_str.as_str(), source];
        if let Some(dest) = destination {
            args.push(dest);
        }
        let output = self.runner.run(&args).await?;
        debug!(rev, output = %output.trim(), "svn merge finished");
        Ok(output)
    }

    /// `svn commit -F <message-file>`.
    #[instrument(skip(self), fields(message_file = %message_file.display()))]
    pub async fn commit(&self, message_file: &Path) -> Result<String, SvnError> {
        let file = message_file.to_string_lossy();
        let output = self.runner.run(&["commit", "-F", &*file]).await?;
        info!(output = %output.trim(), "svn commit succeeded");
        Ok(output)
    }

    /// `svn update`, bringing a freshly committed working copy to one revision.
    #[instrument(skip(self))]
    pub async fn update(&self) -> Result<(), SvnError> {
        self.runner.run(&["update"]).await?;
        Ok(())
    }

    /// `svn diff`; any output means the working copy has local modifications.
    #[instrument(skip(self))]
    pub async fn has_local_modifications(&self) -> Result<bool, SvnError> {
        let output = self.runner.run(&["diff"]).await?;
        Ok(!output.trim().is_empty())
    }

    /// `svn propget <name> <target>`.
    #[instrument(skip(self))]
    pub async fn propget(&self, name: &str, target: &str) -> Result<String, SvnError> {
        self.runner.run(&["propget", name, target]).await
    }
}
