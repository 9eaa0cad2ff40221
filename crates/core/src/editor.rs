//! Launching the operator's text editor on the plan file.

use std::path::Path;

use tokio::process::Command;
use tracing::{debug, info};

use crate::errors::EditorError;

/// Lets the operator edit a file in place and returns once they are done.
#[allow(async_fn_in_trait)]
pub trait PlanEditor {
    async fn edit(&self, path: &Path) -> Result<(), EditorError>;
}

/// Runs an external editor command and waits for it to exit.
#[derive(Debug, Clone)]
pub struct ExternalEditor {
    command: String,
}

impl ExternalEditor {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
        }
    }

    /// Configured command, else `$VISUAL`, else `$EDITOR`, else `vi`.
    pub fn resolve(configured: Option<&str>) -> Self {
        let command = configured
            .map(str::to_string)
            .or_else(|| non_empty_env("VISUAL"))
            .or_else(|| non_empty_env("EDITOR"))
            .unwrap_or_else(|| "vi".to_string());
        debug!(%command, "resolved editor");
        Self { command }
    }

    pub fn command(&self) -> &str {
        &self.command
    }
}

fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

impl PlanEditor for ExternalEditor {
    async fn edit(&self, path: &Path) -> Result<(), EditorError> {
        // Split so that commands like `code --wait` work.
        let mut parts = self.command.split_whitespace();
        let program = parts.next().ok_or(EditorError::EmptyCommand)?;

        info!(editor = %self.command, path = %path.display(), "waiting for editor");
        let status = Command::new(program)
            .args(parts)
            .arg(path)
            .status()
            .await
            .map_err(|source| EditorError::Spawn {
                command: self.command.clone(),
                source,
            })?;

        if !status.success() {
            return Err(EditorError::Failed {
                command: self.command.clone(),
                status: status.to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configured_command_wins() {
        let editor = ExternalEditor::resolve(Some("nano -w"));
        assert_eq!(editor.command(), "nano -w");
    }

    #[tokio::test]
    async fn test_empty_command() {
        let dir = tempfile::tempdir().unwrap();
        let err = ExternalEditor::new("   ")
            .edit(&dir.path().join("svn_rebase.todo"))
            .await
            .unwrap_err();
        assert!(matches!(err, EditorError::EmptyCommand));
    }

    #[tokio::test]
    async fn test_missing_editor_binary() {
        let dir = tempfile::tempdir().unwrap();
        let err = ExternalEditor::new("editor-that-does-not-exist --wait")
            .edit(&dir.path().join("svn_rebase.todo"))
            .await
            .unwrap_err();
        assert!(matches!(err, EditorError::Spawn { .. }));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_editor_exit_status() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("svn_rebase.todo");
        std::fs::write(&path, "pick 1\n").unwrap();

        ExternalEditor::new("true").edit(&path).await.unwrap();

        let err = ExternalEditor::new("false").edit(&path).await.unwrap_err();
        assert!(matches!(err, EditorError::Failed { ref command, .. } if command == "false"));
    }
}
