//! Error types for the svn-rebase core library.
//!
//! Subsystems report their own `thiserror` enums; [`RebaseError`] wraps them
//! together with the failures of the rebase workflow itself.

use thiserror::Error;

use crate::revisions::Revnum;

// ---------------------------------------------------------------------------
// Top-level error
// ---------------------------------------------------------------------------

/// Unified error type for the entire core library.
#[derive(Debug, Error)]
pub enum RebaseError {
    #[error(transparent)]
    Svn(#[from] SvnError),

    #[error(transparent)]
    RevisionSpec(#[from] RevisionSpecError),

    #[error(transparent)]
    Plan(#[from] PlanError),

    #[error(transparent)]
    State(#[from] StateError),

    #[error(transparent)]
    Editor(#[from] EditorError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The destination working copy has uncommitted changes. The requested
    /// rebase has been saved and can be replayed with `--continue`.
    #[error("the working copy has local modifications; commit or revert them before merging")]
    LocalModifications,

    /// `--continue` was requested but there is no saved state.
    #[error("no rebase in progress")]
    NoRebaseInProgress,

    /// A fresh run was requested while a saved state exists.
    #[error("a rebase is already in progress (state file '{0}'); use --continue or --abort")]
    AlreadyInProgress(String),

    /// Reading or writing the commit message file failed.
    #[error("commit message file '{path}': {source}")]
    MessageFile {
        path: String,
        source: std::io::Error,
    },
}

// ---------------------------------------------------------------------------
// SVN errors
// ---------------------------------------------------------------------------

/// Errors from SVN CLI operations.
#[derive(Debug, Error)]
pub enum SvnError {
    /// The `svn` binary was not found on `$PATH`.
    #[error("svn binary not found: {0}")]
    BinaryNotFound(String),

    /// An `svn` command exited with a non-zero status.
    #[error("svn command failed (exit {exit_code}): {stderr}")]
    CommandFailed { exit_code: i32, stderr: String },

    /// Could not parse the XML output produced by `svn`.
    #[error("failed to parse svn XML output: {0}")]
    XmlParse(String),

    /// The requested revision does not exist on the queried location.
    #[error("svn revision {0} not found")]
    RevisionNotFound(Revnum),

    /// Generic I/O wrapper.
    #[error("svn I/O error: {0}")]
    Io(#[from] std::io::Error),
}

// ---------------------------------------------------------------------------
// Revision spec errors
// ---------------------------------------------------------------------------

/// Errors from parsing a textual revision set such as `1000-1005,1008`.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RevisionSpecError {
    #[error("revision spec is empty")]
    Empty,

    #[error("invalid revision '{token}'")]
    InvalidToken { token: String },

    #[error("invalid bound in revision range '{token}'")]
    InvalidBound { token: String },

    #[error("revision range {start}-{end} runs backwards")]
    ReversedRange { start: Revnum, end: Revnum },
}

// ---------------------------------------------------------------------------
// Interactive plan errors
// ---------------------------------------------------------------------------

/// Errors from reading an operator-edited plan file.
///
/// Every variant except [`PlanError::Io`] carries the 1-based line number of
/// the offending line.
#[derive(Debug, Error)]
pub enum PlanError {
    #[error("line {line}: unknown command '{command}'")]
    UnknownCommand { line: usize, command: String },

    #[error("line {line}: missing revision")]
    MissingRevision { line: usize },

    #[error("line {line}: cannot squash r{revision} without a previous revision")]
    SquashFirst { line: usize, revision: Revnum },

    #[error("line {line}: invalid revision '{field}'")]
    InvalidRevision { line: usize, field: String },

    #[error("line {line}: r{revision} was not in the proposed plan")]
    UnknownRevision { line: usize, revision: Revnum },

    #[error("line {line}: r{revision} is listed more than once")]
    DuplicateRevision { line: usize, revision: Revnum },

    #[error("line {line}: r{revision} must come after r{previous}")]
    OutOfOrder {
        line: usize,
        revision: Revnum,
        previous: Revnum,
    },

    #[error("plan file I/O error: {0}")]
    Io(#[from] std::io::Error),
}

// ---------------------------------------------------------------------------
// State store errors
// ---------------------------------------------------------------------------

/// Errors from persisting or loading the rebase state file.
#[derive(Debug, Error)]
pub enum StateError {
    #[error("state file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to serialize rebase state: {0}")]
    Serialize(serde_json::Error),

    #[error("failed to parse state file '{path}': {source}")]
    Parse {
        path: String,
        source: serde_json::Error,
    },

    #[error("state file version {found} is newer than the supported version {supported}")]
    UnsupportedVersion { found: u32, supported: u32 },

    #[error("failed to replace state file: {0}")]
    Persist(#[from] tempfile::PersistError),
}

// ---------------------------------------------------------------------------
// Editor errors
// ---------------------------------------------------------------------------

/// Errors from running the operator's text editor.
#[derive(Debug, Error)]
pub enum EditorError {
    #[error("editor command is empty")]
    EmptyCommand,

    #[error("failed to start editor '{command}': {source}")]
    Spawn {
        command: String,
        source: std::io::Error,
    },

    #[error("editor '{command}' exited with {status}")]
    Failed { command: String, status: String },
}

// ---------------------------------------------------------------------------
// Configuration errors
// ---------------------------------------------------------------------------

/// Errors from configuration loading and validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Config file not found.
    #[error("configuration file not found: {0}")]
    FileNotFound(String),

    /// TOML parse error.
    #[error("configuration parse error: {0}")]
    ParseError(String),

    /// A config value is invalid.
    #[error("invalid configuration value for '{field}': {detail}")]
    InvalidValue { field: String, detail: String },

    /// Generic I/O error reading the config file.
    #[error("configuration I/O error: {0}")]
    IoError(#[from] std::io::Error),
}
