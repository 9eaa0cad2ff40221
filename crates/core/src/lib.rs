//! svn-rebase core library.
//!
//! Replays a selected set of Subversion revisions from one tree onto another,
//! one commit per merge group, with a resumable state file so a conflicting
//! merge can be resolved by hand and the run continued.

pub mod commit_message;
pub mod config;
pub mod context;
pub mod editor;
pub mod errors;
pub mod history;
pub mod plan;
pub mod revisions;
pub mod sequencer;
pub mod state;
pub mod svn;

// Re-exports for convenience.
pub use config::RebaseConfig;
pub use context::{RebaseContext, RebaseRequest};
pub use errors::RebaseError;
pub use sequencer::{Halt, HaltKind, MergedGroup, RunOutcome, SequencerState};
pub use state::{RebaseState, StateStore};
