//! Commit message synthesis for replayed changesets.

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex_lite::Regex;

use crate::history::RevisionRecord;

/// File the synthesized message is written to, inside the working copy.
pub const MESSAGE_FILE_NAME: &str = "commit_message";

/// Matches a trailing `(... merge r...)` annotation.
fn annotation_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"\((?:[^()]* )?merge r[^)]*\)$").expect("annotation pattern is valid")
    })
}

/// Whether `message` already ends with a merge annotation.
pub fn has_merge_annotation(message: &str) -> bool {
    annotation_pattern().is_match(message)
}

/// Build the commit message for a group whose last revision is `record`.
///
/// The original message is kept and annotated with ` (<author>, merge r<id>)`
/// unless it already carries an annotation, so replaying a replay does not
/// stack them.
pub fn synthesize(record: &RevisionRecord) -> String {
    let message = record.message.trim();
    if has_merge_annotation(message) {
        return message.to_string();
    }
    if record.author.is_empty() {
        format!("{} (merge r{})", message, record.id)
    } else {
        format!("{} ({}, merge r{})", message, record.author, record.id)
    }
}

/// Path of the message file for a working directory.
pub fn message_path(workdir: &Path) -> PathBuf {
    workdir.join(MESSAGE_FILE_NAME)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: u64, author: &str, message: &str) -> RevisionRecord {
        RevisionRecord {
            id,
            author: author.into(),
            date: "2010-07-27T11:14:29Z".into(),
            message: message.into(),
        }
    }

    #[test]
    fn test_annotation_appended() {
        let msg = synthesize(&record(6643, "karen", "svn merge tool\n"));
        assert_eq!(msg, "svn merge tool (karen, merge r6643)");
    }

    #[test]
    fn test_existing_annotation_left_unchanged() {
        let msg = synthesize(&record(7001, "bob", "svn merge tool (karen, merge r6643)"));
        assert_eq!(msg, "svn merge tool (karen, merge r6643)");

        let msg = synthesize(&record(7002, "bob", "Fix parser (merge r99)"));
        assert_eq!(msg, "Fix parser (merge r99)");
    }

    #[test]
    fn test_annotation_must_be_trailing() {
        let msg = synthesize(&record(8, "amy", "(karen, merge r6) then more work"));
        assert_eq!(msg, "(karen, merge r6) then more work (amy, merge r8)");
    }

    #[test]
    fn test_empty_author() {
        assert_eq!(synthesize(&record(5, "", "Initial")), "Initial (merge r5)");
    }

    #[test]
    fn test_has_merge_annotation() {
        assert!(has_merge_annotation("x (a, merge r1-3)"));
        assert!(has_merge_annotation("(merge r1)"));
        assert!(!has_merge_annotation("merge r1"));
        assert!(!has_merge_annotation("x (merge r1) y"));
        assert!(!has_merge_annotation("x (remerge r1)"));
    }

    #[test]
    fn test_message_path() {
        assert_eq!(
            message_path(Path::new("/wc")),
            PathBuf::from("/wc/commit_message")
        );
    }
}
