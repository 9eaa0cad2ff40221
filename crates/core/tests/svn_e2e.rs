//! End-to-end tests against real Subversion repositories.
//!
//! Repositories are created with `svnadmin create` and accessed through
//! `file://` URLs, so no network is involved. A branch is cut from trunk,
//! changed, and rebased back onto a trunk working copy.
//!
//! If `svn` / `svnadmin` are not installed, tests skip gracefully.

use std::path::Path;
use std::process::{Command, Stdio};

use svnrebase_core::editor::ExternalEditor;
use svnrebase_core::svn::{ProcessRunner, SvnAuth};
use svnrebase_core::{HaltKind, RebaseConfig, RebaseContext, RebaseRequest};

// ===========================================================================
// Helper functions
// ===========================================================================

/// Returns `true` if both `svn` and `svnadmin` are available on `$PATH`.
fn svn_available() -> bool {
    ["svn", "svnadmin"].iter().all(|bin| {
        Command::new(bin)
            .arg("--version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map(|s| s.success())
            .unwrap_or(false)
    })
}

/// Run svn in `cwd`, panicking on failure. Returns stdout.
fn svn(cwd: &Path, args: &[&str]) -> String {
    let output = Command::new("svn")
        .current_dir(cwd)
        .args(args)
        .arg("--non-interactive")
        .output()
        .expect("failed to run svn");
    assert!(
        output.status.success(),
        "svn {:?} failed: {}",
        args,
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stdout).to_string()
}

/// Create a repository with `trunk/a.txt` and a `branches/feature` copy of
/// trunk. Returns the repository root URL.
fn create_branched_repo(dir: &Path) -> String {
    let repo_dir = dir.join("svn_repo");
    let status = Command::new("svnadmin")
        .args(["create", repo_dir.to_str().unwrap()])
        .status()
        .expect("failed to run svnadmin create");
    assert!(status.success(), "svnadmin create failed");
    let url = format!("file://{}", repo_dir.display());

    svn(
        dir,
        &[
            "mkdir",
            "-m",
            "Create layout",
            &format!("{url}/trunk"),
            &format!("{url}/branches"),
        ],
    );
    let wc = dir.join("setup_wc");
    svn(dir, &["checkout", &format!("{url}/trunk"), wc.to_str().unwrap()]);
    std::fs::write(wc.join("a.txt"), "one\ntwo\nthree\n").unwrap();
    svn(&wc, &["add", "a.txt"]);
    svn(&wc, &["commit", "-m", "Add a.txt"]);
    svn(
        dir,
        &[
            "copy",
            "-m",
            "Create feature branch",
            &format!("{url}/trunk"),
            &format!("{url}/branches/feature"),
        ],
    );
    url
}

fn checkout(dir: &Path, url: &str, name: &str) -> std::path::PathBuf {
    let wc = dir.join(name);
    svn(dir, &["checkout", url, wc.to_str().unwrap()]);
    wc
}

fn commit_file(wc: &Path, file: &str, content: &str, message: &str) {
    let path = wc.join(file);
    let is_new = !path.exists();
    std::fs::write(&path, content).unwrap();
    if is_new {
        svn(wc, &["add", file]);
    }
    svn(wc, &["commit", "-m", message]);
}

fn rebase_context(wc: &Path) -> RebaseContext<ProcessRunner, ExternalEditor> {
    let mut config = RebaseConfig::default();
    config.svn.non_interactive = true;
    RebaseContext::from_config(&config, wc)
}

fn last_log_message(wc: &Path) -> String {
    svn(wc, &["log", "-l", "1", "--xml", "."])
}

// ===========================================================================
// Tests
// ===========================================================================

#[tokio::test]
async fn test_rebase_branch_onto_trunk() {
    if !svn_available() {
        eprintln!("svn/svnadmin not installed, skipping");
        return;
    }
    let dir = tempfile::tempdir().unwrap();
    let url = create_branched_repo(dir.path());
    let branch_url = format!("{url}/branches/feature");

    let branch_wc = checkout(dir.path(), &branch_url, "branch_wc");
    commit_file(&branch_wc, "b.txt", "bee\n", "Add b.txt"); // r4
    commit_file(&branch_wc, "a.txt", "ONE\ntwo\nthree\n", "Shout one"); // r5

    let trunk_wc = checkout(dir.path(), &format!("{url}/trunk"), "trunk_wc");
    let ctx = rebase_context(&trunk_wc);

    let outcome = ctx.start(RebaseRequest::new(&branch_url)).await.unwrap();

    assert!(outcome.is_complete());
    let merged: Vec<Vec<u64>> = outcome.merged.iter().map(|m| m.revisions.clone()).collect();
    assert_eq!(merged, vec![vec![4], vec![5]]);
    assert_eq!(
        std::fs::read_to_string(trunk_wc.join("a.txt")).unwrap(),
        "ONE\ntwo\nthree\n"
    );
    assert!(trunk_wc.join("b.txt").exists());

    let log = last_log_message(&trunk_wc);
    assert!(log.contains("Shout one ("), "unexpected log: {log}");
    assert!(log.contains("merge r5)"), "unexpected log: {log}");
    assert!(!ctx.store().exists());
}

#[tokio::test]
async fn test_conflict_halts_and_continue_completes() {
    if !svn_available() {
        eprintln!("svn/svnadmin not installed, skipping");
        return;
    }
    let dir = tempfile::tempdir().unwrap();
    let url = create_branched_repo(dir.path());
    let branch_url = format!("{url}/branches/feature");

    let branch_wc = checkout(dir.path(), &branch_url, "branch_wc");
    commit_file(&branch_wc, "a.txt", "ONE\ntwo\nthree\n", "Shout one"); // r4

    let trunk_wc = checkout(dir.path(), &format!("{url}/trunk"), "trunk_wc");
    commit_file(&trunk_wc, "a.txt", "uno\ntwo\nthree\n", "Translate one"); // r5

    let ctx = rebase_context(&trunk_wc);
    let mut request = RebaseRequest::new(&branch_url);
    request.revisions = Some("4".into());

    let outcome = ctx.start(request).await.unwrap();
    let halt = outcome.halt.expect("conflicting merge must halt");
    assert_eq!(halt.kind, HaltKind::Conflict);
    assert!(halt.message_file.exists());
    let state = ctx.status().unwrap().expect("state saved");
    assert_eq!(state.groups.len(), 1);

    // Resolve as the operator would, then commit with the prepared message.
    std::fs::write(trunk_wc.join("a.txt"), "ONE\ntwo\nthree\n").unwrap();
    svn(&trunk_wc, &["resolve", "--accept", "working", "a.txt"]);
    svn(&trunk_wc, &["commit", "-F", "commit_message"]);

    let outcome = ctx.resume().await.unwrap();
    assert!(outcome.is_complete());
    assert!(!ctx.store().exists());
    assert!(last_log_message(&trunk_wc).contains("merge r4)"));
}

#[tokio::test]
async fn test_local_modifications_block_real_merge() {
    if !svn_available() {
        eprintln!("svn/svnadmin not installed, skipping");
        return;
    }
    let dir = tempfile::tempdir().unwrap();
    let url = create_branched_repo(dir.path());
    let branch_url = format!("{url}/branches/feature");
    let branch_wc = checkout(dir.path(), &branch_url, "branch_wc");
    commit_file(&branch_wc, "b.txt", "bee\n", "Add b.txt");

    let trunk_wc = checkout(dir.path(), &format!("{url}/trunk"), "trunk_wc");
    std::fs::write(trunk_wc.join("a.txt"), "dirty\n").unwrap();

    let runner = ProcessRunner::new(
        "svn",
        &trunk_wc,
        SvnAuth {
            non_interactive: true,
            ..SvnAuth::default()
        },
    );
    let ctx = RebaseContext::new(runner, ExternalEditor::new("true"), &trunk_wc);
    let err = ctx.start(RebaseRequest::new(&branch_url)).await.unwrap_err();

    assert!(matches!(err, svnrebase_core::RebaseError::LocalModifications));
    assert!(ctx.store().exists());
    assert!(!trunk_wc.join("b.txt").exists());
}
