//! `svn-rebase`: replay the revisions of one Subversion tree onto another,
//! one commit at a time.
//!
//! A run stops when a commit fails (usually a conflict) or, in manual-commit
//! mode, after every merge. `--continue` picks up where it stopped and
//! `--abort` forgets the run.

mod style;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use svnrebase_core::revisions;
use svnrebase_core::{
    HaltKind, RebaseConfig, RebaseContext, RebaseError, RebaseRequest, RebaseState, RunOutcome,
};

const PROGRAM: &str = "svn-rebase";

// ---------------------------------------------------------------------------
// CLI argument definitions
// ---------------------------------------------------------------------------

/// Rebase Subversion changesets onto the working copy, committing each one.
#[derive(Parser, Debug)]
#[command(
    name = "svn-rebase",
    version,
    about = "Replay Subversion changesets onto a working copy one commit at a time",
    after_help = "Run inside the destination working copy. \
                  After a conflict, resolve it, commit with \"svn commit -F commit_message\", \
                  and run \"svn-rebase --continue\"."
)]
struct Cli {
    /// URL or path of the tree to take revisions from.
    #[arg(required_unless_present_any = ["cont", "abort", "avail", "status", "print_config"])]
    source: Option<String>,

    /// Restart the rebase after having resolved a merge conflict.
    #[arg(
        short = 'c',
        long = "continue",
        conflicts_with_all = [
            "source", "abort", "avail", "status",
            "interactive", "manual_commit", "revisions", "destination",
        ]
    )]
    cont: bool,

    /// Remove the state of the rebase.
    #[arg(
        short,
        long,
        conflicts_with_all = [
            "source", "avail", "status",
            "interactive", "manual_commit", "revisions", "destination",
        ]
    )]
    abort: bool,

    /// Edit the list of revisions before merging (pick, edit, squash).
    #[arg(short, long)]
    interactive: bool,

    /// After merging a group, let the operator commit manually.
    #[arg(short, long)]
    manual_commit: bool,

    /// Revisions to merge, e.g. 1000-1005,1008.
    #[arg(short, long, value_name = "SPEC")]
    revisions: Option<String>,

    /// Target directory of the merges.
    #[arg(short, long, value_name = "PATH")]
    destination: Option<String>,

    /// Show the changesets already integrated (svnmerge-integrated).
    #[arg(
        long,
        conflicts_with_all = [
            "source", "status",
            "interactive", "manual_commit", "revisions", "destination",
        ]
    )]
    avail: bool,

    /// Show the rebase in progress, if any.
    #[arg(
        long,
        conflicts_with_all = [
            "source", "interactive", "manual_commit", "revisions", "destination",
        ]
    )]
    status: bool,

    /// Print a starter configuration file and exit.
    #[arg(long, exclusive = true)]
    print_config: bool,

    /// Path to the TOML configuration file.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Log svn command lines and other debug output.
    #[arg(short, long)]
    verbose: bool,
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            return if e.use_stderr() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    if cli.print_config {
        print!("{}", RebaseConfig::default_template());
        return ExitCode::SUCCESS;
    }

    let config = match RebaseConfig::discover(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {:#}", anyhow::Error::new(e).context("failed to load configuration"));
            return ExitCode::FAILURE;
        }
    };
    init_tracing(if cli.verbose { "debug" } else { config.log.level.as_str() });

    match run(cli, &config).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("svnrebase_core={level},warn")));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();
}

async fn run(cli: Cli, config: &RebaseConfig) -> Result<ExitCode> {
    let workdir = std::env::current_dir().context("failed to determine working directory")?;
    let ctx = RebaseContext::from_config(config, workdir);

    if cli.abort {
        if ctx.abort().context("failed to remove rebase state")? {
            println!("{}", style::success("Rebase aborted; the working copy was left as is"));
        } else {
            println!("{}", style::warn("No rebase in progress"));
        }
        return Ok(ExitCode::SUCCESS);
    }

    if cli.status {
        match ctx.status().context("failed to read rebase state")? {
            Some(state) => print_status(&state),
            None => println!("No rebase in progress"),
        }
        return Ok(ExitCode::SUCCESS);
    }

    if cli.avail {
        let integrated = ctx
            .available()
            .await
            .context("failed to read svnmerge-integrated")?;
        println!("{}", integrated.trim_end());
        return Ok(ExitCode::SUCCESS);
    }

    let result = if cli.cont {
        ctx.resume().await
    } else {
        let Some(source) = cli.source else {
            eprintln!("{}", style::error("Please specify the source url"));
            return Ok(ExitCode::FAILURE);
        };
        let mut request = RebaseRequest::new(source);
        request.revisions = cli.revisions;
        request.destination = cli.destination;
        request.auto_commit = !cli.manual_commit;
        request.interactive = cli.interactive;
        ctx.start(request).await
    };

    match result {
        Ok(outcome) => Ok(report(&outcome)),
        Err(RebaseError::LocalModifications) => {
            eprintln!(
                "{}",
                style::error("Please commit all local modifications before merging")
            );
            eprintln!(
                "The rebase was saved; run {} once the working copy is clean.",
                style::command(format!("{PROGRAM} --continue"))
            );
            Ok(ExitCode::FAILURE)
        }
        Err(RebaseError::NoRebaseInProgress) => {
            eprintln!("{}", style::error("No rebase in progress?"));
            Ok(ExitCode::FAILURE)
        }
        Err(e) => Err(e).context("rebase failed"),
    }
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

fn report(outcome: &RunOutcome) -> ExitCode {
    for merged in &outcome.merged {
        println!(
            "{}",
            style::success(format!(
                "Merged {} ({})",
                revisions::label(&merged.revisions),
                merged.message
            ))
        );
    }

    let Some(halt) = &outcome.halt else {
        if outcome.merged.is_empty() {
            println!("Nothing to merge");
        }
        return ExitCode::SUCCESS;
    };

    let group = halt.group.to_string();
    match halt.kind {
        HaltKind::Conflict => {
            println!("{}", style::warn(format!("Could not commit {group}")));
            println!(
                "Use {} to commit after the conflicts are resolved",
                style::command("\"svn commit -F commit_message\"")
            );
        }
        HaltKind::ManualCommit => {
            println!("{}", style::success(format!("Merged {group}, not committed")));
            println!(
                "Use {} to commit",
                style::command("\"svn commit -F commit_message\"")
            );
        }
    }
    println!(
        "{} to continue the merge",
        style::command(format!("\"{PROGRAM} --continue\""))
    );
    ExitCode::FAILURE
}

fn print_status(state: &RebaseState) {
    println!();
    println!("{}", style::header("Rebase in progress"));
    println!("  Source       {}", state.source);
    if let Some(dest) = &state.destination {
        println!("  Destination  {}", dest);
    }
    println!(
        "  Started      {}",
        state.started_at.format("%Y-%m-%d %H:%M:%S UTC")
    );
    println!(
        "  Commit       {}",
        if state.auto_commit { "automatic" } else { "manual" }
    );
    println!(
        "  Remaining    {} group(s), {} revision(s)",
        state.groups.len(),
        state.pending_revisions()
    );
    for group in &state.groups {
        println!("    {}", style::dim(group));
    }
    println!();
}
