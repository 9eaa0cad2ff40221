//! `svn-merge`: merge a single Subversion revision into the working copy and
//! prepare its commit message in `commit_message`.

#[allow(dead_code)]
#[path = "../style.rs"]
mod style;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use svnrebase_core::revisions::Revnum;
use svnrebase_core::{HaltKind, RebaseConfig, RebaseContext};

/// Merge one changeset and annotate its log message for the commit.
#[derive(Parser, Debug)]
#[command(name = "svn-merge", version, about = "Merge a single Subversion revision")]
struct Cli {
    /// URL or path of the tree to take the revision from.
    source: String,

    /// Revision to merge.
    revision: Revnum,

    /// Target directory of the merge.
    destination: Option<String>,

    /// Commit right after merging.
    #[arg(long)]
    commit: bool,

    /// Path to the TOML configuration file.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Log svn command lines and other debug output.
    #[arg(short, long)]
    verbose: bool,
}

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

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<ExitCode> {
    let config =
        RebaseConfig::discover(cli.config.as_deref()).context("failed to load configuration")?;

    let level = if cli.verbose { "debug" } else { config.log.level.as_str() };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("svnrebase_core={level},warn")));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();

    let workdir = std::env::current_dir().context("failed to determine working directory")?;
    let ctx = RebaseContext::from_config(&config, workdir);
    let outcome = ctx
        .merge_single(
            &cli.source,
            cli.revision,
            cli.destination.as_deref(),
            cli.commit,
        )
        .await
        .with_context(|| format!("failed to merge r{}", cli.revision))?;

    for merged in &outcome.merged {
        println!(
            "{}",
            style::success(format!("Merged r{} ({})", cli.revision, merged.message))
        );
    }
    match outcome.halt.map(|h| h.kind) {
        None => Ok(ExitCode::SUCCESS),
        Some(HaltKind::ManualCommit) => {
            println!("{}", style::success(format!("Merged r{}", cli.revision)));
            println!(
                "Please use this command to commit: {}",
                style::command("svn commit -F commit_message")
            );
            Ok(ExitCode::SUCCESS)
        }
        Some(HaltKind::Conflict) => {
            println!("{}", style::warn(format!("Could not commit r{}", cli.revision)));
            println!(
                "Use {} to commit after the conflicts are resolved",
                style::command("\"svn commit -F commit_message\"")
            );
            Ok(ExitCode::FAILURE)
        }
    }
}
