mod commands;
mod config;
mod events;
mod github;
mod metrics;
mod pagination;
mod report;
mod reviewers;
mod stats;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::{info, info_span, warn};
use tracing_subscriber::EnvFilter;

use commands::pr_history::PrHistoryArgs;
use commands::pull_requests::PullRequestsArgs;
use commands::reviewers::ReviewersArgs;
use commands::CommandContext;
use pagination::CancelFlag;

/// Level used when RUST_LOG is unset, empty or unparsable. Skipped pull
/// requests are reported at warn and run milestones at info.
const DEFAULT_LOG_LEVEL: &str = "info";

/// GitHub Review Statistics: reviewer leaderboards, pull request CSV exports,
/// and pull request timelines for one repository.
#[derive(Parser, Debug)]
#[command(name = "gh-review-stats", version, about)]
struct Cli {
    /// Config file (default is ./.gh-review-stats.toml, then $HOME/.gh-review-stats.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable developer mode, shortcutting some queries
    #[arg(long, global = true)]
    dev: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List pull requests and some characteristics in CSV format
    PullRequests(PullRequestsArgs),
    /// List reviewers of pull requests in a repository
    Reviewers(ReviewersArgs),
    /// Summarize the history of one or more pull requests
    PrHistory(PrHistoryArgs),
    /// Generate the default config file, or fill in missing settings
    ConfigGen,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(log_filter(std::env::var("RUST_LOG").ok().as_deref()))
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Command::ConfigGen = cli.command {
        commands::config_gen::run(cli.config.as_deref())?;
        return Ok(());
    }

    let config = config::Config::load(cli.config.as_deref())?;
    let ctx = CommandContext {
        config,
        dev_mode: cli.dev,
        cancel: interrupt_flag(),
    };

    match &cli.command {
        Command::PullRequests(args) => {
            let _span = info_span!("pull_requests").entered();
            commands::pull_requests::run(args, &ctx).await?;
        }
        Command::Reviewers(args) => {
            let _span = info_span!("reviewers").entered();
            commands::reviewers::run(args, &ctx).await?;
        }
        Command::PrHistory(args) => {
            let _span = info_span!("pr_history").entered();
            commands::pr_history::run(args, &ctx).await?;
        }
        Command::ConfigGen => {}
    }

    Ok(())
}

fn log_filter(directives: Option<&str>) -> EnvFilter {
    directives
        .filter(|d| !d.trim().is_empty())
        .and_then(|d| EnvFilter::try_new(d).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_LOG_LEVEL))
}

/// A cancel flag raised by the first Ctrl-C.
fn interrupt_flag() -> CancelFlag {
    let cancel = CancelFlag::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("interrupt received, finishing with partial results");
                on_signal.cancel();
            }
            Err(e) => warn!(error = %e, "could not listen for interrupt"),
        }
    });
    cancel
}
