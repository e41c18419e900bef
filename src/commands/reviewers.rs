use chrono::Utc;
use clap::Args;
use tracing::info;

use super::{build_client, CommandContext, CommandError, RepoArgs};
use crate::config::RunConfig;
use crate::report;
use crate::reviewers::ReviewerStats;
use crate::stats::PullRequestQuery;

/// List reviewers of pull requests in a repository
#[derive(Args, Debug)]
pub struct ReviewersArgs {
    #[command(flatten)]
    pub repo: RepoArgs,

    /// How many days back to query (0 for no limit)
    #[arg(long)]
    pub days_back: Option<u32>,
}

pub async fn run(args: &ReviewersArgs, ctx: &CommandContext) -> Result<(), CommandError> {
    let run = RunConfig::resolve(&args.repo.to_options(args.days_back), &ctx.config, ctx.dev_mode)?;
    let client = build_client(&ctx.config)?;

    let query = PullRequestQuery::new(run.repo.clone(), client, ctx.cancel.clone())
        .with_earliest_date(run.earliest_date(Utc::now()))
        .with_dev_mode(run.dev_mode);

    let mut stats = ReviewerStats::new(&query);
    let summary = stats.populate().await?;
    info!(
        pages = summary.pages,
        visited = summary.visited,
        skipped = summary.skipped,
        cancelled = summary.cancelled,
        "finished tallying reviews"
    );

    report::print_leaderboard(&stats, &run.ignore);
    Ok(())
}
