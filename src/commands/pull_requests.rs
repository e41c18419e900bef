use chrono::Utc;
use clap::Args;
use std::path::PathBuf;
use tracing::info;

use super::{build_client, CommandContext, CommandError, RepoArgs};
use crate::config::RunConfig;
use crate::report::{self, DaysColumn, PullRequestRow};
use crate::stats::{Bucket, PullRequestDetails, PullRequestQuery, PullRequestState, Stats};

/// List pull requests and some characteristics in CSV format
#[derive(Args, Debug)]
pub struct PullRequestsArgs {
    #[command(flatten)]
    pub repo: RepoArgs,

    /// How many days back to query (0 for no limit)
    #[arg(long)]
    pub days_back: Option<u32>,

    /// Include all pull requests, not just merged ones
    #[arg(long)]
    pub all: bool,

    /// Output file to create (defaults to stdout)
    #[arg(short = 'O', long)]
    pub output: Option<PathBuf>,
}

pub async fn run(args: &PullRequestsArgs, ctx: &CommandContext) -> Result<(), CommandError> {
    let run = RunConfig::resolve(&args.repo.to_options(args.days_back), &ctx.config, ctx.dev_mode)?;
    let client = build_client(&ctx.config)?;

    let now = Utc::now();
    let earliest_date = run.earliest_date(now);
    if let Some(since) = earliest_date {
        info!(since = %since.format("%Y-%m-%d"), "including data since");
    }

    let query = PullRequestQuery::new(run.repo.clone(), client, ctx.cancel.clone())
        .with_earliest_date(earliest_date)
        .with_dev_mode(run.dev_mode);

    let include_all = args.all;
    let bucket = Bucket::new("pull-requests", move |prd: &PullRequestDetails| {
        include_all || prd.state == PullRequestState::Merged
    });
    let mut stats = Stats::new(&query, vec![bucket]);
    let summary = stats.populate().await?;
    info!(
        pages = summary.pages,
        visited = summary.visited,
        skipped = summary.skipped,
        cancelled = summary.cancelled,
        "finished walking pull requests"
    );

    let rows: Vec<PullRequestRow> = stats
        .buckets()
        .iter()
        .flat_map(|bucket| bucket.requests.iter())
        .map(|prd| PullRequestRow::from_details(prd, &run.ignore, now))
        .collect();

    let column = if args.all {
        DaysColumn::DaysOpen
    } else {
        DaysColumn::DaysToMerge
    };
    report::output_pull_requests(&rows, column, args.output.as_deref())?;
    Ok(())
}
