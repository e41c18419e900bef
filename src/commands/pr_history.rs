use clap::Args;
use tracing::{info, warn};

use super::{build_client, CommandContext, CommandError, RepoArgs};
use crate::config::RunConfig;
use crate::events::{merge_events, ordered_events};
use crate::report;
use crate::stats::{Bucket, PullRequestQuery, Stats, StatsError};

/// Summarize the history of one or more pull requests
#[derive(Args, Debug)]
pub struct PrHistoryArgs {
    #[command(flatten)]
    pub repo: RepoArgs,

    /// Pull request numbers
    #[arg(value_name = "PULL_REQUEST_ID", required = true)]
    pub ids: Vec<String>,
}

/// Parse every id up front so a typo fails before any request is made.
pub fn parse_ids(raw: &[String]) -> Result<Vec<u64>, CommandError> {
    raw.iter()
        .map(|value| {
            value
                .trim()
                .parse::<u64>()
                .map_err(|source| CommandError::InvalidPullRequestId {
                    value: value.clone(),
                    source,
                })
        })
        .collect()
}

pub async fn run(args: &PrHistoryArgs, ctx: &CommandContext) -> Result<(), CommandError> {
    let ids = parse_ids(&args.ids)?;
    let run = RunConfig::resolve(&args.repo.to_options(None), &ctx.config, ctx.dev_mode)?;
    let client = build_client(&ctx.config)?;

    let query = PullRequestQuery::new(run.repo.clone(), client, ctx.cancel.clone())
        .with_dev_mode(run.dev_mode);
    let mut stats = Stats::new(&query, vec![Bucket::catch_all("history")]);

    for id in ids {
        let result: Result<(), StatsError> = async {
            let pr = query.get_pull_request(id).await?;
            stats.process_one(pr).await
        }
        .await;
        if let Err(e) = result {
            warn!(pr = id, error = %e, "could not process pull request, skipping");
        }

        if ctx.cancel.is_cancelled() {
            info!("stopping");
            break;
        }
    }

    let events = merge_events(
        stats
            .buckets()
            .iter()
            .flat_map(|bucket| bucket.requests.iter())
            .map(|prd| ordered_events(prd)),
    );
    report::print_history(&events, &run.ignore);
    Ok(())
}
