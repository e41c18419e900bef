use chrono::{DateTime, Utc};
use tracing::{debug, instrument};

use super::types::{PullRequestDetails, PullRequestState};
use super::{PullRequestQuery, StatsError, SubResource};
use crate::github::{
    Commit, GitHubError, IssueComment, PullRequestComment, PullRequestSource, PullRequestSummary,
    Review,
};

/// Fetch everything known about one pull request.
///
/// Sub-resources are requested one after the other to stay within the API
/// rate limit. The first failure aborts the whole record.
#[instrument(skip(query, pr), fields(pr = pr.number))]
pub async fn fetch_details<S: PullRequestSource>(
    query: &PullRequestQuery<S>,
    pr: PullRequestSummary,
) -> Result<PullRequestDetails, StatsError> {
    let source = &query.source;
    let repo = &query.repo;
    let number = pr.number;
    let paginator = query.detail_paginator();

    let is_merged = source
        .is_merged(repo, number)
        .await
        .map_err(|e| StatsError::MergeStatus {
            url: pr.html_url.clone(),
            source: e,
        })?;

    let issue_comments = paginator
        .collect(move |page| source.list_issue_comments(repo, number, page))
        .await
        .map_err(failed(SubResource::IssueComments, &pr))?;

    let pr_comments = paginator
        .collect(move |page| source.list_review_comments(repo, number, page))
        .await
        .map_err(failed(SubResource::PullRequestComments, &pr))?;

    let reviews = paginator
        .collect(move |page| source.list_reviews(repo, number, page))
        .await
        .map_err(failed(SubResource::Reviews, &pr))?;

    let commits = paginator
        .collect(move |page| source.list_commits(repo, number, page))
        .await
        .map_err(failed(SubResource::Commits, &pr))?;

    debug!(
        is_merged,
        issue_comments = issue_comments.len(),
        pr_comments = pr_comments.len(),
        reviews = reviews.len(),
        commits = commits.len(),
        "fetched pull request details"
    );

    Ok(assemble(
        pr,
        is_merged,
        reviews,
        pr_comments,
        issue_comments,
        commits,
        query.earliest_date,
    ))
}

fn failed(resource: SubResource, pr: &PullRequestSummary) -> impl FnOnce(GitHubError) -> StatsError {
    let url = pr.html_url.clone();
    move |source| StatsError::SubResource {
        resource,
        url,
        source,
    }
}

/// Build the immutable record and its counters.
///
/// Recent counters stay at zero unless a cutoff is set; an item counts as
/// recent when its timestamp is strictly after the cutoff.
pub fn assemble(
    pull: PullRequestSummary,
    is_merged: bool,
    reviews: Vec<Review>,
    pull_request_comments: Vec<PullRequestComment>,
    issue_comments: Vec<IssueComment>,
    commits: Vec<Commit>,
    earliest_date: Option<DateTime<Utc>>,
) -> PullRequestDetails {
    let (recent_review_count, recent_pr_comment_count, recent_issue_comment_count) =
        match earliest_date {
            Some(cutoff) => (
                count_after(reviews.iter().map(|r| r.submitted_at), cutoff),
                count_after(pull_request_comments.iter().map(|c| Some(c.created_at)), cutoff),
                count_after(issue_comments.iter().map(|c| Some(c.created_at)), cutoff),
            ),
            None => (0, 0, 0),
        };

    let all_activity_count = reviews.len() + pull_request_comments.len() + issue_comments.len();

    PullRequestDetails {
        state: PullRequestState::resolve(pull.state, is_merged),
        pull,
        reviews,
        recent_review_count,
        pull_request_comments,
        recent_pr_comment_count,
        issue_comments,
        recent_issue_comment_count,
        commits,
        recent_activity_count: recent_review_count
            + recent_pr_comment_count
            + recent_issue_comment_count,
        all_activity_count,
    }
}

fn count_after(
    timestamps: impl Iterator<Item = Option<DateTime<Utc>>>,
    cutoff: DateTime<Utc>,
) -> usize {
    timestamps.flatten().filter(|t| *t > cutoff).count()
}
