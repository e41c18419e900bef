//! Per-reviewer review tallies across a repository.

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

use crate::github::{actor_name, PullRequestSource, PullRequestSummary};
use crate::pagination::{ItemVisitor, WalkSummary};
use crate::stats::{PullRequestQuery, StatsError, SubResource};

/// A pull request and how many reviews one reviewer left on it.
#[derive(Debug, Clone)]
pub struct ReviewedPullRequest {
    pub pull: Arc<PullRequestSummary>,
    pub review_count: usize,
}

pub struct ReviewerStats<'q, S> {
    query: &'q PullRequestQuery<S>,
    review_counts: BTreeMap<String, usize>,
    per_pull: BTreeMap<String, BTreeMap<u64, ReviewedPullRequest>>,
}

impl<'q, S: PullRequestSource> ReviewerStats<'q, S> {
    pub fn new(query: &'q PullRequestQuery<S>) -> Self {
        Self {
            query,
            review_counts: BTreeMap::new(),
            per_pull: BTreeMap::new(),
        }
    }

    pub async fn populate(&mut self) -> Result<WalkSummary, StatsError> {
        let query = self.query;
        query.walk_pull_requests(self).await
    }

    /// Tally the reviews of one pull request. Stale closed requests are
    /// skipped, and with a cutoff only reviews submitted after it count.
    pub async fn process_one(&mut self, pr: PullRequestSummary) -> Result<(), StatsError> {
        let query = self.query;
        if query.is_stale(&pr) {
            return Ok(());
        }

        let source = &query.source;
        let repo = &query.repo;
        let number = pr.number;
        let reviews = query
            .detail_paginator()
            .collect(move |page| source.list_reviews(repo, number, page))
            .await
            .map_err(|e| StatsError::SubResource {
                resource: SubResource::Reviews,
                url: pr.html_url.clone(),
                source: e,
            })?;

        let pull = Arc::new(pr);
        let cutoff = query.earliest_date;
        for review in &reviews {
            let counted = match (cutoff, review.submitted_at) {
                (None, _) => true,
                (Some(cutoff), Some(submitted)) => submitted > cutoff,
                (Some(_), None) => false,
            };
            if counted {
                self.record(actor_name(review.user.as_ref()), &pull);
            }
        }
        debug!(pr = pull.number, reviews = reviews.len(), "tallied reviews");
        Ok(())
    }

    fn record(&mut self, reviewer: String, pull: &Arc<PullRequestSummary>) {
        *self.review_counts.entry(reviewer.clone()).or_insert(0) += 1;
        self.per_pull
            .entry(reviewer)
            .or_default()
            .entry(pull.number)
            .or_insert_with(|| ReviewedPullRequest {
                pull: Arc::clone(pull),
                review_count: 0,
            })
            .review_count += 1;
    }

    pub fn review_count(&self, reviewer: &str) -> usize {
        self.review_counts.get(reviewer).copied().unwrap_or(0)
    }

    /// Reviewers by review count, highest first, ties by name.
    pub fn reviewers_in_order(&self) -> Vec<String> {
        let mut reviewers: Vec<(&String, &usize)> = self.review_counts.iter().collect();
        reviewers.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));
        reviewers.into_iter().map(|(name, _)| name.clone()).collect()
    }

    /// Pull requests a reviewer reviewed, most reviewed first.
    pub fn prs_for_reviewer(&self, reviewer: &str) -> Vec<ReviewedPullRequest> {
        let mut prs: Vec<ReviewedPullRequest> = self
            .per_pull
            .get(reviewer)
            .map(|by_number| by_number.values().cloned().collect())
            .unwrap_or_default();
        prs.sort_by(|a, b| b.review_count.cmp(&a.review_count));
        prs
    }
}

#[async_trait]
impl<'q, S: PullRequestSource> ItemVisitor<PullRequestSummary> for ReviewerStats<'q, S> {
    type Error = StatsError;

    async fn visit(&mut self, pr: PullRequestSummary) -> Result<(), StatsError> {
        self.process_one(pr).await
    }
}
