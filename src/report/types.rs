use chrono::{DateTime, Utc};
use std::collections::BTreeSet;
use std::fmt;

use crate::metrics::{days_open, days_to_merge};
use crate::stats::PullRequestDetails;

/// Date format used for CSV columns.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Width of the engagement-by-day bar chart.
pub const BAR_WIDTH: usize = 60;

/// Meaning of the day-count column of the pull request table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DaysColumn {
    /// Only merged requests are listed
    DaysToMerge,
    /// Requests in any state are listed
    DaysOpen,
}

impl fmt::Display for DaysColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DaysColumn::DaysToMerge => write!(f, "Days to Merge"),
            DaysColumn::DaysOpen => write!(f, "Days Open"),
        }
    }
}

/// One line of the pull request CSV table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullRequestRow {
    pub id: u64,
    pub title: String,
    pub state: String,
    pub author: String,
    pub url: String,
    pub created: String,
    /// Empty while the request is open
    pub closed: String,
    /// Days to merge for merged requests, days open otherwise
    pub days: i64,
    pub review_activity: usize,
}

impl PullRequestRow {
    pub fn from_details(
        prd: &PullRequestDetails,
        ignore: &BTreeSet<String>,
        now: DateTime<Utc>,
    ) -> Self {
        let pull = &prd.pull;
        Self {
            id: pull.number,
            title: pull.title.trim().to_string(),
            state: prd.state.to_string(),
            author: pull.author(),
            url: pull.html_url.clone(),
            created: pull.created_at.format(DATE_FORMAT).to_string(),
            closed: pull
                .closed_at
                .map(|c| c.format(DATE_FORMAT).to_string())
                .unwrap_or_default(),
            days: days_to_merge(prd).unwrap_or_else(|| days_open(prd, now)),
            review_activity: prd.activity_count_excluding(ignore),
        }
    }

    pub fn to_record(&self) -> [String; 9] {
        [
            self.id.to_string(),
            self.title.clone(),
            self.state.clone(),
            self.author.clone(),
            self.url.clone(),
            self.created.clone(),
            self.closed.clone(),
            self.days.to_string(),
            self.review_activity.to_string(),
        ]
    }
}
