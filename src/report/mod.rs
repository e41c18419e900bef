pub mod leaderboard;
pub mod table;
pub mod timeline;
pub mod types;

pub use types::{DaysColumn, PullRequestRow};

use colored::Colorize;
use std::collections::BTreeSet;
use std::fs::File;
use std::io::{self, BufWriter};
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info, instrument};

use crate::events::Event;
use crate::github::PullRequestSource;
use crate::metrics::Engagement;
use crate::reviewers::ReviewerStats;

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("Failed to write report: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to write CSV: {0}")]
    Csv(#[from] csv::Error),
}

/// Write the pull request table to stdout (default) or to a file.
#[instrument(skip(rows), fields(rows = rows.len()))]
pub fn output_pull_requests(
    rows: &[PullRequestRow],
    column: DaysColumn,
    output_path: Option<&Path>,
) -> Result<(), ReportError> {
    match output_path {
        None => {
            debug!("writing CSV to stdout");
            table::write_csv(io::stdout().lock(), rows, column)
        }
        Some(path) => {
            info!(path = %path.display(), "writing CSV to file");
            let file = File::create(path)?;
            table::write_csv(BufWriter::new(file), rows, column)
        }
    }
}

/// Print the merged timeline followed by the engagement summaries.
pub fn print_history(events: &[Event], ignore: &BTreeSet<String>) {
    for line in timeline::timeline_lines(events, ignore) {
        println!("{line}");
    }

    let engagement = Engagement::from_events(events, ignore);

    println!();
    println!("{}", "Number of Engaged Days".bold());
    for line in timeline::engaged_days_lines(&engagement) {
        println!("{line}");
    }

    println!();
    println!("{}", "Engagement by Day".bold());
    for line in timeline::daily_activity_lines(&engagement) {
        println!("{line}");
    }
}

pub fn print_leaderboard<S: PullRequestSource>(
    stats: &ReviewerStats<'_, S>,
    ignore: &BTreeSet<String>,
) {
    for line in leaderboard::leaderboard_lines(stats, ignore) {
        println!("{line}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_row() -> PullRequestRow {
        PullRequestRow {
            id: 42,
            title: "Add OAuth2 login flow".to_string(),
            state: "merged".to_string(),
            author: "alice".to_string(),
            url: "https://github.com/org/repo/pull/42".to_string(),
            created: "2024-01-01".to_string(),
            closed: "2024-01-11".to_string(),
            days: 10,
            review_activity: 3,
        }
    }

    #[test]
    fn test_output_to_file() {
        let path = std::env::temp_dir().join("gh-review-stats-test-output.csv");
        output_pull_requests(&[sample_row()], DaysColumn::DaysToMerge, Some(&path)).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("ID,Title,State"));
        assert!(content.contains("42,Add OAuth2 login flow,merged,alice"));

        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_output_to_stdout() {
        // Should not panic
        output_pull_requests(&[sample_row()], DaysColumn::DaysOpen, None).unwrap();
    }

    #[test]
    fn test_print_history_does_not_panic() {
        print_history(&[], &BTreeSet::new());
    }
}
