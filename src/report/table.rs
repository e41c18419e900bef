use std::io::Write;

use super::types::{DaysColumn, PullRequestRow};
use super::ReportError;

/// Write the pull request table as CSV, flushing after every row so a long
/// export can be followed while it is written.
pub fn write_csv<W: Write>(
    out: W,
    rows: &[PullRequestRow],
    column: DaysColumn,
) -> Result<(), ReportError> {
    let mut writer = csv::Writer::from_writer(out);
    let days_header = column.to_string();
    writer.write_record([
        "ID",
        "Title",
        "State",
        "Author",
        "URL",
        "Created",
        "Closed",
        days_header.as_str(),
        "Review Activity",
    ])?;

    for row in rows {
        writer.write_record(row.to_record())?;
        writer.flush()?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row() -> PullRequestRow {
        PullRequestRow {
            id: 12,
            title: "Fix \"quoted\", title".to_string(),
            state: "merged".to_string(),
            author: "alice".to_string(),
            url: "https://github.com/org/repo/pull/12".to_string(),
            created: "2024-01-01".to_string(),
            closed: "2024-01-11".to_string(),
            days: 10,
            review_activity: 3,
        }
    }

    #[test]
    fn test_write_csv_header_and_row() {
        let mut buf = Vec::new();
        write_csv(&mut buf, &[row()], DaysColumn::DaysToMerge).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(
            lines[0],
            "ID,Title,State,Author,URL,Created,Closed,Days to Merge,Review Activity"
        );
        assert_eq!(
            lines[1],
            "12,\"Fix \"\"quoted\"\", title\",merged,alice,https://github.com/org/repo/pull/12,2024-01-01,2024-01-11,10,3"
        );
    }

    #[test]
    fn test_write_csv_without_rows_has_header_only() {
        let mut buf = Vec::new();
        write_csv(&mut buf, &[], DaysColumn::DaysOpen).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert_eq!(text.lines().count(), 1);
        assert!(text.contains("Days Open"));
    }
}
