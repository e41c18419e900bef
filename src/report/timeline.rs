use std::collections::BTreeSet;

use super::types::BAR_WIDTH;
use crate::events::Event;
use crate::metrics::{bar_length, is_ignored, whole_days, Engagement};

/// Timeline lines for an ordered event stream.
///
/// Events of ignored actors are left out. A `"<N> days"` line separates two
/// events more than one whole day apart.
pub fn timeline_lines(events: &[Event], ignore: &BTreeSet<String>) -> Vec<String> {
    let mut lines = Vec::new();
    let mut previous: Option<&Event> = None;

    for event in events.iter().filter(|e| !is_ignored(e, ignore)) {
        if let Some(prev) = previous {
            let delay = whole_days(prev.date, event.date);
            if delay > 1 {
                lines.push(format!("{delay} days"));
            }
        }
        lines.push(format!(
            "{}: {}",
            event.date.format("%a %b %e"),
            event.description
        ));
        previous = Some(event);
    }

    lines
}

/// `<actor>: <days>` lines, most engaged first.
pub fn engaged_days_lines(engagement: &Engagement) -> Vec<String> {
    engagement
        .engaged_days()
        .into_iter()
        .map(|(person, days)| format!("{person}: {days}"))
        .collect()
}

/// `<date>: <count> <bar>` lines, newest date first.
pub fn daily_activity_lines(engagement: &Engagement) -> Vec<String> {
    let max = engagement.max_daily_activity();
    engagement
        .daily_activity()
        .into_iter()
        .map(|(date, count)| {
            let bar = "*".repeat(bar_length(count, max, BAR_WIDTH));
            format!("{}: {count:3} {bar}", date.format("%Y-%m-%d"))
        })
        .collect()
}
