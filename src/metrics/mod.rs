//! Metrics computation

use chrono::{DateTime, NaiveDate, Utc};
use std::collections::{BTreeMap, BTreeSet};

use crate::events::Event;
use crate::stats::{PullRequestDetails, PullRequestState};

/// Whole days between two instants, rounded down.
pub fn whole_days(start: DateTime<Utc>, end: DateTime<Utc>) -> i64 {
    (end - start).num_seconds().div_euclid(86_400)
}

/// Days from creation to merge, only for merged requests.
pub fn days_to_merge(prd: &PullRequestDetails) -> Option<i64> {
    match (prd.state, prd.pull.closed_at) {
        (PullRequestState::Merged, Some(closed_at)) => Some(whole_days(prd.pull.created_at, closed_at)),
        _ => None,
    }
}

/// Days from creation until closing, or until `now` while still open.
pub fn days_open(prd: &PullRequestDetails, now: DateTime<Utc>) -> i64 {
    whole_days(prd.pull.created_at, prd.pull.closed_at.unwrap_or(now))
}

/// Per-actor and per-day activity over a set of events.
#[derive(Debug, Clone, Default)]
pub struct Engagement {
    person_dates: BTreeMap<String, BTreeSet<NaiveDate>>,
    daily: BTreeMap<NaiveDate, usize>,
}

impl Engagement {
    /// Aggregate `events`, leaving out every event whose actor is ignored
    /// and the still-open marker.
    pub fn from_events<'a, I>(events: I, ignore: &BTreeSet<String>) -> Self
    where
        I: IntoIterator<Item = &'a Event>,
    {
        let mut engagement = Engagement::default();
        for event in events {
            if !event.is_activity() || is_ignored(event, ignore) {
                continue;
            }
            let date = event.date.date_naive();
            if let Some(person) = &event.person {
                engagement
                    .person_dates
                    .entry(person.clone())
                    .or_default()
                    .insert(date);
            }
            *engagement.daily.entry(date).or_insert(0) += 1;
        }
        engagement
    }

    /// Distinct active dates per actor, most engaged first.
    pub fn engaged_days(&self) -> Vec<(String, usize)> {
        let mut pairs: Vec<(String, usize)> = self
            .person_dates
            .iter()
            .map(|(person, dates)| (person.clone(), dates.len()))
            .collect();
        pairs.sort_by(|a, b| b.1.cmp(&a.1));
        pairs
    }

    /// Event count per calendar date, newest date first.
    pub fn daily_activity(&self) -> Vec<(NaiveDate, usize)> {
        self.daily.iter().rev().map(|(d, c)| (*d, *c)).collect()
    }

    pub fn max_daily_activity(&self) -> usize {
        self.daily.values().copied().max().unwrap_or(0)
    }
}

/// Whether an event's actor is in the ignore set.
pub fn is_ignored(event: &Event, ignore: &BTreeSet<String>) -> bool {
    event
        .person
        .as_ref()
        .is_some_and(|person| ignore.contains(person))
}

/// Length of a proportional bar, rounded down.
pub fn bar_length(count: usize, max: usize, width: usize) -> usize {
    if max == 0 {
        return 0;
    }
    count * width / max
}
