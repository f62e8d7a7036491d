//! Conflict, gap and what-if analysis over a [`Calendar`].
//!
//! All three operations are built on [`interval::overlap`](crate::interval::overlap)
//! and never mutate their input.

use chrono::{DateTime, Duration};
use chrono_tz::Tz;
use serde::Serialize;

use crate::calendar::{Calendar, Event};
use crate::error::Result;
use crate::interval::{overlap, Interval};
use crate::zone::{serialize_minutes, serialize_rfc3339};

/// Two events whose intervals overlap.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConflictRecord {
    /// Position of the first event in the calendar.
    pub index_a: usize,
    /// Position of the second event; always greater than `index_a`.
    pub index_b: usize,
    pub uid_a: Option<String>,
    pub uid_b: Option<String>,
    #[serde(serialize_with = "serialize_rfc3339")]
    pub overlap_start: DateTime<Tz>,
    #[serde(serialize_with = "serialize_rfc3339")]
    pub overlap_end: DateTime<Tz>,
    /// Overlap length rounded to the nearest minute.
    pub overlap_minutes: i64,
}

/// Find every overlapping pair of events.
///
/// Pairs are tested exhaustively (`i < j` by calendar position) and reported
/// in that enumeration order, not sorted by time. This is quadratic in the
/// number of events.
pub fn conflicts(calendar: &Calendar) -> Vec<ConflictRecord> {
    let events = calendar.events();
    let mut records = Vec::new();

    for (i, a) in events.iter().enumerate() {
        let a_interval = a.interval();
        for (j, b) in events.iter().enumerate().skip(i + 1) {
            if let Some(shared) = overlap(&a_interval, &b.interval()) {
                records.push(ConflictRecord {
                    index_a: i,
                    index_b: j,
                    uid_a: a.uid().map(str::to_string),
                    uid_b: b.uid().map(str::to_string),
                    overlap_start: shared.start(),
                    overlap_end: shared.end(),
                    overlap_minutes: shared.rounded_minutes(),
                });
            }
        }
    }
    records
}

/// Two start-adjacent events separated by less than the threshold.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GapRecord {
    pub uid_prev: Option<String>,
    pub uid_next: Option<String>,
    /// `next.start - prev.end`; negative when the events overlap.
    #[serde(rename = "gap_minutes", serialize_with = "serialize_minutes")]
    pub gap: Duration,
}

/// Report adjacent events (in start order) whose gap is below `threshold`.
///
/// Only immediately adjacent pairs are inspected: a short event nested inside
/// a long one is compared with its neighbours in start order, not with every
/// event it touches.
pub fn find_overloads(calendar: &Calendar, threshold: Duration) -> Vec<GapRecord> {
    calendar
        .sorted_by_start()
        .windows(2)
        .filter_map(|pair| {
            let (prev, next) = (pair[0], pair[1]);
            let gap = next.start() - prev.end();
            (gap < threshold).then(|| GapRecord {
                uid_prev: prev.uid().map(str::to_string),
                uid_next: next.uid().map(str::to_string),
                gap,
            })
        })
        .collect()
}

/// An existing event a candidate interval would collide with.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImpactRecord {
    /// Position of the impacted event in the calendar.
    pub index: usize,
    pub uid: Option<String>,
    pub summary: Option<String>,
    #[serde(serialize_with = "serialize_rfc3339")]
    pub overlap_start: DateTime<Tz>,
    #[serde(serialize_with = "serialize_rfc3339")]
    pub overlap_end: DateTime<Tz>,
    pub overlap_minutes: i64,
}

/// The outcome of a what-if check.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Simulation {
    pub would_conflict: bool,
    pub impacted: Vec<ImpactRecord>,
}

/// Check whether a new event on `[start, stop)` would collide with the
/// calendar.
///
/// # Errors
///
/// Returns [`LensError::InvalidInterval`](crate::LensError::InvalidInterval)
/// unless `start < stop`.
pub fn simulate(
    calendar: &Calendar,
    start: DateTime<Tz>,
    stop: DateTime<Tz>,
) -> Result<Simulation> {
    let candidate = Interval::new(start, stop)?;
    Ok(simulate_interval(calendar, &candidate))
}

/// [`simulate`] for an already-validated candidate.
pub fn simulate_interval(calendar: &Calendar, candidate: &Interval) -> Simulation {
    let impacted: Vec<ImpactRecord> = calendar
        .iter()
        .enumerate()
        .filter_map(|(index, event)| impact(index, event, candidate))
        .collect();

    Simulation {
        would_conflict: !impacted.is_empty(),
        impacted,
    }
}

fn impact(index: usize, event: &Event, candidate: &Interval) -> Option<ImpactRecord> {
    let shared = overlap(&event.interval(), candidate)?;
    Some(ImpactRecord {
        index,
        uid: event.uid().map(str::to_string),
        summary: event.summary().map(str::to_string),
        overlap_start: shared.start(),
        overlap_end: shared.end(),
        overlap_minutes: shared.rounded_minutes(),
    })
}
