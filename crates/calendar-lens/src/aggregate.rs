//! Time-bucketed occupancy, utilization statistics and stress scoring.
//!
//! The two tables deliberately count differently:
//!
//! - [`occupancy`] counts distinct busy minutes per bucket, so overlapping
//!   events never count the same minute twice.
//! - [`utilization`] sums raw per-event durations, so overlapping events are
//!   counted once per event.

use std::collections::{BTreeMap, HashSet};
use std::str::FromStr;

use chrono::{DateTime, Datelike, NaiveDate, Timelike, Utc, Weekday};
use chrono_tz::Tz;
use serde::Serialize;

use crate::calendar::Calendar;
use crate::error::{LensError, Result};
use crate::parser::parse_duration;
use crate::zone::{add_calendar_duration, minutes, serialize_rfc3339, CalendarDuration};

const WEEKDAYS: [Weekday; 7] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
    Weekday::Sun,
];

/// Minutes at which [`stress`] reaches `1 - 1/e` (≈ 63.2).
const STRESS_SCALE_MINUTES: f64 = 240.0;

// ── Occupancy ───────────────────────────────────────────────────────────────

/// Occupancy grouping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Granularity {
    /// One bucket per calendar date.
    Day,
    /// One bucket per (weekday, hour-of-day), across all weeks.
    Hour,
}

impl FromStr for Granularity {
    type Err = LensError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "day" => Ok(Granularity::Day),
            "hour" => Ok(Granularity::Hour),
            other => Err(LensError::InvalidGranularity(format!(
                "'{other}' (expected 'day' or 'hour')"
            ))),
        }
    }
}

/// Bucket key of an occupancy row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum OccupancyKey {
    Day { date: NaiveDate },
    Hour { weekday: Weekday, hour: u32 },
}

/// Distinct busy minutes in one bucket.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OccupancyRow {
    #[serde(flatten)]
    pub key: OccupancyKey,
    pub busy_minutes: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Slot {
    Day(NaiveDate),
    Hour(usize, u32),
}

impl Slot {
    fn of(local: &DateTime<Tz>, granularity: Granularity) -> Self {
        match granularity {
            Granularity::Day => Slot::Day(local.date_naive()),
            Granularity::Hour => Slot::Hour(
                local.weekday().num_days_from_monday() as usize,
                local.hour(),
            ),
        }
    }

    fn key(self) -> OccupancyKey {
        match self {
            Slot::Day(date) => OccupancyKey::Day { date },
            Slot::Hour(day, hour) => OccupancyKey::Hour {
                weekday: WEEKDAYS[day],
                hour,
            },
        }
    }
}

/// Count busy minutes per bucket, bucketing in `tz`.
///
/// Each event covers the absolute minutes `[floor(start), ceil(end))`; a
/// minute belongs to the bucket its first instant falls in. Minutes are
/// collected as a set per bucket, so overlapping events count once. Rows are
/// ordered by date, or by weekday then hour.
pub fn occupancy(calendar: &Calendar, granularity: Granularity, tz: &Tz) -> Vec<OccupancyRow> {
    let mut busy: BTreeMap<Slot, HashSet<i64>> = BTreeMap::new();

    for event in calendar {
        let first = event.start().timestamp().div_euclid(60);
        let last = (event.end().timestamp() + 59).div_euclid(60);
        for minute in first..last {
            let Some(instant) = DateTime::<Utc>::from_timestamp(minute * 60, 0) else {
                continue;
            };
            let slot = Slot::of(&instant.with_timezone(tz), granularity);
            busy.entry(slot).or_default().insert(minute);
        }
    }

    busy.into_iter()
        .map(|(slot, covered)| OccupancyRow {
            key: slot.key(),
            busy_minutes: covered.len() as u64,
        })
        .collect()
}

// ── Utilization ─────────────────────────────────────────────────────────────

/// Utilization grouping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BucketSpec {
    /// Calendar date of the event start.
    Day,
    /// Monday of the ISO week of the event start.
    Week,
    /// First day of the month of the event start.
    Month,
    /// Fixed windows stepped from the earliest event start.
    Every(CalendarDuration),
}

impl FromStr for BucketSpec {
    type Err = LensError;

    /// Accepts `day`, `week`, `month`, an ISO duration (`P3D`), or
    /// `<n> <unit>` with unit minute(s), hour(s), day(s) or week(s).
    fn from_str(s: &str) -> Result<Self> {
        let spec = s.trim().to_ascii_lowercase();
        let invalid = || LensError::InvalidBucket(format!("'{}'", s.trim()));

        let period = match spec.as_str() {
            "day" => return Ok(BucketSpec::Day),
            "week" => return Ok(BucketSpec::Week),
            "month" => return Ok(BucketSpec::Month),
            iso if iso.starts_with('p') => {
                parse_duration(&iso.to_ascii_uppercase()).map_err(|_| invalid())?
            }
            other => {
                let mut parts = other.split_whitespace();
                let (Some(count), Some(unit), None) = (parts.next(), parts.next(), parts.next())
                else {
                    return Err(invalid());
                };
                let n: i64 = count.parse().map_err(|_| invalid())?;
                match unit {
                    "minute" | "minutes" => CalendarDuration::minutes(n),
                    "hour" | "hours" => CalendarDuration::hours(n),
                    "day" | "days" => CalendarDuration::days(n),
                    "week" | "weeks" => CalendarDuration {
                        weeks: n,
                        ..Default::default()
                    },
                    _ => return Err(invalid()),
                }
            }
        };

        if period.total_days() < 0 || period.exact_seconds() < 0 || period.is_zero() {
            return Err(invalid());
        }
        Ok(BucketSpec::Every(period))
    }
}

/// Bucket key of a utilization row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(untagged)]
pub enum BucketKey {
    Date(NaiveDate),
    Start(#[serde(serialize_with = "serialize_rfc3339")] DateTime<Tz>),
}

/// Per-bucket duration statistics, in minutes.
///
/// `std_minutes` is the sample standard deviation (n − 1 denominator) and is
/// NaN for a single-event bucket.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UtilizationRow {
    pub bucket: BucketKey,
    pub total_minutes: f64,
    pub event_count: usize,
    pub mean_minutes: f64,
    pub median_minutes: f64,
    pub std_minutes: f64,
}

/// Sum and describe event durations per bucket, bucketing in `tz`.
///
/// Every event is assigned wholly to the bucket of its start. Only buckets
/// with at least one event are returned, in bucket order.
///
/// # Errors
///
/// Returns [`LensError::InvalidBucket`] for a non-positive fixed period. An
/// edge whose wall time falls in a DST gap moves forward by the gap length.
pub fn utilization(calendar: &Calendar, spec: &BucketSpec, tz: &Tz) -> Result<Vec<UtilizationRow>> {
    let events = calendar.convert_zone(tz);
    let mut buckets: BTreeMap<BucketKey, Vec<f64>> = BTreeMap::new();

    match spec {
        BucketSpec::Day | BucketSpec::Week | BucketSpec::Month => {
            for event in &events {
                let date = event.start().date_naive();
                let anchor = match spec {
                    BucketSpec::Week => week_anchor(date),
                    BucketSpec::Month => date.with_day(1).unwrap_or(date),
                    _ => date,
                };
                buckets
                    .entry(BucketKey::Date(anchor))
                    .or_default()
                    .push(minutes(event.duration()));
            }
        }
        BucketSpec::Every(period) => {
            let edges = fixed_edges(&events, period)?;
            for event in &events {
                let idx = edges.partition_point(|edge| *edge <= event.start());
                // The first edge is the earliest start, so idx >= 1.
                let edge = edges[idx.saturating_sub(1)];
                buckets
                    .entry(BucketKey::Start(edge))
                    .or_default()
                    .push(minutes(event.duration()));
            }
        }
    }

    Ok(buckets
        .into_iter()
        .map(|(bucket, durations)| describe(bucket, durations))
        .collect())
}

fn week_anchor(date: NaiveDate) -> NaiveDate {
    date - chrono::Duration::days(i64::from(date.weekday().num_days_from_monday()))
}

/// Bucket edges from the earliest start, stepping by `period` until past the
/// latest end.
///
/// Edge `k` is `first + k * period`, so an edge pushed forward by a DST gap
/// does not shift the edges after it.
fn fixed_edges(events: &Calendar, period: &CalendarDuration) -> Result<Vec<DateTime<Tz>>> {
    let (Some(first), Some(last)) = (
        events.iter().map(|e| e.start()).min(),
        events.iter().map(|e| e.end()).max(),
    ) else {
        return Ok(Vec::new());
    };

    let mut edges = vec![first];
    let mut edge = first;
    let mut step: i64 = 0;
    while edge <= last {
        step += 1;
        let next = add_calendar_duration(&first, &period.times(step))?;
        if next <= edge {
            return Err(LensError::InvalidBucket(format!(
                "period {:?} does not advance from {}",
                period,
                edge.to_rfc3339()
            )));
        }
        edges.push(next);
        edge = next;
    }
    Ok(edges)
}

fn describe(bucket: BucketKey, mut durations: Vec<f64>) -> UtilizationRow {
    let n = durations.len();
    let total: f64 = durations.iter().sum();
    let mean = total / n as f64;

    durations.sort_by(f64::total_cmp);
    let median = if n % 2 == 1 {
        durations[n / 2]
    } else {
        (durations[n / 2 - 1] + durations[n / 2]) / 2.0
    };

    let std_dev = if n < 2 {
        f64::NAN
    } else {
        let ss: f64 = durations.iter().map(|d| (d - mean).powi(2)).sum();
        (ss / (n - 1) as f64).sqrt()
    };

    UtilizationRow {
        bucket,
        total_minutes: total,
        event_count: n,
        mean_minutes: mean,
        median_minutes: median,
        std_minutes: std_dev,
    }
}

// ── Stress ──────────────────────────────────────────────────────────────────

/// Saturating load score in `[0, 100)`.
///
/// `100 * (1 - exp(-busy_minutes / 240))`: 0 at 0 minutes, ≈ 63.2 at 240
/// minutes. Results are capped just below 100, which floating point would
/// otherwise reach for very large inputs.
///
/// The score is strictly increasing only until `f64` saturates, around 8800
/// minutes. Past that point it stays flat at the cap and never reaches 100.
pub fn stress(busy_minutes: f64) -> f64 {
    let score = -100.0 * (-busy_minutes / STRESS_SCALE_MINUTES).exp_m1();
    score.min(100.0_f64.next_down())
}

/// A table row that carries a busy-minute total.
pub trait BusyMinutes {
    fn busy_minutes(&self) -> f64;
}

impl BusyMinutes for OccupancyRow {
    fn busy_minutes(&self) -> f64 {
        self.busy_minutes as f64
    }
}

impl BusyMinutes for UtilizationRow {
    fn busy_minutes(&self) -> f64 {
        self.total_minutes
    }
}

/// [`stress`] of any occupancy or utilization row.
pub fn stress_of<R: BusyMinutes>(row: &R) -> f64 {
    stress(row.busy_minutes())
}
