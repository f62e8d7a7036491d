//! Half-open time intervals and the overlap primitive.
//!
//! Every overlap question in the crate (pairwise conflicts, what-if
//! simulation) goes through [`overlap`], so "would this new event conflict"
//! and "do these two events conflict" always agree.

use chrono::{DateTime, Duration};
use chrono_tz::Tz;
use serde::Serialize;

use crate::error::{LensError, Result};
use crate::zone::{minutes, serialize_rfc3339};

/// A non-empty half-open range `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Interval {
    #[serde(serialize_with = "serialize_rfc3339")]
    start: DateTime<Tz>,
    #[serde(serialize_with = "serialize_rfc3339")]
    end: DateTime<Tz>,
}

impl Interval {
    /// # Errors
    ///
    /// Returns [`LensError::InvalidInterval`] unless `start < end`.
    pub fn new(start: DateTime<Tz>, end: DateTime<Tz>) -> Result<Self> {
        if start < end {
            Ok(Self { start, end })
        } else {
            Err(LensError::InvalidInterval(format!(
                "start {} is not before end {}",
                start.to_rfc3339(),
                end.to_rfc3339()
            )))
        }
    }

    /// For bounds already known to satisfy `start < end`.
    pub(crate) fn between(start: DateTime<Tz>, end: DateTime<Tz>) -> Self {
        debug_assert!(start < end);
        Self { start, end }
    }

    pub fn start(&self) -> DateTime<Tz> {
        self.start
    }

    pub fn end(&self) -> DateTime<Tz> {
        self.end
    }

    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    /// Length in minutes, rounded to the nearest whole minute.
    pub fn rounded_minutes(&self) -> i64 {
        minutes(self.duration()).round() as i64
    }

    pub fn contains(&self, instant: &DateTime<Tz>) -> bool {
        self.start <= *instant && *instant < self.end
    }

    pub fn overlaps(&self, other: &Interval) -> bool {
        overlap(self, other).is_some()
    }

    /// Same instants, rendered in `tz`.
    pub fn with_timezone(&self, tz: &Tz) -> Self {
        Self {
            start: self.start.with_timezone(tz),
            end: self.end.with_timezone(tz),
        }
    }
}

/// The shared part of two intervals, if any.
///
/// Two intervals overlap iff `max(a.start, b.start) < min(a.end, b.end)`, so
/// intervals that merely touch (`a.end == b.start`) do not overlap.
///
/// Both bounds of the result are rendered in the zone of `a.start`, so
/// swapping the arguments yields the same instants in `b`'s zone.
pub fn overlap(a: &Interval, b: &Interval) -> Option<Interval> {
    let tz = a.start.timezone();
    let start = a.start.max(b.start);
    let end = a.end.min(b.end);
    (start < end).then(|| Interval {
        start: start.with_timezone(&tz),
        end: end.with_timezone(&tz),
    })
}
