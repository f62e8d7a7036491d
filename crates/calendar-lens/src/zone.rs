//! Timezone resolution and calendar-aware arithmetic.
//!
//! Every timestamp in this crate is a `DateTime<Tz>`: an absolute instant
//! paired with the IANA zone used to render it. UTC values carry
//! [`Tz::UTC`], so zoned and UTC timestamps share one type and compare by
//! instant.
//!
//! # Functions
//!
//! - [`resolve_timezone`] — IANA name → [`Tz`] handle
//! - [`localize`] — wall-clock time in a zone → zoned timestamp
//! - [`add_calendar_duration`] — DST-aware addition of a [`CalendarDuration`]

use chrono::{DateTime, Duration, LocalResult, NaiveDateTime, Offset, TimeZone};
use chrono_tz::Tz;
use serde::Serializer;

use crate::error::{LensError, Result};

/// Resolve an IANA timezone name (e.g. `"Europe/Istanbul"`) into a handle.
///
/// # Errors
///
/// Returns [`LensError::InvalidTimezone`] if the name is not in the IANA database.
pub fn resolve_timezone(name: &str) -> Result<Tz> {
    name.trim()
        .parse::<Tz>()
        .map_err(|_| LensError::InvalidTimezone(format!("'{}'", name)))
}

/// Attach `tz` to a wall-clock datetime.
///
/// An ambiguous wall time (the repeated hour when clocks fall back) resolves
/// to the earlier of the two instants. A wall time skipped by a spring-forward
/// transition is read with the offset in effect before the gap, which moves it
/// forward by the gap length: 02:30 on a New York spring-forward day becomes
/// 03:30 EDT.
///
/// # Errors
///
/// Returns [`LensError::NonexistentLocalTime`] only when a gap time sits at
/// the edge of the representable range.
pub fn localize(tz: &Tz, naive: &NaiveDateTime) -> Result<DateTime<Tz>> {
    match tz.from_local_datetime(naive) {
        LocalResult::Single(dt) => Ok(dt),
        LocalResult::Ambiguous(earliest, _) => Ok(earliest),
        LocalResult::None => {
            let out_of_range =
                || LensError::NonexistentLocalTime(format!("{} does not exist in {}", naive, tz));
            // Transitions are months apart, so a day earlier is before the gap.
            let before = naive
                .checked_sub_signed(Duration::days(1))
                .ok_or_else(out_of_range)?;
            let offset = tz.offset_from_utc_datetime(&before).fix();
            let utc = naive
                .checked_sub_offset(offset)
                .ok_or_else(out_of_range)?;
            Ok(tz.from_utc_datetime(&utc))
        }
    }
}

/// A nominal duration with a calendar (week/day) part and an exact
/// (hour/minute/second) part.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CalendarDuration {
    pub weeks: i64,
    pub days: i64,
    pub hours: i64,
    pub minutes: i64,
    pub seconds: i64,
}

impl CalendarDuration {
    pub fn days(days: i64) -> Self {
        Self {
            days,
            ..Default::default()
        }
    }

    pub fn hours(hours: i64) -> Self {
        Self {
            hours,
            ..Default::default()
        }
    }

    pub fn minutes(minutes: i64) -> Self {
        Self {
            minutes,
            ..Default::default()
        }
    }

    /// Total calendar days (weeks folded in).
    pub fn total_days(&self) -> i64 {
        self.weeks.saturating_mul(7).saturating_add(self.days)
    }

    /// The exact sub-day part in seconds.
    pub fn exact_seconds(&self) -> i64 {
        self.hours
            .saturating_mul(3600)
            .saturating_add(self.minutes.saturating_mul(60))
            .saturating_add(self.seconds)
    }

    pub fn is_zero(&self) -> bool {
        self.total_days() == 0 && self.exact_seconds() == 0
    }

    /// Every component multiplied by `n`.
    pub fn times(&self, n: i64) -> Self {
        Self {
            weeks: self.weeks.saturating_mul(n),
            days: self.days.saturating_mul(n),
            hours: self.hours.saturating_mul(n),
            minutes: self.minutes.saturating_mul(n),
            seconds: self.seconds.saturating_mul(n),
        }
    }
}

/// Add a [`CalendarDuration`] to a zoned timestamp.
///
/// The day part moves the local date while keeping the wall-clock time, so
/// `+1 day` across a DST transition is 23 or 25 real hours. The exact part is
/// then added as elapsed time.
///
/// # Errors
///
/// Returns [`LensError::InvalidDuration`] on calendar overflow. A day step
/// that lands in a DST gap is moved forward by [`localize`].
pub fn add_calendar_duration(
    dt: &DateTime<Tz>,
    duration: &CalendarDuration,
) -> Result<DateTime<Tz>> {
    let tz = dt.timezone();
    let overflow = || LensError::InvalidDuration(format!("{:?} overflows from {}", duration, dt));

    let shifted = if duration.total_days() != 0 {
        let step = Duration::try_days(duration.total_days()).ok_or_else(overflow)?;
        let date = dt
            .date_naive()
            .checked_add_signed(step)
            .ok_or_else(overflow)?;
        localize(&tz, &date.and_time(dt.time()))?
    } else {
        *dt
    };

    let exact = Duration::try_seconds(duration.exact_seconds()).ok_or_else(overflow)?;
    shifted.checked_add_signed(exact).ok_or_else(overflow)
}

/// Length of a [`Duration`] in fractional minutes.
pub fn minutes(duration: Duration) -> f64 {
    duration.num_milliseconds() as f64 / 60_000.0
}

pub(crate) fn serialize_rfc3339<S>(
    dt: &DateTime<Tz>,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&dt.to_rfc3339())
}

pub(crate) fn serialize_minutes<S>(
    duration: &Duration,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_f64(minutes(*duration))
}
