//! Value decoders for text, datetime and duration property values.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use chrono_tz::Tz;

use crate::error::{LensError, Result};
use crate::zone::{localize, resolve_timezone, CalendarDuration};

// ── Text ────────────────────────────────────────────────────────────────────

/// Unescape a TEXT value.
///
/// Replacements run in a fixed order (`\n`/`\N`, then `\,`, then `\;`, then
/// `\\`) so an already-unescaped sequence is never unescaped twice.
pub fn unescape_text(value: &str) -> String {
    value
        .replace("\\n", "\n")
        .replace("\\N", "\n")
        .replace("\\,", ",")
        .replace("\\;", ";")
        .replace("\\\\", "\\")
}

// ── Datetime ────────────────────────────────────────────────────────────────

/// Parse a DATE-TIME or DATE value.
///
/// UTC form (trailing `Z`): with `Z` and `T` removed, 14, 12 or 8 digits give
/// second, minute or date precision. Local form: `yyyymmddTHHMMSS`,
/// `yyyymmddTHHMM` or `yyyymmdd`, resolved in `tzid` when given, else UTC.
/// Date-only values resolve to local midnight. A wall time skipped by a DST
/// transition is moved forward by the gap length (see [`localize`]).
///
/// # Errors
///
/// [`LensError::InvalidDatetime`] for any other shape or an out-of-range
/// field, and [`LensError::InvalidTimezone`] for an unknown `tzid`.
pub fn parse_datetime(value: &str, tzid: Option<&str>) -> Result<DateTime<Tz>> {
    let value = value.trim();
    if !value.is_ascii() {
        return Err(LensError::InvalidDatetime(format!("'{value}'")));
    }

    if let Some(utc) = value.strip_suffix('Z') {
        let compact = utc.replace('T', "");
        let naive = match compact.len() {
            14 | 12 => civil(value, &compact[..8], &compact[8..])?,
            8 => civil(value, &compact, "")?,
            n => {
                return Err(LensError::InvalidDatetime(format!(
                    "unsupported UTC datetime length {n}: '{value}'"
                )))
            }
        };
        return localize(&Tz::UTC, &naive);
    }

    let naive = match value.len() {
        15 | 13 if value.as_bytes()[8] == b'T' => civil(value, &value[..8], &value[9..])?,
        8 => civil(value, value, "")?,
        n => {
            return Err(LensError::InvalidDatetime(format!(
                "unsupported local datetime length {n}: '{value}'"
            )))
        }
    };

    let tz = match tzid {
        Some(name) => resolve_timezone(name)?,
        None => Tz::UTC,
    };
    localize(&tz, &naive)
}

/// Parse a `VALUE=DATE` value. Only the 8-digit date form is accepted.
pub fn parse_date(value: &str, tzid: Option<&str>) -> Result<DateTime<Tz>> {
    let date = value.trim().trim_end_matches('Z');
    if date.len() != 8 {
        return Err(LensError::InvalidDatetime(format!(
            "expected yyyymmdd date: '{}'",
            value.trim()
        )));
    }
    parse_datetime(value, tzid)
}

/// Build a naive datetime from an 8-digit date and a 0, 4 or 6 digit time.
fn civil(original: &str, date: &str, time: &str) -> Result<NaiveDateTime> {
    let invalid = || LensError::InvalidDatetime(format!("'{original}'"));

    let year = digits(&date[..4]).ok_or_else(invalid)? as i32;
    let month = digits(&date[4..6]).ok_or_else(invalid)?;
    let day = digits(&date[6..8]).ok_or_else(invalid)?;
    let date = NaiveDate::from_ymd_opt(year, month, day).ok_or_else(invalid)?;

    let (hour, minute, second) = match time.len() {
        0 => (0, 0, 0),
        4 => (
            digits(&time[..2]).ok_or_else(invalid)?,
            digits(&time[2..4]).ok_or_else(invalid)?,
            0,
        ),
        6 => (
            digits(&time[..2]).ok_or_else(invalid)?,
            digits(&time[2..4]).ok_or_else(invalid)?,
            digits(&time[4..6]).ok_or_else(invalid)?,
        ),
        _ => return Err(invalid()),
    };

    date.and_hms_opt(hour, minute, second).ok_or_else(invalid)
}

fn digits(s: &str) -> Option<u32> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

// ── Duration ────────────────────────────────────────────────────────────────

/// Parse a DURATION value of the form `P[nW][nD][T[nH][nM][nS]]`.
///
/// Absent components are zero and components must appear in that order. An
/// optional leading `+` is accepted; negative durations are not.
///
/// # Errors
///
/// Returns [`LensError::InvalidDuration`] for anything else.
pub fn parse_duration(value: &str) -> Result<CalendarDuration> {
    let original = value.trim();
    let invalid = |why: &str| LensError::InvalidDuration(format!("{why}: '{original}'"));

    let body = original.strip_prefix('+').unwrap_or(original);
    let body = body
        .strip_prefix('P')
        .ok_or_else(|| invalid("duration must start with 'P'"))?;

    let (date_part, time_part) = match body.split_once('T') {
        Some((date, time)) => (date, time),
        None => (body, ""),
    };

    let [weeks, days] = components(date_part, ['W', 'D']).map_err(|why| invalid(&why))?;
    let [hours, minutes, seconds] =
        components(time_part, ['H', 'M', 'S']).map_err(|why| invalid(&why))?;

    Ok(CalendarDuration {
        weeks,
        days,
        hours,
        minutes,
        seconds,
    })
}

/// Read `<digits><unit>` pairs whose units appear in `units` order, each at
/// most once.
fn components<const N: usize>(
    part: &str,
    units: [char; N],
) -> std::result::Result<[i64; N], String> {
    let mut values = [0i64; N];
    let mut next_unit = 0;
    let mut number = String::new();

    for ch in part.chars() {
        if ch.is_ascii_digit() {
            number.push(ch);
            continue;
        }
        let slot = units[next_unit..]
            .iter()
            .position(|&u| u == ch)
            .map(|offset| next_unit + offset)
            .ok_or_else(|| format!("unexpected '{ch}'"))?;
        if number.is_empty() {
            return Err(format!("expected number before '{ch}'"));
        }
        values[slot] = number
            .parse()
            .map_err(|_| format!("number too large before '{ch}'"))?;
        number.clear();
        next_unit = slot + 1;
    }

    if !number.is_empty() {
        return Err("number without unit".to_string());
    }
    Ok(values)
}
