//! Plain tabular output for rendering and filtering consumers.
//!
//! Every result row in the crate serializes to a flat map of named fields.
//! Timestamps come out as RFC 3339 strings already rendered in the zone the
//! analysis ran in, durations as minutes, and undefined statistics as `null`.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::{LensError, Result};

/// One row: field name → value, in declaration order.
pub type Record = Map<String, Value>;

/// Convert result rows into ordered records.
///
/// # Errors
///
/// Returns [`LensError::NotTabular`] if a row does not serialize to a map.
pub fn to_records<R: Serialize>(rows: &[R]) -> Result<Vec<Record>> {
    rows.iter()
        .map(|row| match serde_json::to_value(row)? {
            Value::Object(record) => Ok(record),
            other => Err(LensError::NotTabular(other.to_string())),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::{occupancy, Granularity};
    use crate::calendar::{Calendar, Event};
    use crate::overlap::conflicts;
    use chrono::{Duration, TimeZone};
    use chrono_tz::Tz;

    fn calendar() -> Calendar {
        let t = chrono_tz::Europe::Istanbul
            .with_ymd_and_hms(2025, 8, 12, 10, 0, 0)
            .unwrap();
        Calendar::from_events(vec![
            Event::new(t, t + Duration::hours(1)).unwrap().with_uid("a"),
            Event::new(t + Duration::minutes(30), t + Duration::minutes(75))
                .unwrap()
                .with_uid("b"),
        ])
    }

    #[test]
    fn test_conflict_records_keep_field_order() {
        let records = to_records(&conflicts(&calendar())).unwrap();
        let fields: Vec<_> = records[0].keys().map(String::as_str).collect();
        assert_eq!(
            fields,
            vec![
                "index_a",
                "index_b",
                "uid_a",
                "uid_b",
                "overlap_start",
                "overlap_end",
                "overlap_minutes"
            ]
        );
        assert_eq!(records[0]["overlap_start"], "2025-08-12T10:30:00+03:00");
        assert_eq!(records[0]["overlap_minutes"], 30);
    }

    #[test]
    fn test_occupancy_records_are_flat() {
        let records = to_records(&occupancy(&calendar(), Granularity::Hour, &Tz::UTC)).unwrap();
        assert_eq!(records[0]["weekday"], "Tue");
        assert_eq!(records[0]["hour"], 7);
        assert_eq!(records[0]["busy_minutes"], 60);
        assert_eq!(records[1]["busy_minutes"], 15);
    }

    #[test]
    fn test_non_map_rows_rejected() {
        let err = to_records(&[1, 2, 3]).unwrap_err();
        assert!(matches!(err, LensError::NotTabular(_)));
    }
}
