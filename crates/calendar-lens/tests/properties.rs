//! Property tests for the invariants the engines rely on.

use calendar_lens::parser::unfold;
use calendar_lens::{
    conflicts, occupancy, overlap, simulate, stress, utilization, BucketSpec, Calendar, Event,
    Granularity, Interval, OccupancyKey,
};
use chrono::{DateTime, Duration, TimeZone};
use chrono_tz::Tz;
use proptest::prelude::*;

fn base() -> DateTime<Tz> {
    Tz::UTC.with_ymd_and_hms(2025, 8, 11, 0, 0, 0).unwrap()
}

/// Intervals within one week, minute resolution, 1 minute to 8 hours long.
fn arb_interval() -> impl Strategy<Value = Interval> {
    (0i64..7 * 24 * 60, 1i64..8 * 60).prop_map(|(offset, length)| {
        let start = base() + Duration::minutes(offset);
        Interval::new(start, start + Duration::minutes(length)).unwrap()
    })
}

fn arb_calendar() -> impl Strategy<Value = Calendar> {
    prop::collection::vec(arb_interval(), 0..12).prop_map(|intervals| {
        intervals
            .into_iter()
            .enumerate()
            .map(|(i, iv)| {
                Event::new(iv.start(), iv.end())
                    .unwrap()
                    .with_uid(format!("e{i}"))
            })
            .collect()
    })
}

/// Fold a logical line the way a writer would: break every `width` chars
/// and prefix the continuation with one space.
fn fold(line: &str, width: usize) -> String {
    let chars: Vec<char> = line.chars().collect();
    chars
        .chunks(width)
        .map(|chunk| chunk.iter().collect::<String>())
        .collect::<Vec<_>>()
        .join("\r\n ")
}

proptest! {
    #[test]
    fn overlap_is_symmetric(a in arb_interval(), b in arb_interval()) {
        prop_assert_eq!(overlap(&a, &b), overlap(&b, &a));
    }

    #[test]
    fn overlap_empty_iff_disjoint(a in arb_interval(), b in arb_interval()) {
        let disjoint = a.end() <= b.start() || b.end() <= a.start();
        prop_assert_eq!(overlap(&a, &b).is_none(), disjoint);
    }

    #[test]
    fn overlap_lies_within_both(a in arb_interval(), b in arb_interval()) {
        if let Some(shared) = overlap(&a, &b) {
            prop_assert!(shared.start() >= a.start() && shared.start() >= b.start());
            prop_assert!(shared.end() <= a.end() && shared.end() <= b.end());
        }
    }

    #[test]
    fn unfold_reverses_fold(text in "[A-Z]{1,8}:[ -~]{0,200}", width in 10usize..75) {
        let folded = fold(&text, width);
        let lines: Vec<String> = unfold(&folded).map(|l| l.text).collect();
        prop_assert_eq!(lines, vec![text]);
    }

    #[test]
    fn simulate_matches_conflicts_with_candidate(
        calendar in arb_calendar(),
        candidate in arb_interval(),
    ) {
        let result = simulate(&calendar, candidate.start(), candidate.end()).unwrap();

        let n = calendar.len();
        let mut events = calendar.into_events();
        events.push(Event::new(candidate.start(), candidate.end()).unwrap());
        let expected: Vec<_> = conflicts(&Calendar::from_events(events))
            .into_iter()
            .filter(|r| r.index_b == n)
            .map(|r| (r.index_a, r.overlap_start, r.overlap_end, r.overlap_minutes))
            .collect();
        let actual: Vec<_> = result
            .impacted
            .iter()
            .map(|r| (r.index, r.overlap_start, r.overlap_end, r.overlap_minutes))
            .collect();

        prop_assert_eq!(result.would_conflict, !actual.is_empty());
        prop_assert_eq!(actual, expected);
    }

    #[test]
    fn conflicts_cover_every_overlapping_pair(calendar in arb_calendar()) {
        let events = calendar.events();
        let mut expected = 0;
        for i in 0..events.len() {
            for j in i + 1..events.len() {
                if events[i].interval().overlaps(&events[j].interval()) {
                    expected += 1;
                }
            }
        }
        let records = conflicts(&calendar);
        prop_assert_eq!(records.len(), expected);
        prop_assert!(records.iter().all(|r| r.index_a < r.index_b && r.overlap_minutes > 0));
    }

    #[test]
    fn occupancy_never_exceeds_wall_clock(calendar in arb_calendar()) {
        for row in occupancy(&calendar, Granularity::Day, &Tz::UTC) {
            prop_assert!(row.busy_minutes <= 24 * 60);
        }
        let berlin = chrono_tz::Europe::Berlin;
        for row in occupancy(&calendar, Granularity::Day, &berlin) {
            prop_assert!(row.busy_minutes <= 25 * 60);
        }
    }

    #[test]
    fn utilization_bounds_occupancy(calendar in arb_calendar()) {
        // Events that cross midnight are split differently by the two tables;
        // keep only same-day events.
        let same_day: Calendar = calendar
            .iter()
            .filter(|e| e.start().date_naive() == (e.end() - Duration::seconds(1)).date_naive())
            .cloned()
            .collect();

        let occ = occupancy(&same_day, Granularity::Day, &Tz::UTC);
        let util = utilization(&same_day, &BucketSpec::Day, &Tz::UTC).unwrap();
        prop_assert_eq!(occ.len(), util.len());

        for (o, u) in occ.iter().zip(util.iter()) {
            let OccupancyKey::Day { date } = o.key else {
                unreachable!("day granularity")
            };
            prop_assert_eq!(calendar_lens::BucketKey::Date(date), u.bucket);
            prop_assert!(u.total_minutes >= o.busy_minutes as f64);
        }
    }

    #[test]
    fn stress_is_bounded(minutes in 0.0f64..1e12) {
        let score = stress(minutes);
        prop_assert!((0.0..100.0).contains(&score));
    }

    #[test]
    fn stress_is_strictly_increasing(minutes in 0.0f64..2_000.0, step in 1.0f64..600.0) {
        prop_assert!(stress(minutes + step) > stress(minutes));
    }

    #[test]
    fn stress_never_decreases(minutes in 0.0f64..1e9, step in 0.0f64..1e6) {
        prop_assert!(stress(minutes + step) >= stress(minutes));
    }
}

#[test]
fn utilization_equals_occupancy_without_overlap() {
    let t = base() + Duration::hours(9);
    let calendar = Calendar::from_events(vec![
        Event::new(t, t + Duration::minutes(50)).unwrap(),
        Event::new(t + Duration::hours(1), t + Duration::minutes(95)).unwrap(),
        Event::new(t + Duration::hours(3), t + Duration::hours(5)).unwrap(),
    ]);
    let occ = occupancy(&calendar, Granularity::Day, &Tz::UTC);
    let util = utilization(&calendar, &BucketSpec::Day, &Tz::UTC).unwrap();
    assert_eq!(occ[0].busy_minutes, 205);
    assert_eq!(util[0].total_minutes, 205.0);
}

#[test]
fn utilization_exceeds_occupancy_with_overlap() {
    let t = base() + Duration::hours(9);
    let calendar = Calendar::from_events(vec![
        Event::new(t, t + Duration::hours(2)).unwrap(),
        Event::new(t + Duration::hours(1), t + Duration::hours(3)).unwrap(),
    ]);
    let occ = occupancy(&calendar, Granularity::Day, &Tz::UTC);
    let util = utilization(&calendar, &BucketSpec::Day, &Tz::UTC).unwrap();
    assert_eq!(occ[0].busy_minutes, 180);
    assert_eq!(util[0].total_minutes, 240.0);
    assert!(util[0].total_minutes > occ[0].busy_minutes as f64);
}

#[test]
fn stress_at_zero_is_zero() {
    assert_eq!(stress(0.0), 0.0);
}
