//! Event assembly: a two-state machine over the property stream.
//!
//! `BEGIN:VEVENT` opens a fresh draft, recognized properties fill it, and
//! `END:VEVENT` validates the draft and emits an [`Event`]. Everything outside
//! an event body is ignored.

use chrono::DateTime;
use chrono_tz::Tz;
use serde::Serialize;
use tracing::{debug, trace};

use crate::calendar::Event;
use crate::error::{LensError, Result};
use crate::parser::decode::{parse_date, parse_datetime, parse_duration, unescape_text};
use crate::parser::property::{split_property, Property};
use crate::parser::unfold::LogicalLine;
use crate::zone::{add_calendar_duration, CalendarDuration};

/// What to do with an unrecognized property inside an event body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnknownPropertyPolicy {
    /// Skip it silently.
    #[default]
    Ignore,
    /// Fail the load with [`LensError::UnknownProperty`].
    Reject,
}

/// What to do with an event body that cannot become a valid [`Event`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IncompleteEventPolicy {
    /// Drop it and record a [`DroppedEvent`].
    #[default]
    Drop,
    /// Fail the load with [`LensError::IncompleteEvent`].
    Reject,
}

/// Parser leniency settings.
#[derive(Debug, Clone, Default)]
pub struct ParseOptions {
    pub unknown_properties: UnknownPropertyPolicy,
    pub incomplete_events: IncompleteEventPolicy,
}

impl ParseOptions {
    /// Reject unknown properties and incomplete events.
    pub fn strict() -> Self {
        Self {
            unknown_properties: UnknownPropertyPolicy::Reject,
            incomplete_events: IncompleteEventPolicy::Reject,
        }
    }
}

/// Why an event body was not emitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DropReason {
    /// No `DTSTART` was seen.
    MissingStart,
    /// The end is not strictly after the start.
    EmptyOrInverted,
    /// The input ended before `END:VEVENT`.
    Unterminated,
}

impl DropReason {
    fn describe(self) -> &'static str {
        match self {
            DropReason::MissingStart => "missing DTSTART",
            DropReason::EmptyOrInverted => "end is not after start",
            DropReason::Unterminated => "no END:VEVENT before end of input",
        }
    }
}

/// An event body that was dropped instead of emitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DroppedEvent {
    pub uid: Option<String>,
    /// Logical line where the body ended (its `END:VEVENT`, or the last line).
    pub line: usize,
    pub reason: DropReason,
}

#[derive(Debug, Default)]
struct Draft {
    uid: Option<String>,
    summary: Option<String>,
    category: Option<String>,
    start: Option<DateTime<Tz>>,
    end: Option<DateTime<Tz>>,
    duration: Option<CalendarDuration>,
}

#[derive(Debug)]
enum State {
    Outside,
    InEvent {
        draft: Draft,
        /// Open sub-components (e.g. `VALARM`) whose lines are skipped.
        nested: Vec<String>,
    },
}

/// Consumes logical lines and accumulates events.
#[derive(Debug)]
pub struct Assembler<'o> {
    options: &'o ParseOptions,
    state: State,
    last_line: usize,
    events: Vec<Event>,
    dropped: Vec<DroppedEvent>,
}

impl<'o> Assembler<'o> {
    pub fn new(options: &'o ParseOptions) -> Self {
        Self {
            options,
            state: State::Outside,
            last_line: 0,
            events: Vec::new(),
            dropped: Vec::new(),
        }
    }

    /// Feed one logical line.
    ///
    /// # Errors
    ///
    /// Propagates value decode failures from recognized properties, and the
    /// strict-mode rejections configured in [`ParseOptions`].
    pub fn feed(&mut self, line: &LogicalLine) -> Result<()> {
        self.last_line = line.number;
        let property = split_property(&line.text);
        let marker = property.value.trim().to_ascii_uppercase();

        match property.name.as_str() {
            "BEGIN" if marker == "VEVENT" => {
                self.state = State::InEvent {
                    draft: Draft::default(),
                    nested: Vec::new(),
                };
            }
            "BEGIN" => {
                if let State::InEvent { nested, .. } = &mut self.state {
                    nested.push(marker);
                }
            }
            "END" => {
                let closes_event = match &mut self.state {
                    State::InEvent { .. } if marker == "VEVENT" => true,
                    State::InEvent { nested, .. } => {
                        if nested.last() == Some(&marker) {
                            nested.pop();
                        }
                        false
                    }
                    State::Outside => false,
                };
                if closes_event {
                    if let State::InEvent { draft, .. } =
                        std::mem::replace(&mut self.state, State::Outside)
                    {
                        self.close(draft, line.number)?;
                    }
                }
            }
            _ => {
                if let State::InEvent { draft, nested } = &mut self.state {
                    if nested.is_empty() {
                        route(draft, &property, line.number, self.options)?;
                    }
                }
            }
        }
        Ok(())
    }

    /// Finish the stream, returning emitted and dropped events.
    pub fn finish(mut self) -> Result<(Vec<Event>, Vec<DroppedEvent>)> {
        if let State::InEvent { draft, .. } = std::mem::replace(&mut self.state, State::Outside) {
            self.drop_draft(draft.uid, self.last_line, DropReason::Unterminated)?;
        }
        debug!(
            events = self.events.len(),
            dropped = self.dropped.len(),
            "calendar parsed"
        );
        Ok((self.events, self.dropped))
    }

    fn close(&mut self, draft: Draft, line: usize) -> Result<()> {
        let Some(start) = draft.start else {
            return self.drop_draft(draft.uid, line, DropReason::MissingStart);
        };

        let end = match (draft.end, draft.duration) {
            (Some(end), _) => end,
            (None, Some(duration)) => add_calendar_duration(&start, &duration)?,
            (None, None) => add_calendar_duration(&start, &CalendarDuration::hours(1))?,
        };

        if end <= start {
            return self.drop_draft(draft.uid, line, DropReason::EmptyOrInverted);
        }

        let mut event = Event::new(start, end)?;
        event.set_details(draft.uid, draft.summary, draft.category);
        self.events.push(event);
        Ok(())
    }

    fn drop_draft(&mut self, uid: Option<String>, line: usize, reason: DropReason) -> Result<()> {
        if self.options.incomplete_events == IncompleteEventPolicy::Reject {
            return Err(LensError::IncompleteEvent {
                line,
                reason: reason.describe().to_string(),
            });
        }
        debug!(uid = ?uid, line, reason = reason.describe(), "dropping event");
        self.dropped.push(DroppedEvent { uid, line, reason });
        Ok(())
    }
}

fn route(
    draft: &mut Draft,
    property: &Property,
    line: usize,
    options: &ParseOptions,
) -> Result<()> {
    let tzid = property.param("TZID");
    match property.name.as_str() {
        "UID" => draft.uid = Some(unescape_text(&property.value)),
        "SUMMARY" => draft.summary = Some(unescape_text(&property.value)),
        "CATEGORIES" => draft.category = Some(unescape_text(&property.value)),
        // Recognized so strict mode accepts it; not kept on the event.
        "LOCATION" => {}
        "DTSTART" => draft.start = Some(decode_moment(property, tzid)?),
        "DTEND" => draft.end = Some(decode_moment(property, tzid)?),
        "DURATION" => draft.duration = Some(parse_duration(&property.value)?),
        name => {
            if options.unknown_properties == UnknownPropertyPolicy::Reject {
                return Err(LensError::UnknownProperty {
                    line,
                    name: name.to_string(),
                });
            }
            trace!(line, property = name, "ignoring property");
        }
    }
    Ok(())
}

fn decode_moment(property: &Property, tzid: Option<&str>) -> Result<DateTime<Tz>> {
    if property.is_date_value() {
        parse_date(&property.value, tzid)
    } else {
        parse_datetime(&property.value, tzid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_events;
    use chrono::{Duration, TimeZone, Utc};

    fn parse(text: &str) -> (Vec<Event>, Vec<DroppedEvent>) {
        parse_events(text, &ParseOptions::default()).unwrap()
    }

    #[test]
    fn test_assemble_dst_gap_start_and_day_duration() {
        let (events, dropped) = parse(
            "BEGIN:VEVENT\nUID:gap\nDTSTART;TZID=America/New_York:20260308T023000\nEND:VEVENT\n\
             BEGIN:VEVENT\nUID:into-gap\nDTSTART;TZID=America/New_York:20260307T023000\n\
             DURATION:P1D\nEND:VEVENT",
        );
        assert!(dropped.is_empty());
        assert_eq!(events[0].start().to_rfc3339(), "2026-03-08T03:30:00-04:00");
        assert_eq!(events[0].end().to_rfc3339(), "2026-03-08T04:30:00-04:00");
        assert_eq!(events[1].end().to_rfc3339(), "2026-03-08T03:30:00-04:00");
        assert_eq!(events[1].duration().num_hours(), 24);
    }

    #[test]
    fn test_assemble_single_event() {
        let (events, dropped) = parse(
            "BEGIN:VCALENDAR\nBEGIN:VEVENT\nUID:a-1\nSUMMARY:Design review\\, round 2\n\
             CATEGORIES:Work\nDTSTART:20250812T100000Z\nDTEND:20250812T110000Z\n\
             END:VEVENT\nEND:VCALENDAR\n",
        );
        assert!(dropped.is_empty());
        assert_eq!(events.len(), 1);
        let e = &events[0];
        assert_eq!(e.uid(), Some("a-1"));
        assert_eq!(e.summary(), Some("Design review, round 2"));
        assert_eq!(e.category(), Some("Work"));
        assert_eq!(e.start(), Utc.with_ymd_and_hms(2025, 8, 12, 10, 0, 0).unwrap());
        assert_eq!(e.end(), Utc.with_ymd_and_hms(2025, 8, 12, 11, 0, 0).unwrap());
    }

    #[test]
    fn test_missing_end_defaults_to_one_hour() {
        let (events, _) = parse("BEGIN:VEVENT\nDTSTART:20250812T100000Z\nEND:VEVENT");
        assert_eq!(events[0].duration(), Duration::hours(1));
    }

    #[test]
    fn test_duration_sets_end() {
        let (events, _) = parse("BEGIN:VEVENT\nDTSTART:20250812T100000Z\nDURATION:PT45M\nEND:VEVENT");
        assert_eq!(events[0].duration(), Duration::minutes(45));
    }

    #[test]
    fn test_dtend_wins_over_duration() {
        let (events, _) = parse(
            "BEGIN:VEVENT\nDTSTART:20250812T100000Z\nDURATION:PT45M\nDTEND:20250812T120000Z\nEND:VEVENT",
        );
        assert_eq!(events[0].duration(), Duration::hours(2));
    }

    #[test]
    fn test_day_duration_respects_dst() {
        // March 8 2026 is a 23-hour day in New York.
        let (events, _) = parse(
            "BEGIN:VEVENT\nDTSTART;TZID=America/New_York:20260307T120000\nDURATION:P1D\nEND:VEVENT",
        );
        assert_eq!(events[0].end().to_rfc3339(), "2026-03-08T12:00:00-04:00");
        assert_eq!(events[0].duration(), Duration::hours(23));
    }

    #[test]
    fn test_missing_start_is_dropped() {
        let (events, dropped) = parse("BEGIN:VEVENT\nUID:x\nSUMMARY:No start\nEND:VEVENT");
        assert!(events.is_empty());
        assert_eq!(
            dropped,
            vec![DroppedEvent {
                uid: Some("x".to_string()),
                line: 4,
                reason: DropReason::MissingStart
            }]
        );
    }

    #[test]
    fn test_empty_and_inverted_events_are_dropped() {
        let (events, dropped) = parse(
            "BEGIN:VEVENT\nDTSTART:20250812T100000Z\nDTEND:20250812T100000Z\nEND:VEVENT\n\
             BEGIN:VEVENT\nDTSTART:20250812T100000Z\nDTEND:20250812T090000Z\nEND:VEVENT\n\
             BEGIN:VEVENT\nDTSTART:20250812T100000Z\nDURATION:PT0S\nEND:VEVENT",
        );
        assert!(events.is_empty());
        assert_eq!(dropped.len(), 3);
        assert!(dropped.iter().all(|d| d.reason == DropReason::EmptyOrInverted));
    }

    #[test]
    fn test_unterminated_event_is_dropped() {
        let (events, dropped) = parse("BEGIN:VEVENT\nDTSTART:20250812T100000Z");
        assert!(events.is_empty());
        assert_eq!(dropped[0].reason, DropReason::Unterminated);
    }

    #[test]
    fn test_begin_resets_accumulator() {
        let (events, _) = parse(
            "BEGIN:VEVENT\nUID:stale\nSUMMARY:Stale\nBEGIN:VEVENT\nDTSTART:20250812T100000Z\nEND:VEVENT",
        );
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].uid(), None);
        assert_eq!(events[0].summary(), None);
    }

    #[test]
    fn test_properties_outside_event_are_ignored() {
        let (events, _) = parse(
            "DTSTART:20250812T100000Z\nSUMMARY:Orphan\nBEGIN:VEVENT\nDTSTART:20250813T100000Z\nEND:VEVENT\nDURATION:garbage",
        );
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].summary(), None);
    }

    #[test]
    fn test_unknown_properties_ignored_by_default() {
        let (events, _) = parse(
            "BEGIN:VEVENT\nX-CUSTOM:1\nATTENDEE;CN=Ana:mailto:ana@example.com\nLOCATION:Room 1\n\
             DTSTART:20250812T100000Z\nEND:VEVENT",
        );
        assert_eq!(events.len(), 1);
    }

    #[test]
    fn test_alarm_body_does_not_leak_into_event() {
        let (events, _) = parse(
            "BEGIN:VEVENT\nSUMMARY:Real\nDTSTART:20250812T100000Z\nBEGIN:VALARM\n\
             SUMMARY:Reminder\nDURATION:PT15M\nTRIGGER:-PT15M\nEND:VALARM\nEND:VEVENT",
        );
        assert_eq!(events[0].summary(), Some("Real"));
        assert_eq!(events[0].duration(), Duration::hours(1));
    }

    #[test]
    fn test_value_date_parses_date_form() {
        let (events, _) = parse("BEGIN:VEVENT\nDTSTART;VALUE=DATE:20250812\nDTEND;VALUE=DATE:20250813\nEND:VEVENT");
        assert_eq!(events[0].duration(), Duration::days(1));
    }

    #[test]
    fn test_bad_datetime_aborts() {
        let err = parse_events(
            "BEGIN:VEVENT\nDTSTART:2025-08-12\nEND:VEVENT",
            &ParseOptions::default(),
        )
        .unwrap_err();
        assert!(matches!(err, LensError::InvalidDatetime(_)));
    }

    #[test]
    fn test_bad_duration_aborts() {
        let err = parse_events(
            "BEGIN:VEVENT\nDTSTART:20250812T100000Z\nDURATION:1 hour\nEND:VEVENT",
            &ParseOptions::default(),
        )
        .unwrap_err();
        assert!(matches!(err, LensError::InvalidDuration(_)));
    }

    #[test]
    fn test_strict_rejects_unknown_property() {
        let err = parse_events(
            "BEGIN:VEVENT\nDTSTART:20250812T100000Z\nX-FOO:bar\nEND:VEVENT",
            &ParseOptions::strict(),
        )
        .unwrap_err();
        match err {
            LensError::UnknownProperty { line, name } => {
                assert_eq!(line, 3);
                assert_eq!(name, "X-FOO");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_strict_rejects_incomplete_event() {
        let err =
            parse_events("BEGIN:VEVENT\nUID:1\nEND:VEVENT", &ParseOptions::strict()).unwrap_err();
        assert!(matches!(err, LensError::IncompleteEvent { line: 3, .. }));
    }

    #[test]
    fn test_strict_accepts_alarm_contents() {
        let (events, _) = parse_events(
            "BEGIN:VEVENT\nDTSTART:20250812T100000Z\nBEGIN:VALARM\nTRIGGER:-PT5M\nEND:VALARM\nEND:VEVENT",
            &ParseOptions::strict(),
        )
        .unwrap();
        assert_eq!(events.len(), 1);
    }
}
