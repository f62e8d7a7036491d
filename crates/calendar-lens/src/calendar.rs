//! The calendar model: validated events and zone conversion.
//!
//! A [`Calendar`] is created once per load and then treated as a value.
//! [`Calendar::convert_zone`] returns a re-rendered copy; the in-place
//! [`Calendar::normalize_zone`] takes `&mut self`, so it can never run while
//! another caller holds a reference to the same calendar.

use chrono::{DateTime, Duration};
use chrono_tz::Tz;
use serde::Serialize;
use tracing::debug;

use crate::error::Result;
use crate::interval::Interval;
use crate::parser::{parse_events, DroppedEvent, ParseOptions};
use crate::zone::serialize_rfc3339;

/// One calendar event. `start < end` always holds.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Event {
    uid: Option<String>,
    summary: Option<String>,
    #[serde(serialize_with = "serialize_rfc3339")]
    start: DateTime<Tz>,
    #[serde(serialize_with = "serialize_rfc3339")]
    end: DateTime<Tz>,
    category: Option<String>,
}

impl Event {
    /// # Errors
    ///
    /// Returns [`LensError::InvalidInterval`](crate::LensError::InvalidInterval)
    /// unless `start < end`.
    pub fn new(start: DateTime<Tz>, end: DateTime<Tz>) -> Result<Self> {
        let interval = Interval::new(start, end)?;
        Ok(Self {
            uid: None,
            summary: None,
            start: interval.start(),
            end: interval.end(),
            category: None,
        })
    }

    pub fn with_uid(mut self, uid: impl Into<String>) -> Self {
        self.uid = Some(uid.into());
        self
    }

    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = Some(summary.into());
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub(crate) fn set_details(
        &mut self,
        uid: Option<String>,
        summary: Option<String>,
        category: Option<String>,
    ) {
        self.uid = uid;
        self.summary = summary;
        self.category = category;
    }

    pub fn uid(&self) -> Option<&str> {
        self.uid.as_deref()
    }

    pub fn summary(&self) -> Option<&str> {
        self.summary.as_deref()
    }

    pub fn category(&self) -> Option<&str> {
        self.category.as_deref()
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

    pub fn interval(&self) -> Interval {
        Interval::between(self.start, self.end)
    }

    /// The same event with start and end rendered in `tz`.
    pub fn in_zone(&self, tz: &Tz) -> Event {
        Event {
            start: self.start.with_timezone(tz),
            end: self.end.with_timezone(tz),
            ..self.clone()
        }
    }
}

/// An ordered sequence of events, in file order unless an operation says
/// otherwise.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Calendar {
    events: Vec<Event>,
}

/// The outcome of [`load_with_options`].
#[derive(Debug, Clone)]
pub struct LoadReport {
    pub calendar: Calendar,
    /// Event bodies skipped under the default
    /// [`IncompleteEventPolicy`](crate::parser::IncompleteEventPolicy).
    pub dropped: Vec<DroppedEvent>,
}

impl Calendar {
    pub fn from_events(events: Vec<Event>) -> Self {
        Self { events }
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Event> {
        self.events.iter()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn into_events(self) -> Vec<Event> {
        self.events
    }

    /// Events ordered by start, ties kept in file order.
    pub fn sorted_by_start(&self) -> Vec<&Event> {
        let mut sorted: Vec<&Event> = self.events.iter().collect();
        sorted.sort_by_key(|e| e.start);
        sorted
    }

    /// A copy with every event rendered in `tz`. Instants are unchanged.
    pub fn convert_zone(&self, tz: &Tz) -> Calendar {
        self.events.iter().map(|e| e.in_zone(tz)).collect()
    }

    /// Re-render every event in `tz` in place.
    pub fn normalize_zone(&mut self, tz: &Tz) {
        for event in &mut self.events {
            event.start = event.start.with_timezone(tz);
            event.end = event.end.with_timezone(tz);
        }
    }
}

impl FromIterator<Event> for Calendar {
    fn from_iter<I: IntoIterator<Item = Event>>(iter: I) -> Self {
        Self {
            events: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a Calendar {
    type Item = &'a Event;
    type IntoIter = std::slice::Iter<'a, Event>;

    fn into_iter(self) -> Self::IntoIter {
        self.events.iter()
    }
}

/// Parse `text` into a [`Calendar`] with the default lenient options.
///
/// # Errors
///
/// Fails on any datetime, duration or timezone value that cannot be decoded.
/// Event bodies without a usable start/end are dropped, not reported.
pub fn load(text: &str) -> Result<Calendar> {
    load_with_options(text, &ParseOptions::default()).map(|report| report.calendar)
}

/// Parse `text` into a [`Calendar`], also returning dropped event bodies.
///
/// # Errors
///
/// As [`load`], plus the strict-mode rejections configured in `options`.
pub fn load_with_options(text: &str, options: &ParseOptions) -> Result<LoadReport> {
    let (events, dropped) = parse_events(text, options)?;
    debug!(events = events.len(), dropped = dropped.len(), "calendar loaded");
    Ok(LoadReport {
        calendar: Calendar::from_events(events),
        dropped,
    })
}

/// Free-function form of [`Calendar::convert_zone`].
pub fn convert_zone(calendar: &Calendar, tz: &Tz) -> Calendar {
    calendar.convert_zone(tz)
}
