//! # calendar-lens
//!
//! Scheduling analytics over calendar exports.
//!
//! Parses folded, escaped, timezone-annotated event text into a typed
//! [`Calendar`], then answers scheduling questions over it: which events
//! overlap, how occupied a time range is, and whether a new event would
//! collide with existing ones.
//!
//! ## Modules
//!
//! - [`parser`] — unfolding, property splitting, value decoding, event assembly
//! - [`calendar`] — validated events, loading, zone conversion
//! - [`interval`] — half-open intervals and the shared overlap primitive
//! - [`overlap`](mod@overlap) — pairwise conflicts, tight gaps, what-if simulation
//! - [`aggregate`] — occupancy, utilization statistics, stress score
//! - [`table`] — result rows as plain records
//! - [`zone`] — timezone resolution and DST-aware duration arithmetic
//! - [`error`] — Error types
//!
//! ## Example
//!
//! ```
//! use calendar_lens::{conflicts, load};
//!
//! let text = "BEGIN:VEVENT\nUID:a\nDTSTART:20250812T100000Z\nDTEND:20250812T110000Z\nEND:VEVENT\n\
//!             BEGIN:VEVENT\nUID:b\nDTSTART:20250812T103000Z\nDTEND:20250812T111500Z\nEND:VEVENT\n";
//! let calendar = load(text).unwrap();
//! let found = conflicts(&calendar);
//! assert_eq!(found.len(), 1);
//! assert_eq!(found[0].overlap_minutes, 30);
//! ```

pub mod aggregate;
pub mod calendar;
pub mod error;
pub mod interval;
pub mod overlap;
pub mod parser;
pub mod table;
pub mod zone;

pub use aggregate::{
    occupancy, stress, stress_of, utilization, BucketKey, BucketSpec, BusyMinutes, Granularity,
    OccupancyKey, OccupancyRow, UtilizationRow,
};
pub use calendar::{convert_zone, load, load_with_options, Calendar, Event, LoadReport};
pub use error::{LensError, Result};
pub use interval::{overlap, Interval};
pub use overlap::{
    conflicts, find_overloads, simulate, simulate_interval, ConflictRecord, GapRecord,
    ImpactRecord, Simulation,
};
pub use parser::{
    DropReason, DroppedEvent, IncompleteEventPolicy, ParseOptions, UnknownPropertyPolicy,
};
pub use table::{to_records, Record};
pub use zone::{add_calendar_duration, localize, resolve_timezone, CalendarDuration};
