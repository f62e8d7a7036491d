//! Ingestion of folded, escaped calendar text.
//!
//! The pipeline is lazy end to end: [`unfold`] yields logical lines,
//! [`split_property`] splits each one, the [`decode`] functions turn values
//! into typed data, and the [`Assembler`] turns the property stream into
//! validated [`Event`](crate::calendar::Event)s.

pub mod assembler;
pub mod decode;
pub mod property;
pub mod unfold;

pub use assembler::{
    Assembler, DropReason, DroppedEvent, IncompleteEventPolicy, ParseOptions,
    UnknownPropertyPolicy,
};
pub use decode::{parse_date, parse_datetime, parse_duration, unescape_text};
pub use property::{split_property, Property};
pub use unfold::{unfold, LogicalLine, Unfolder};

use crate::calendar::Event;
use crate::error::Result;

/// Run the whole pipeline over `text`.
///
/// Returns the emitted events in file order and every event body that was
/// dropped instead of emitted.
pub fn parse_events(text: &str, options: &ParseOptions) -> Result<(Vec<Event>, Vec<DroppedEvent>)> {
    let mut assembler = Assembler::new(options);
    for line in unfold(text) {
        assembler.feed(&line)?;
    }
    assembler.finish()
}
