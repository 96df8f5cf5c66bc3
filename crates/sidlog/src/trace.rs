//! Dump log encoding, parsing and replay.
//!
//! - `record` holds the line types written by a recording session and the
//!   cycle-delta splitting used to keep relative clocks within 16 bits.
//! - `parser` turns text lines back into typed lines.
//! - `document` holds a whole parsed log and rebuilds per-chip timelines.
mod document;
pub mod parser;
pub mod record;

pub use document::{Accesses, ChipSummary, TimedAccess, TraceDocument, TraceSummary};
pub use parser::{ParseError, ParseErrorKind, TraceLine, parse_line};
pub use record::{
    ClockSplit, Direction, InitRecord, RelativeRecord, demultiplex_address, encode_access,
    multiplex_address, split_delta,
};
