//! sidlog: register-access dump recorder and parser for emulated SID chips
//!
//! `sidlog` stands in for a SID emulation inside a C64 tune player. Instead of
//! producing sound it records every observable register access of up to eight
//! chips into a plain-text trace, together with the number of clock cycles
//! between accesses.
//!
//! Key features:
//! - `DumpSession`: owns the trace destination (path, file descriptor or any
//!   writer), creates the chips and keeps the first failure it sees.
//! - `ChipPort`: the per-chip handle the host scheduler drives through the
//!   `SidEmu` trait (`reset`, `write`, `read`, `voice`, `model`, ...).
//! - Typed trace records (`InitRecord`, `RelativeRecord`) whose `Display`
//!   produces the exact text format, and a parser that reads it back into a
//!   `TraceDocument` with absolute-clock replay and per-chip summaries.
//!
//! Trace format
//!
//! ```text
//! !SID-FILE: <music/Commando.sid> <2>
//! !SID-TITLE: <Commando>
//! !SID-AUTHOR: <Rob Hubbard>
//! 00000000 00 0F 6581 985248.0000
//! 000A 04 20
//! 0001 18 0F
//! 0120 3B>00
//! ```
//!
//! Init records (`jump addr volume model frequency`) mark a chip reset when
//! the jump field is zero and carry the upper bits of a long delay otherwise.
//! Relative records (`clock addr dir value`) hold the low 16 bits of the delay
//! since the previous access of the same chip; `>` marks an observed read.
//! Addresses are `(chip << 5) | register`.
//!
//! Example: parsing a trace
//!
//! ```rust
//! use sidlog::trace::{Direction, TraceDocument};
//!
//! let text = "00000000 00 0F 6581 985248.0000\n000A 04 20\n";
//! let document = TraceDocument::try_from(text).expect("valid trace");
//!
//! let access = document.accesses().next().unwrap();
//! assert_eq!((access.chip, access.register), (0, 0x04));
//! assert_eq!(access.direction, Direction::Write);
//! assert_eq!(access.clock, 10);
//! assert_eq!(document.to_string(), text);
//! ```
pub mod chip;
pub mod error;
pub mod meta;
pub mod session;
pub mod trace;

pub use chip::{ChipConfig, ChipPort, ChipStatus, ClockSource, SharedClock, SidEmu, SidModel};
pub use error::{ChipError, ClockRegression, Result, SessionError};
pub use meta::TuneInfo;
pub use session::{DumpSession, MAX_CHIPS, SidBuilder};
pub use trace::{TraceDocument, TraceLine};
