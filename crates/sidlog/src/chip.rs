//! Chip adapters, register map and timing.
//!
//! - `adapter` holds the per-chip recording state (`DumpChip`), the
//!   `SidEmu` capability trait and the `ChipPort` handle the host drives.
//! - `clock` connects a chip to the host scheduler's time.
//! - `model` holds model identifiers and sampling configuration.
//! - `registers` names the SID registers and classifies them.
mod adapter;
pub mod clock;
pub mod model;
pub mod registers;

pub use adapter::{ChipPort, ChipStatus, DumpChip, SidEmu};
pub use clock::{AccessClock, ClockSource, SharedClock};
pub use model::{ChipConfig, SamplingMethod, SamplingParams, SidModel};
