//! Dump record types and their text encoding.
//!
//! Every register access ends up as one line of text. Two line shapes exist:
//!
//! - the *init* line, written when a chip is reset and reused as a *jump*
//!   bridge when the cycle delta since the previous access does not fit the
//!   16-bit relative clock field:
//!   `CCCCCCCC AA VV mmmm F.FFFF`
//! - the *relative* line, written for each logged access:
//!   `CCCC AA VV` (write) or `CCCC AA>VV` (observed read)
//!
//! The types below carry their field widths in their integer types, so a
//! record that would break the grammar cannot be constructed.
use std::fmt;

/// Largest cycle delta a relative record can carry on its own.
pub const RELATIVE_CLOCK_MAX: u64 = 0xFFFF;

/// Access direction of a relative record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Register write applied by the host.
    Write,
    /// Register read the host observed.
    Read,
}

impl Direction {
    /// Separator placed between the address and the value.
    pub fn symbol(self) -> char {
        match self {
            Direction::Write => ' ',
            Direction::Read => '>',
        }
    }

    pub fn from_symbol(c: char) -> Option<Self> {
        match c {
            ' ' => Some(Direction::Write),
            '>' => Some(Direction::Read),
            _ => None,
        }
    }
}

/// Chip reset or clock jump line.
///
/// A reset carries the chip base address, the volume/filter byte passed to
/// reset, the model code (`0x6581`, `0x8580`, or `0` when no model was set)
/// and the chip clock frequency. A jump carries only `clock_jump`, the high
/// part of an overflowed cycle delta, with every other field zero.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InitRecord {
    pub clock_jump: u32,
    pub address: u8,
    pub volume: u8,
    pub model: u16,
    pub frequency: f32,
}

impl InitRecord {
    /// Record written by a chip reset.
    pub fn reset(address: u8, volume: u8, model: u16, frequency: f32) -> Self {
        Self {
            clock_jump: 0,
            address,
            volume,
            model,
            frequency,
        }
    }

    /// Bridge record carrying `clock_jump << 16` cycles.
    pub fn jump(clock_jump: u32) -> Self {
        Self {
            clock_jump,
            address: 0,
            volume: 0,
            model: 0,
            frequency: 0.0,
        }
    }

    /// True for a bridge record, false for a chip reset.
    pub fn is_jump(&self) -> bool {
        self.clock_jump != 0
    }
}

impl fmt::Display for InitRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{:08X} {:02X} {:02X} {:04x} {:.4}",
            self.clock_jump, self.address, self.volume, self.model, self.frequency
        )
    }
}

/// One logged register access.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RelativeRecord {
    /// Cycles since the previous logged access of the same chip (low 16 bits).
    pub clock: u16,
    /// Multiplexed address, see [`multiplex_address`].
    pub address: u8,
    pub direction: Direction,
    pub value: u8,
}

impl fmt::Display for RelativeRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{:04X} {:02X}{}{:02X}",
            self.clock,
            self.address,
            self.direction.symbol(),
            self.value
        )
    }
}

/// A cycle delta split into the part that needs jump records and the part
/// that fits a relative record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClockSplit {
    /// `delta >> 16`
    pub jump: u64,
    /// `delta & 0xFFFF`
    pub relative: u16,
}

impl ClockSplit {
    /// Rebuild the original delta.
    pub fn delta(&self) -> u64 {
        (self.jump << 16) | self.relative as u64
    }
}

/// Split a cycle delta so that `(jump << 16) | relative == delta`.
pub fn split_delta(delta: u64) -> ClockSplit {
    ClockSplit {
        jump: delta >> 16,
        relative: (delta & RELATIVE_CLOCK_MAX) as u16,
    }
}

/// Build the multiplexed address of a chip register.
///
/// The low five bits select the register, the upper three the chip.
pub fn multiplex_address(chip: u8, register: u8) -> u8 {
    ((chip & 0x07) << 5) | (register & 0x1F)
}

/// Inverse of [`multiplex_address`]: `(chip, register)`.
pub fn demultiplex_address(address: u8) -> (u8, u8) {
    (address >> 5, address & 0x1F)
}

/// Encode one logical access into the text written to the dump.
///
/// The returned string holds the jump record(s) required by `delta`, if any,
/// immediately followed by the relative record, so a caller can emit the
/// whole access with a single write.
///
/// The jump field of an init line is 32 bits wide. A jump larger than that
/// is spread over several saturated jump lines whose sum equals the jump.
pub fn encode_access(delta: u64, address: u8, direction: Direction, value: u8) -> String {
    let split = split_delta(delta);
    let mut out = String::with_capacity(32);

    let mut jump = split.jump;
    while jump != 0 {
        let part = jump.min(u32::MAX as u64);
        out.push_str(&InitRecord::jump(part as u32).to_string());
        jump -= part;
    }

    let record = RelativeRecord {
        clock: split.relative,
        address,
        direction,
        value,
    };
    out.push_str(&record.to_string());
    out
}
