//! Parsed dump logs and timeline reconstruction.
//!
//! A `TraceDocument` is the ordered list of lines of a dump. Besides
//! re-serializing the log, it can rebuild the absolute clock of each logged
//! access:
//!
//! - a reset line (`clock_jump == 0`) zeroes the clock of the chip it names;
//! - a jump line (`clock_jump != 0`) carries `clock_jump << 16` cycles that
//!   belong to the relative line which follows it;
//! - a relative line advances the clock of the chip its address names.
//!
//! Clocks saturate at `u64::MAX`.
//!
//! Jump lines do not carry a chip address. A recorder emits the jump and its
//! relative line as one write, so the pending jump always applies to the
//! next relative line.
use std::collections::BTreeMap;
use std::convert::TryFrom;
use std::fmt;

use crate::meta::TuneInfo;
use crate::trace::parser::{ParseError, TraceLine, parse_line};
use crate::trace::record::{Direction, demultiplex_address};

/// A complete dump log.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TraceDocument {
    pub lines: Vec<TraceLine>,
}

/// A logged register access placed on the chip's absolute timeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimedAccess {
    /// Chip index (0..8)
    pub chip: u8,
    /// Register within the chip (0..32)
    pub register: u8,
    pub direction: Direction,
    pub value: u8,
    /// Cycles since the chip's last reset.
    pub clock: u64,
}

/// Per-chip counters gathered by [`TraceDocument::summary`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChipSummary {
    pub writes: usize,
    pub reads: usize,
    pub resets: usize,
    /// Clock of the last access.
    pub last_clock: u64,
    /// Model code of the last reset (`0x6581`, `0x8580`, or 0).
    pub model: u16,
    /// Clock frequency of the last reset in Hz.
    pub frequency: f32,
}

/// Whole-document counters.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TraceSummary {
    pub chips: BTreeMap<u8, ChipSummary>,
    pub jumps: usize,
}

impl TraceDocument {
    pub fn iter(&self) -> impl Iterator<Item = &TraceLine> {
        self.lines.iter()
    }

    /// Collect the header lines into a [`TuneInfo`], if any header exists.
    pub fn info(&self) -> Option<TuneInfo> {
        let mut info: Option<TuneInfo> = None;
        for line in &self.lines {
            match line {
                TraceLine::File { path, track } => {
                    let entry = info.get_or_insert_with(TuneInfo::default);
                    entry.file = path.clone();
                    entry.track = track.unwrap_or(0);
                }
                TraceLine::Title(title) => {
                    info.get_or_insert_with(TuneInfo::default).title = title.clone();
                }
                TraceLine::Author(author) => {
                    info.get_or_insert_with(TuneInfo::default).author = author.clone();
                }
                _ => {}
            }
        }
        info
    }

    /// Iterate over all logged accesses with their absolute clocks.
    pub fn accesses(&self) -> Accesses<'_> {
        Accesses {
            lines: self.lines.iter(),
            clocks: [0; 8],
            pending_jump: 0,
        }
    }

    pub fn summary(&self) -> TraceSummary {
        let mut summary = TraceSummary::default();

        for line in &self.lines {
            if let TraceLine::Init(record) = line {
                if record.is_jump() {
                    summary.jumps += 1;
                } else {
                    let (chip, _) = demultiplex_address(record.address);
                    let entry = summary.chips.entry(chip).or_default();
                    entry.resets += 1;
                    entry.model = record.model;
                    entry.frequency = record.frequency;
                }
            }
        }

        for access in self.accesses() {
            let entry = summary.chips.entry(access.chip).or_default();
            match access.direction {
                Direction::Write => entry.writes += 1,
                Direction::Read => entry.reads += 1,
            }
            entry.last_clock = access.clock;
        }

        summary
    }
}

/// Iterator returned by [`TraceDocument::accesses`].
pub struct Accesses<'a> {
    lines: std::slice::Iter<'a, TraceLine>,
    clocks: [u64; 8],
    pending_jump: u64,
}

impl Iterator for Accesses<'_> {
    type Item = TimedAccess;

    fn next(&mut self) -> Option<Self::Item> {
        for line in self.lines.by_ref() {
            match line {
                TraceLine::Init(record) if record.is_jump() => {
                    self.pending_jump = self
                        .pending_jump
                        .saturating_add((record.clock_jump as u64) << 16);
                }
                TraceLine::Init(record) => {
                    let (chip, _) = demultiplex_address(record.address);
                    self.clocks[chip as usize] = 0;
                    self.pending_jump = 0;
                }
                TraceLine::Relative(record) => {
                    let (chip, register) = demultiplex_address(record.address);
                    let delta = std::mem::take(&mut self.pending_jump)
                        .saturating_add(record.clock as u64);
                    let clock = &mut self.clocks[chip as usize];
                    *clock = clock.saturating_add(delta);
                    return Some(TimedAccess {
                        chip,
                        register,
                        direction: record.direction,
                        value: record.value,
                        clock: *clock,
                    });
                }
                _ => {}
            }
        }
        None
    }
}

impl fmt::Display for TraceDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for line in &self.lines {
            write!(f, "{line}")?;
        }
        Ok(())
    }
}

impl TryFrom<&str> for TraceDocument {
    type Error = ParseError;

    /// Parse a dump log. Empty lines are skipped.
    fn try_from(text: &str) -> Result<Self, Self::Error> {
        let mut lines = Vec::new();
        for (idx, line) in text.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let parsed = parse_line(line).map_err(|kind| ParseError {
                line: idx + 1,
                kind,
            })?;
            lines.push(parsed);
        }
        Ok(TraceDocument { lines })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LOG: &str = "\
!SID-FILE: <tune.sid> <1>
!SID-TITLE: <Tune>
!SID-AUTHOR: <Someone>
00000000 00 0F 6581 985248.0000
00000000 20 0F 8580 985248.0000
000A 04 20
0005 24 41
00000002 00 00 0000 0.0000
0003 18 0F
0001 3B>80
";

    #[test]
    fn test_parse_and_serialize() {
        let doc = TraceDocument::try_from(LOG).unwrap();
        assert_eq!(doc.lines.len(), 10);
        assert_eq!(doc.to_string(), LOG);
    }

    #[test]
    fn test_info() {
        let doc = TraceDocument::try_from(LOG).unwrap();
        let info = doc.info().unwrap();
        assert_eq!(info.file, "tune.sid");
        assert_eq!(info.title, "Tune");
        assert_eq!(info.author, "Someone");
        assert_eq!(info.track, 1);
    }

    #[test]
    fn test_accesses_rebuild_clock() {
        let doc = TraceDocument::try_from(LOG).unwrap();
        let accesses: Vec<TimedAccess> = doc.accesses().collect();
        assert_eq!(accesses.len(), 4);

        assert_eq!((accesses[0].chip, accesses[0].register), (0, 0x04));
        assert_eq!(accesses[0].clock, 10);

        assert_eq!((accesses[1].chip, accesses[1].register), (1, 0x04));
        assert_eq!(accesses[1].clock, 5);

        assert_eq!((accesses[2].chip, accesses[2].register), (0, 0x18));
        assert_eq!(accesses[2].clock, 10 + (2 << 16) + 3);

        assert_eq!(accesses[3].direction, Direction::Read);
        assert_eq!((accesses[3].chip, accesses[3].register), (1, 0x1B));
        assert_eq!(accesses[3].clock, 6);
    }

    #[test]
    fn test_summary() {
        let doc = TraceDocument::try_from(LOG).unwrap();
        let summary = doc.summary();
        assert_eq!(summary.jumps, 1);
        assert_eq!(summary.chips.len(), 2);

        let chip0 = &summary.chips[&0];
        assert_eq!(chip0.writes, 2);
        assert_eq!(chip0.resets, 1);
        assert_eq!(chip0.model, 0x6581);

        let chip1 = &summary.chips[&1];
        assert_eq!(chip1.writes, 1);
        assert_eq!(chip1.reads, 1);
        assert_eq!(chip1.model, 0x8580);
        assert_eq!(chip1.last_clock, 6);
    }

    #[test]
    fn test_accesses_saturate_huge_jumps() {
        let mut log = "FFFFFFFF 00 00 0000 0.0000\n".repeat(65537);
        log.push_str("0001 04 01\n0002 04 02\n");
        let doc = TraceDocument::try_from(log.as_str()).unwrap();

        let clocks: Vec<u64> = doc.accesses().map(|a| a.clock).collect();
        assert_eq!(clocks, vec![u64::MAX, u64::MAX]);

        let summary = doc.summary();
        assert_eq!(summary.jumps, 65537);
        assert_eq!(summary.chips[&0].last_clock, u64::MAX);
    }

    #[test]
    fn test_parse_error_reports_line() {
        let err = TraceDocument::try_from("000A 04 20\nbogus\n").unwrap_err();
        assert_eq!(err.line, 2);
    }
}
