use std::io::{self, Write};
use std::sync::{Arc, Mutex};

use sidlog::chip::{SharedClock, SidEmu};
use sidlog::session::{DumpSession, SidBuilder};
use sidlog::trace::{Direction, TimedAccess, TraceDocument, TraceLine};
use sidlog::{ChipConfig, TuneInfo};

#[derive(Clone, Default)]
struct Buffer(Arc<Mutex<Vec<u8>>>);

impl Write for Buffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }
    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Record a short two-chip session and return the dump text.
fn record() -> String {
    let buffer = Buffer::default();
    let clock = Arc::new(SharedClock::new(0));
    let config = ChipConfig {
        model: 1,
        ..ChipConfig::default()
    };

    let mut session = DumpSession::with_writer("replay", buffer.clone(), None).with_config(config);
    session.set_clock_source(clock.clone());
    session.set_info(TuneInfo::new("tunes/Test.sid", "Test", "Tester", 3));
    assert_eq!(session.create(2), 2);

    session.chip(0).unwrap().reset(0x0F);
    session.chip(1).unwrap().reset(0x0F);

    clock.set(100);
    session.chip(0).unwrap().write(0x04, 0x41);
    clock.set(250);
    session.chip(1).unwrap().write(0x0B, 0x11);
    clock.set(0x3_0000);
    session.chip(0).unwrap().write(0x18, 0x1F);
    clock.set(0x3_0004);
    assert_eq!(session.chip(1).unwrap().read(0x1B), 0x00);

    session.flush();
    assert!(session.status());
    drop(session);

    let bytes = buffer.0.lock().unwrap().clone();
    String::from_utf8(bytes).unwrap()
}

#[test]
fn test_recorded_dump_parses_back() {
    let text = record();
    let document = TraceDocument::try_from(text.as_str()).unwrap();

    assert_eq!(document.to_string(), text);
    assert!(matches!(
        document.lines[0],
        TraceLine::File { track: Some(3), .. }
    ));

    let info = document.info().unwrap();
    assert_eq!(info, TuneInfo::new("tunes/Test.sid", "Test", "Tester", 3));
}

#[test]
fn test_replay_restores_absolute_clocks() {
    let text = record();
    let document = TraceDocument::try_from(text.as_str()).unwrap();
    let accesses: Vec<TimedAccess> = document.accesses().collect();

    let expected = [
        (0, 0x04, Direction::Write, 0x41, 100),
        (1, 0x0B, Direction::Write, 0x11, 250),
        (0, 0x18, Direction::Write, 0x1F, 0x3_0000),
        (1, 0x1B, Direction::Read, 0x00, 0x3_0004),
    ];
    assert_eq!(accesses.len(), expected.len());
    for (access, (chip, register, direction, value, clock)) in accesses.iter().zip(expected) {
        assert_eq!(access.chip, chip);
        assert_eq!(access.register, register);
        assert_eq!(access.direction, direction);
        assert_eq!(access.value, value);
        assert_eq!(access.clock, clock);
    }
}

#[test]
fn test_summary_of_recorded_dump() {
    let text = record();
    let summary = TraceDocument::try_from(text.as_str()).unwrap().summary();

    assert_eq!(summary.jumps, 2);
    assert_eq!(summary.chips.len(), 2);
    for chip in summary.chips.values() {
        assert_eq!(chip.resets, 1);
        assert_eq!(chip.model, 0x8580);
        assert_eq!(chip.frequency, 985_248.0);
    }
    assert_eq!(summary.chips[&0].writes, 2);
    assert_eq!(summary.chips[&1].writes, 1);
    assert_eq!(summary.chips[&1].reads, 1);
    assert_eq!(summary.chips[&1].last_clock, 0x3_0004);
}
