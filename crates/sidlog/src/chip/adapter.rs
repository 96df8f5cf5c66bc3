//! The dump chip adapter.
//!
//! `DumpChip` holds the per-chip state: register file, access clock, mute
//! mask, filter policy and model. It never writes anything itself. The host
//! drives it through a [`ChipPort`], which pairs the chip with the session
//! output and implements [`SidEmu`].
//!
//! Write policy, applied after the value has been stored:
//!
//! | registers   | logged when                                   |
//! |-------------|-----------------------------------------------|
//! | 0x00-0x06   | voice 1 not muted                             |
//! | 0x07-0x0D   | voice 2 not muted                             |
//! | 0x0E-0x14   | voice 3 not muted                             |
//! | 0x15-0x17   | filter enabled                                |
//! | 0x18        | always; routing bits cleared if filter is off |
//! | 0x19-0x1F   | never                                         |
use std::fmt;
use std::sync::Arc;

use log::{debug, warn};

use crate::chip::clock::{AccessClock, ClockSource};
use crate::chip::model::{SamplingParams, SidModel};
use crate::chip::registers::{
    self, MODE_NO_FILTER_MASK, REGISTER_COUNT, REGISTER_MASK, RegisterClass, VOICE_COUNT,
};
use crate::error::{ChipError, ClockRegression};
use crate::session::output::Output;
use crate::trace::record::{Direction, InitRecord, encode_access, multiplex_address};

/// Capability set a chip back-end offers to the host scheduler.
///
/// The dump recorder is one implementation ([`ChipPort`]); a sound-producing
/// emulation could be another.
pub trait SidEmu {
    /// Reset the chip. `volume` is the volume/filter byte the host resets to.
    fn reset(&mut self, volume: u8);

    /// Synchronise with the host clock.
    fn clock(&mut self);

    fn read(&mut self, address: u8) -> u8;

    fn write(&mut self, address: u8, value: u8);

    /// Mute (or unmute) one voice.
    fn voice(&mut self, num: u8, mute: bool);

    /// Select the chip model by host identifier.
    fn model(&mut self, model: u32, digiboost: bool) -> Result<(), ChipError>;

    fn sampling(&mut self, params: SamplingParams);

    fn filter(&mut self, enable: bool);
}

/// Adapter lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChipStatus {
    /// No model accepted yet. Accesses are logged with model code 0.
    Uninitialized,
    Ready,
    /// The last model request was rejected. Nothing is logged until a valid
    /// model is set.
    Failed,
}

/// Per-chip recording state.
pub struct DumpChip {
    index: u8,
    registers: [u8; REGISTER_COUNT],
    clock: AccessClock,
    clock_source: Option<Arc<dyn ClockSource>>,
    muted: u8,
    filter: bool,
    model: Option<SidModel>,
    digiboost: bool,
    sampling: SamplingParams,
    status: ChipStatus,
    error: Option<ChipError>,
}

impl fmt::Debug for DumpChip {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DumpChip")
            .field("index", &self.index)
            .field("clock", &self.clock)
            .field("attached", &self.clock_source.is_some())
            .field("muted", &self.muted)
            .field("filter", &self.filter)
            .field("model", &self.model)
            .field("status", &self.status)
            .finish()
    }
}

impl DumpChip {
    /// Create chip `index` (0..8). Filtering starts enabled.
    pub fn new(index: u8) -> Self {
        debug_assert!(index < 8, "chip index out of range: {index}");
        Self {
            index: index & 0x07,
            registers: [0; REGISTER_COUNT],
            clock: AccessClock::default(),
            clock_source: None,
            muted: 0,
            filter: true,
            model: None,
            digiboost: false,
            sampling: SamplingParams::default(),
            status: ChipStatus::Uninitialized,
            error: None,
        }
    }

    pub fn index(&self) -> u8 {
        self.index
    }

    pub fn status(&self) -> ChipStatus {
        self.status
    }

    pub fn error(&self) -> Option<&ChipError> {
        self.error.as_ref()
    }

    pub fn model(&self) -> Option<SidModel> {
        self.model
    }

    /// Model code written into init records.
    pub fn model_code(&self) -> u16 {
        self.model.map_or(0, SidModel::code)
    }

    pub fn digiboost(&self) -> bool {
        self.digiboost
    }

    pub fn mute_mask(&self) -> u8 {
        self.muted
    }

    pub fn filter_enabled(&self) -> bool {
        self.filter
    }

    pub fn sampling(&self) -> SamplingParams {
        self.sampling
    }

    pub fn access_clock(&self) -> AccessClock {
        self.clock
    }

    /// Stored register value, without any logging.
    pub fn register(&self, address: u8) -> u8 {
        self.registers[(address & REGISTER_MASK) as usize]
    }

    pub fn registers(&self) -> &[u8; REGISTER_COUNT] {
        &self.registers
    }

    pub fn is_attached(&self) -> bool {
        self.clock_source.is_some()
    }

    pub fn attach(&mut self, source: Arc<dyn ClockSource>) {
        self.clock_source = Some(source);
    }

    /// Multiplexed address of `register` on this chip.
    pub fn byte_address(&self, register: u8) -> u8 {
        multiplex_address(self.index, register)
    }

    pub fn set_filter(&mut self, enable: bool) {
        debug!("chip {}: filter {}", self.index, enable);
        self.filter = enable;
    }

    pub fn set_voice_mute(&mut self, num: u8, mute: bool) {
        if num >= VOICE_COUNT {
            warn!("chip {}: no voice {}", self.index, num);
            return;
        }
        if mute {
            self.muted |= 1 << num;
        } else {
            self.muted &= !(1 << num);
        }
        debug!("chip {}: voice {} mute={} -> {:03b}", self.index, num, mute, self.muted);
    }

    /// Accept or reject a host model identifier.
    ///
    /// On success the mute mask is cleared and the chip becomes `Ready`. On
    /// failure the previous model, digiboost flag and mute mask are kept.
    pub fn set_model(&mut self, id: u32, digiboost: bool) -> Result<(), ChipError> {
        match SidModel::try_from(id) {
            Ok(model) => {
                self.model = Some(model);
                self.digiboost = digiboost;
                self.muted = 0;
                self.status = ChipStatus::Ready;
                self.error = None;
                debug!("chip {}: model {:04x} digiboost={}", self.index, model.code(), digiboost);
                Ok(())
            }
            Err(e) => {
                debug!("chip {}: {}", self.index, e);
                self.status = ChipStatus::Failed;
                self.error = Some(e.clone());
                Err(e)
            }
        }
    }

    pub fn set_sampling(&mut self, params: SamplingParams) {
        debug!(
            "chip {}: sampling clock={:.2} rate={:.0} {:?} fast={}",
            self.index, params.clock_frequency, params.sample_rate, params.method, params.fast
        );
        self.sampling = params;
    }

    /// Move the access clock to the clock source's current time.
    ///
    /// Without a clock source time stands still.
    pub fn try_clock(&mut self) -> Result<u64, ClockRegression> {
        match &self.clock_source {
            Some(source) => {
                let now = source.now();
                self.clock.advance(now)
            }
            None => self.clock.advance(self.clock.last()),
        }
    }

    /// Like [`DumpChip::try_clock`], but a clock running backwards is fatal.
    pub fn clock(&mut self) -> u64 {
        match self.try_clock() {
            Ok(delta) => delta,
            Err(e) => panic!("chip {}: {}", self.index, e),
        }
    }

    /// Zero the access clock and build the reset record, if a clock source is
    /// attached.
    fn reset_record(&mut self, volume: u8) -> Option<InitRecord> {
        self.clock.reset();
        self.clock_source.as_ref()?;
        Some(InitRecord::reset(
            self.byte_address(0),
            volume,
            self.model_code(),
            self.sampling.clock_frequency,
        ))
    }

    /// Store a write and return the value to log, if the access is observable.
    fn store(&mut self, address: u8, value: u8) -> Option<u8> {
        let address = address & REGISTER_MASK;
        self.registers[address as usize] = value;

        match registers::classify(address) {
            RegisterClass::Voice(voice) if self.muted & (1 << voice) != 0 => None,
            RegisterClass::Voice(_) => Some(value),
            RegisterClass::Filter if !self.filter => None,
            RegisterClass::Filter => Some(value),
            RegisterClass::ModeVolume if !self.filter => Some(value & MODE_NO_FILTER_MASK),
            RegisterClass::ModeVolume => Some(value),
            RegisterClass::ReadOnly => None,
        }
    }

    /// Clock the chip and encode one access.
    fn access(&mut self, address: u8, direction: Direction, value: u8) -> String {
        let delta = self.clock();
        encode_access(delta, self.byte_address(address), direction, value)
    }
}

/// A chip borrowed together with its session output.
///
/// Obtained from [`crate::session::DumpSession::chip`]. This is the handle the
/// host scheduler calls into.
pub struct ChipPort<'a> {
    chip: &'a mut DumpChip,
    out: &'a mut Output,
}

impl<'a> ChipPort<'a> {
    pub(crate) fn new(chip: &'a mut DumpChip, out: &'a mut Output) -> Self {
        Self { chip, out }
    }

    /// State of the chip behind this port.
    pub fn chip(&self) -> &DumpChip {
        self.chip
    }

    /// Effective status: a failed session fails every chip.
    pub fn status(&self) -> ChipStatus {
        if self.out.is_ok() {
            self.chip.status
        } else {
            ChipStatus::Failed
        }
    }

    fn can_log(&self) -> bool {
        self.status() != ChipStatus::Failed
    }

    fn log_access(&mut self, address: u8, direction: Direction, value: u8) {
        if !self.can_log() {
            return;
        }
        let text = self.chip.access(address, direction, value);
        self.out.emit(&text);
    }
}

impl SidEmu for ChipPort<'_> {
    fn reset(&mut self, volume: u8) {
        debug!("chip {}: reset volume={:02X}", self.chip.index, volume);
        let record = self.chip.reset_record(volume);
        if let Some(record) = record
            && self.can_log()
        {
            self.out.emit(&record.to_string());
        }
    }

    fn clock(&mut self) {
        self.chip.clock();
    }

    fn read(&mut self, address: u8) -> u8 {
        let address = address & REGISTER_MASK;
        let value = self.chip.register(address);
        // The real OSC3/ENV3 output is not emulated; the last written byte
        // is logged as the observed value.
        if registers::is_observed_read(address) {
            self.log_access(address, Direction::Read, value);
        }
        value
    }

    fn write(&mut self, address: u8, value: u8) {
        if let Some(logged) = self.chip.store(address, value) {
            self.log_access(address & REGISTER_MASK, Direction::Write, logged);
        }
    }

    fn voice(&mut self, num: u8, mute: bool) {
        self.chip.set_voice_mute(num, mute);
    }

    fn model(&mut self, model: u32, digiboost: bool) -> Result<(), ChipError> {
        self.chip.set_model(model, digiboost)
    }

    fn sampling(&mut self, params: SamplingParams) {
        self.chip.set_sampling(params);
    }

    fn filter(&mut self, enable: bool) {
        self.chip.set_filter(enable);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chip::clock::SharedClock;

    #[test]
    fn test_store_applies_mute_policy() {
        let mut chip = DumpChip::new(0);
        chip.set_voice_mute(1, true);
        assert_eq!(chip.store(0x04, 0x41), Some(0x41));
        assert_eq!(chip.store(0x0B, 0x41), None);
        assert_eq!(chip.register(0x0B), 0x41);
        assert_eq!(chip.store(0x12, 0x11), Some(0x11));
    }

    #[test]
    fn test_store_applies_filter_policy() {
        let mut chip = DumpChip::new(0);
        chip.set_filter(false);
        assert_eq!(chip.store(0x15, 0x07), None);
        assert_eq!(chip.store(0x17, 0xF1), None);
        assert_eq!(chip.store(0x18, 0x7F), Some(0x0F));
        assert_eq!(chip.register(0x18), 0x7F);

        chip.set_filter(true);
        assert_eq!(chip.store(0x16, 0x80), Some(0x80));
        assert_eq!(chip.store(0x18, 0x7F), Some(0x7F));
    }

    #[test]
    fn test_store_ignores_read_only() {
        let mut chip = DumpChip::new(3);
        for r in 0x19..=0x1F {
            assert_eq!(chip.store(r, 0xAA), None);
            assert_eq!(chip.register(r), 0xAA);
        }
    }

    #[test]
    fn test_store_masks_address() {
        let mut chip = DumpChip::new(0);
        assert_eq!(chip.store(0xE4, 0x21), Some(0x21));
        assert_eq!(chip.register(0x04), 0x21);
    }

    #[test]
    fn test_voice_mute_bits() {
        let mut chip = DumpChip::new(0);
        chip.set_voice_mute(0, true);
        chip.set_voice_mute(2, true);
        assert_eq!(chip.mute_mask(), 0b101);
        chip.set_voice_mute(0, false);
        assert_eq!(chip.mute_mask(), 0b100);
        chip.set_voice_mute(5, true);
        assert_eq!(chip.mute_mask(), 0b100);
    }

    #[test]
    fn test_model_change_clears_mute() {
        let mut chip = DumpChip::new(0);
        chip.set_voice_mute(1, true);
        chip.set_model(1, true).unwrap();
        assert_eq!(chip.mute_mask(), 0);
        assert_eq!(chip.model(), Some(SidModel::Mos8580));
        assert!(chip.digiboost());
        assert_eq!(chip.status(), ChipStatus::Ready);
    }

    #[test]
    fn test_invalid_model_keeps_state() {
        let mut chip = DumpChip::new(0);
        chip.set_model(0, false).unwrap();
        chip.set_voice_mute(2, true);

        let err = chip.set_model(7, true).unwrap_err();
        assert_eq!(err, ChipError::InvalidModel(7));
        assert_eq!(chip.status(), ChipStatus::Failed);
        assert_eq!(chip.model(), Some(SidModel::Mos6581));
        assert!(!chip.digiboost());
        assert_eq!(chip.mute_mask(), 0b100);
        assert_eq!(chip.error(), Some(&ChipError::InvalidModel(7)));

        chip.set_model(1, false).unwrap();
        assert_eq!(chip.status(), ChipStatus::Ready);
        assert!(chip.error().is_none());
    }

    #[test]
    fn test_clock_without_source_stands_still() {
        let mut chip = DumpChip::new(0);
        assert_eq!(chip.clock(), 0);
        assert_eq!(chip.clock(), 0);
    }

    #[test]
    fn test_clock_follows_source() {
        let source = Arc::new(SharedClock::new(0));
        let mut chip = DumpChip::new(0);
        chip.attach(source.clone());
        source.set(100);
        assert_eq!(chip.clock(), 100);
        source.advance(0x1_0000);
        assert_eq!(chip.clock(), 0x1_0000);
        assert_eq!(chip.access_clock().last(), 0x1_0064);
    }

    #[test]
    #[should_panic(expected = "clock moved backwards")]
    fn test_clock_backwards_panics() {
        let source = Arc::new(SharedClock::new(50));
        let mut chip = DumpChip::new(0);
        chip.attach(source.clone());
        chip.clock();
        source.set(49);
        chip.clock();
    }

    #[test]
    fn test_try_clock_reports_regression() {
        let source = Arc::new(SharedClock::new(50));
        let mut chip = DumpChip::new(0);
        chip.attach(source.clone());
        chip.try_clock().unwrap();
        source.set(10);
        assert_eq!(
            chip.try_clock(),
            Err(ClockRegression { now: 10, last: 50 })
        );
    }

    #[test]
    fn test_reset_record_requires_source() {
        let mut chip = DumpChip::new(2);
        assert!(chip.reset_record(0x0F).is_none());

        chip.attach(Arc::new(SharedClock::new(7)));
        chip.set_model(1, false).unwrap();
        let record = chip.reset_record(0x0F).unwrap();
        assert_eq!(record.address, 0x40);
        assert_eq!(record.volume, 0x0F);
        assert_eq!(record.model, 0x8580);
        assert_eq!(record.clock_jump, 0);
    }
}
