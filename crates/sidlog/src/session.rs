//! Recording sessions.
//!
//! A `DumpSession` owns the dump destination and up to eight chips. The host
//! configures it through [`SidBuilder`] and drives the chips through the
//! [`ChipPort`] handles returned by [`DumpSession::chip`].
//!
//! ```
//! use std::sync::{Arc, Mutex};
//! use sidlog::chip::{SharedClock, SidEmu};
//! use sidlog::session::{DumpSession, SidBuilder};
//!
//! # #[derive(Clone, Default)]
//! # struct Buffer(Arc<Mutex<Vec<u8>>>);
//! # impl std::io::Write for Buffer {
//! #     fn write(&mut self, b: &[u8]) -> std::io::Result<usize> {
//! #         self.0.lock().unwrap().extend_from_slice(b);
//! #         Ok(b.len())
//! #     }
//! #     fn flush(&mut self) -> std::io::Result<()> { Ok(()) }
//! # }
//! let buffer = Buffer::default();
//! let clock = Arc::new(SharedClock::new(0));
//!
//! let mut session = DumpSession::with_writer("dumpsid", buffer.clone(), None);
//! session.set_clock_source(clock.clone());
//! assert_eq!(session.create(1), 1);
//!
//! let mut sid = session.chip(0).unwrap();
//! sid.reset(0x0F);
//! clock.advance(10);
//! sid.write(0x04, 0x20);
//!
//! let text = String::from_utf8(buffer.0.lock().unwrap().clone()).unwrap();
//! assert_eq!(text, "00000000 00 0F 6581 985248.0000\n000A 04 20\n");
//! ```
pub(crate) mod output;

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use log::{debug, warn};

use crate::chip::{ChipConfig, ChipPort, ClockSource, DumpChip};
use crate::error::SessionError;
use crate::meta::TuneInfo;
use output::{Output, Target};

/// Chips per session. 32 registers for 8 chips fill a one byte address.
pub const MAX_CHIPS: usize = 8;

/// Attribution string returned by [`SidBuilder::credits`].
pub const CREDITS: &str = concat!(
    "sidlog ",
    env!("CARGO_PKG_VERSION"),
    "\nSID register dump recorder\n"
);

/// Host-facing configuration surface of a chip back-end.
pub trait SidBuilder {
    /// Maximum number of chips this back-end can provide.
    fn avail_devices(&self) -> usize;

    /// Create up to `count` chips; returns how many were created.
    fn create(&mut self, count: usize) -> usize;

    fn credits(&self) -> &'static str;

    /// Enable or disable the filter on every chip.
    fn filter(&mut self, enable: bool);

    /// Describe the tune being played.
    fn set_info(&mut self, info: TuneInfo);

    fn flush(&mut self);

    /// False once anything has failed.
    fn status(&self) -> bool;

    /// Description of the first failure, empty while healthy.
    fn error_message(&self) -> String;
}

/// A dump recording session.
pub struct DumpSession {
    out: Output,
    chips: Vec<DumpChip>,
    config: ChipConfig,
    clock_source: Option<Arc<dyn ClockSource>>,
    info: Option<TuneInfo>,
}

impl DumpSession {
    fn from_output(out: Output) -> Self {
        debug!("{}: session on {} ok={}", out.label(), out.name(), out.is_ok());
        Self {
            out,
            chips: Vec::new(),
            config: ChipConfig::default(),
            clock_source: None,
            info: None,
        }
    }

    /// Create (or truncate) `path` and record into it.
    ///
    /// An open failure does not panic or return early: the session starts in
    /// the failed state and [`DumpSession::error`] tells why.
    pub fn new(label: &str, path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        let name = path.display().to_string();
        let mut options = OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o666);
        }
        let out = match options.open(path) {
            Ok(file) => Output::new(label, &name, Target::File(file)),
            Err(source) => {
                let error = SessionError::Open {
                    label: label.to_string(),
                    name: name.clone(),
                    source,
                };
                Output::failed(label, &name, error)
            }
        };
        Self::from_output(out)
    }

    /// Like [`DumpSession::new`], but an open failure is returned.
    pub fn open(label: &str, path: impl AsRef<Path>) -> crate::Result<Self> {
        let mut session = Self::new(label, path);
        match session.out.take_error() {
            Some(error) => Err(error),
            None => Ok(session),
        }
    }

    /// Record into an already open writer.
    ///
    /// `name` is used in messages; it defaults to `>&<stream>`.
    pub fn with_writer<W>(label: &str, writer: W, name: Option<&str>) -> Self
    where
        W: Write + Send + 'static,
    {
        let name = name.unwrap_or(">&<stream>");
        Self::from_output(Output::new(label, name, Target::Stream(Box::new(writer))))
    }

    /// Record into an already open file descriptor. The session takes
    /// ownership and closes it when dropped.
    ///
    /// `name` is used in messages; it defaults to `>&<fd>`.
    #[cfg(unix)]
    pub fn from_fd(label: &str, fd: std::os::fd::OwnedFd, name: Option<&str>) -> Self {
        use std::os::fd::AsRawFd;

        let name = match name {
            Some(name) => name.to_string(),
            None => format!(">&{}", fd.as_raw_fd()),
        };
        Self::from_output(Output::new(label, &name, Target::File(File::from(fd))))
    }

    /// Record into an already open file.
    pub fn from_file(label: &str, file: File, name: &str) -> Self {
        Self::from_output(Output::new(label, name, Target::File(file)))
    }

    /// Defaults for chips created after this call.
    pub fn with_config(mut self, config: ChipConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &ChipConfig {
        &self.config
    }

    pub fn label(&self) -> &str {
        self.out.label()
    }

    /// Display name of the destination (path, `>&<fd>` or `>&<stream>`).
    pub fn name(&self) -> &str {
        self.out.name()
    }

    pub fn error(&self) -> Option<&SessionError> {
        self.out.error()
    }

    pub fn info(&self) -> Option<&TuneInfo> {
        self.info.as_ref()
    }

    pub fn chips(&self) -> &[DumpChip] {
        &self.chips
    }

    pub fn chip_count(&self) -> usize {
        self.chips.len()
    }

    /// Borrow chip `index` for the host scheduler.
    pub fn chip(&mut self, index: usize) -> Option<ChipPort<'_>> {
        let chip = self.chips.get_mut(index)?;
        Some(ChipPort::new(chip, &mut self.out))
    }

    /// Attach the host scheduler's clock to every chip, present and future.
    pub fn set_clock_source(&mut self, source: Arc<dyn ClockSource>) {
        for chip in &mut self.chips {
            chip.attach(source.clone());
        }
        self.clock_source = Some(source);
    }

    fn build_chip(&self, index: usize) -> Result<DumpChip, SessionError> {
        let mut chip = DumpChip::new(index as u8);
        chip.set_model(self.config.model, self.config.digiboost)
            .map_err(|source| SessionError::ChipInit {
                label: self.label().to_string(),
                source,
            })?;
        chip.set_filter(self.config.filter);
        chip.set_sampling(self.config.sampling);
        if let Some(source) = &self.clock_source {
            chip.attach(source.clone());
        }
        Ok(chip)
    }
}

impl SidBuilder for DumpSession {
    fn avail_devices(&self) -> usize {
        MAX_CHIPS
    }

    /// Create up to `count` more chips, limited by the free slots.
    ///
    /// Returns 0 without touching the session status for `count == 0` or a
    /// failed session. Slots for all requested chips are reserved first; if
    /// that allocation fails no chip is built. Construction stops at the first
    /// chip that cannot be configured; chips built before it are kept. The
    /// session fails only when no chip at all could be built.
    fn create(&mut self, count: usize) -> usize {
        if count == 0 || !self.out.is_ok() {
            return 0;
        }

        let free = MAX_CHIPS - self.chips.len();
        let count = count.min(free);
        if count == 0 {
            warn!("{}: all {} chips already created", self.label(), MAX_CHIPS);
            return 0;
        }

        let mut created = 0;
        let mut failure = None;
        if self.chips.try_reserve_exact(count).is_err() {
            failure = Some(SessionError::OutOfMemory {
                label: self.label().to_string(),
            });
        }
        while failure.is_none() && created < count {
            match self.build_chip(self.chips.len()) {
                Ok(chip) => {
                    self.chips.push(chip);
                    created += 1;
                }
                Err(error) => {
                    failure = Some(error);
                    break;
                }
            }
        }

        debug!("{}: create({}) -> {}", self.label(), count, created);
        if let Some(error) = failure {
            if created == 0 {
                self.out.fail(error);
            } else {
                warn!("{}", error);
            }
        }
        created
    }

    fn credits(&self) -> &'static str {
        CREDITS
    }

    fn filter(&mut self, enable: bool) {
        debug!("{}: filter({})", self.label(), enable);
        self.config.filter = enable;
        for chip in &mut self.chips {
            chip.set_filter(enable);
        }
    }

    /// Store the tune description and write the header.
    ///
    /// Only the first call counts. The header is written only while the
    /// session is healthy and before any register record.
    fn set_info(&mut self, info: TuneInfo) {
        if self.info.is_some() {
            warn!("{}: tune info already set, ignoring {:?}", self.label(), info.file);
            return;
        }
        if self.out.is_ok() {
            if self.out.records() == 0 {
                self.out.emit(&info.to_header());
            } else {
                warn!("{}: records already written, header skipped", self.label());
            }
        }
        self.info = Some(info);
    }

    fn flush(&mut self) {
        self.out.sync();
    }

    fn status(&self) -> bool {
        self.out.is_ok()
    }

    fn error_message(&self) -> String {
        self.out
            .error()
            .map(|e| e.to_string())
            .unwrap_or_default()
    }
}
