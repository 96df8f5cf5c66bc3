//! The session's output destination and its sticky failure state.
//!
//! `Output` is the only place that touches the OS write primitive. Every
//! logical access arrives as one string and leaves as one `write` call, so
//! records of different chips never interleave inside an access. Once a
//! write, sync or open fails the first error is kept and every later emit is
//! dropped.
use std::fs::File;
use std::io::{self, Write};

use log::{debug, trace};

use crate::error::SessionError;

/// Where dump text goes.
pub(crate) enum Target {
    /// A file, either created by the session or adopted from a descriptor.
    File(File),
    /// Any other writer (pipe, socket wrapper, in-memory buffer, ...).
    Stream(Box<dyn Write + Send>),
}

impl Write for Target {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            Target::File(f) => f.write(buf),
            Target::Stream(w) => w.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Target::File(f) => f.flush(),
            Target::Stream(w) => w.flush(),
        }
    }
}

pub(crate) struct Output {
    label: String,
    name: String,
    target: Option<Target>,
    error: Option<SessionError>,
    records: usize,
}

impl Output {
    pub(crate) fn new(label: &str, name: &str, target: Target) -> Self {
        Self {
            label: label.to_string(),
            name: name.to_string(),
            target: Some(target),
            error: None,
            records: 0,
        }
    }

    /// An output that never opened.
    pub(crate) fn failed(label: &str, name: &str, error: SessionError) -> Self {
        Self {
            label: label.to_string(),
            name: name.to_string(),
            target: None,
            error: Some(error),
            records: 0,
        }
    }

    pub(crate) fn label(&self) -> &str {
        &self.label
    }

    pub(crate) fn name(&self) -> &str {
        &self.name
    }

    /// True while the output is open and nothing has failed yet.
    pub(crate) fn is_ok(&self) -> bool {
        self.target.is_some() && self.error.is_none()
    }

    pub(crate) fn error(&self) -> Option<&SessionError> {
        self.error.as_ref()
    }

    /// Remove the recorded failure. Callers discard the output afterwards.
    pub(crate) fn take_error(&mut self) -> Option<SessionError> {
        self.error.take()
    }

    /// Number of successful emits so far.
    pub(crate) fn records(&self) -> usize {
        self.records
    }

    /// Record a failure. The first failure wins.
    pub(crate) fn fail(&mut self, error: SessionError) {
        if self.error.is_none() {
            debug!("{}", error);
            self.error = Some(error);
        }
    }

    /// Write `text` with a single write call.
    pub(crate) fn emit(&mut self, text: &str) {
        if self.error.is_some() {
            return;
        }
        let Some(target) = self.target.as_mut() else {
            return;
        };

        let bytes = text.as_bytes();
        let result = target.write(bytes);
        match result {
            Ok(written) if written == bytes.len() => {
                self.records += 1;
                trace!("{}", text.trim_end());
            }
            Ok(written) => {
                let error = SessionError::Truncated {
                    label: self.label.clone(),
                    name: self.name.clone(),
                    written,
                    requested: bytes.len(),
                };
                self.fail(error);
            }
            Err(source) => {
                let error = SessionError::Write {
                    label: self.label.clone(),
                    name: self.name.clone(),
                    source,
                };
                self.fail(error);
            }
        }
    }

    /// Flush buffered data and ask the OS to make it durable.
    ///
    /// Destinations without sync support (pipes, sockets, terminals) report
    /// `InvalidInput` or `Unsupported`; both count as success.
    pub(crate) fn sync(&mut self) {
        if self.error.is_some() {
            return;
        }
        let Some(target) = self.target.as_mut() else {
            return;
        };

        let result = match target {
            Target::File(f) => f.flush().and_then(|_| f.sync_all()),
            Target::Stream(w) => w.flush(),
        };
        match result {
            Ok(()) => {}
            Err(e)
                if matches!(
                    e.kind(),
                    io::ErrorKind::InvalidInput | io::ErrorKind::Unsupported
                ) => {}
            Err(source) => {
                let error = SessionError::Sync {
                    label: self.label.clone(),
                    name: self.name.clone(),
                    source,
                };
                self.fail(error);
            }
        }
    }
}

impl Drop for Output {
    fn drop(&mut self) {
        if let Some(mut target) = self.target.take() {
            // best effort; the session is going away either way
            let _ = target.flush();
            debug!("{}: closed {}", self.label, self.name);
        }
    }
}
