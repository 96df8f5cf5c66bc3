//! Tune metadata written as the dump header.
//!
//! The recorder does not read tune files. The host hands over the descriptive
//! fields it already parsed and the session writes them once, ahead of any
//! register record:
//!
//! ```text
//! !SID-FILE: <music/Commando.sid> <2>
//! !SID-TITLE: <Commando>
//! !SID-AUTHOR: <Rob Hubbard>
//! ```
use crate::trace::TraceLine;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TuneInfo {
    /// Path of the tune file as given by the host.
    pub file: String,
    pub title: String,
    pub author: String,
    /// Track (sub-song) number. `0` means "not specified" and is not written.
    pub track: u32,
}

impl TuneInfo {
    pub fn new(
        file: impl Into<String>,
        title: impl Into<String>,
        author: impl Into<String>,
        track: u32,
    ) -> Self {
        Self {
            file: file.into(),
            title: title.into(),
            author: author.into(),
            track,
        }
    }

    /// The three header lines for this tune.
    pub fn header_lines(&self) -> [TraceLine; 3] {
        [
            TraceLine::File {
                path: self.file.clone(),
                track: (self.track > 0).then_some(self.track),
            },
            TraceLine::Title(self.title.clone()),
            TraceLine::Author(self.author.clone()),
        ]
    }

    /// Header text as written to the dump.
    pub fn to_header(&self) -> String {
        self.header_lines()
            .iter()
            .map(|line| line.to_string())
            .collect()
    }
}
