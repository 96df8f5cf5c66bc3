//! Line parser for dump logs.
//!
//! `parse_line` recognises the three header lines and the two record shapes
//! written by [`crate::session::DumpSession`]. The parser is strict about
//! field widths so that a parsed line serializes back to the same text.
use std::fmt;

use thiserror::Error;

use crate::trace::record::{Direction, InitRecord, RelativeRecord};

const FILE_TAG: &str = "!SID-FILE: ";
const TITLE_TAG: &str = "!SID-TITLE: ";
const AUTHOR_TAG: &str = "!SID-AUTHOR: ";

/// One line of a dump log.
#[derive(Debug, Clone, PartialEq)]
pub enum TraceLine {
    /// `!SID-FILE: <path>` with an optional ` <track>`
    File { path: String, track: Option<u32> },
    /// `!SID-TITLE: <title>`
    Title(String),
    /// `!SID-AUTHOR: <author>`
    Author(String),
    Init(InitRecord),
    Relative(RelativeRecord),
}

impl fmt::Display for TraceLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TraceLine::File { path, track } => {
                write!(f, "{FILE_TAG}<{path}>")?;
                if let Some(track) = track {
                    write!(f, " <{track}>")?;
                }
                writeln!(f)
            }
            TraceLine::Title(title) => writeln!(f, "{TITLE_TAG}<{title}>"),
            TraceLine::Author(author) => writeln!(f, "{AUTHOR_TAG}<{author}>"),
            TraceLine::Init(record) => write!(f, "{record}"),
            TraceLine::Relative(record) => write!(f, "{record}"),
        }
    }
}

/// What went wrong on a line.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseErrorKind {
    /// The line matches none of the known shapes.
    #[error("unrecognised line: {0:?}")]
    UnknownLine(String),
    /// A field has the wrong width or is not a valid number.
    #[error("invalid {field} field: {text:?}")]
    InvalidField { field: &'static str, text: String },
    /// The line ended before all fields were read.
    #[error("missing {0} field")]
    MissingField(&'static str),
    /// Extra text after the last field.
    #[error("trailing data: {0:?}")]
    TrailingData(String),
}

/// Parse error with the 1-based line number it occurred on.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("line {line}: {kind}")]
pub struct ParseError {
    pub line: usize,
    pub kind: ParseErrorKind,
}

/// Parse a single line. A trailing `\n` (or `\r\n`) is ignored.
pub fn parse_line(line: &str) -> Result<TraceLine, ParseErrorKind> {
    let line = line.strip_suffix('\n').unwrap_or(line);
    let line = line.strip_suffix('\r').unwrap_or(line);

    if let Some(rest) = line.strip_prefix(FILE_TAG) {
        return parse_file_header(rest);
    }
    if let Some(rest) = line.strip_prefix(TITLE_TAG) {
        return bracketed(rest, "title").map(TraceLine::Title);
    }
    if let Some(rest) = line.strip_prefix(AUTHOR_TAG) {
        return bracketed(rest, "author").map(TraceLine::Author);
    }

    // Relative records have a fixed 10 character layout: "CCCC AA?VV".
    if line.len() == 10 && line.is_ascii() {
        return parse_relative(line).map(TraceLine::Relative);
    }
    if line.split(' ').count() == 5 {
        return parse_init(line).map(TraceLine::Init);
    }

    Err(ParseErrorKind::UnknownLine(line.to_string()))
}

fn bracketed(text: &str, field: &'static str) -> Result<String, ParseErrorKind> {
    text.strip_prefix('<')
        .and_then(|t| t.strip_suffix('>'))
        .map(str::to_string)
        .ok_or_else(|| ParseErrorKind::InvalidField {
            field,
            text: text.to_string(),
        })
}

fn parse_file_header(rest: &str) -> Result<TraceLine, ParseErrorKind> {
    // "<path> <track>": the path itself may contain "> <", so only accept a
    // numeric final group as the track.
    if let Some((path, track)) = rest.rsplit_once("> <")
        && let Some(track) = track.strip_suffix('>')
        && let Ok(track) = track.parse::<u32>()
        && let Some(path) = path.strip_prefix('<')
    {
        return Ok(TraceLine::File {
            path: path.to_string(),
            track: Some(track),
        });
    }
    let path = bracketed(rest, "file")?;
    Ok(TraceLine::File { path, track: None })
}

fn hex_field<T>(text: &str, width: usize, field: &'static str) -> Result<T, ParseErrorKind>
where
    T: TryFrom<u32>,
{
    let invalid = || ParseErrorKind::InvalidField {
        field,
        text: text.to_string(),
    };
    if text.len() != width || !text.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(invalid());
    }
    let value = u32::from_str_radix(text, 16).map_err(|_| invalid())?;
    T::try_from(value).map_err(|_| invalid())
}

fn parse_relative(line: &str) -> Result<RelativeRecord, ParseErrorKind> {
    let clock = hex_field::<u16>(&line[0..4], 4, "clock")?;
    if &line[4..5] != " " {
        return Err(ParseErrorKind::UnknownLine(line.to_string()));
    }
    let address = hex_field::<u8>(&line[5..7], 2, "address")?;
    let direction = line[7..8]
        .chars()
        .next()
        .and_then(Direction::from_symbol)
        .ok_or_else(|| ParseErrorKind::InvalidField {
            field: "direction",
            text: line[7..8].to_string(),
        })?;
    let value = hex_field::<u8>(&line[8..10], 2, "value")?;
    Ok(RelativeRecord {
        clock,
        address,
        direction,
        value,
    })
}

fn parse_init(line: &str) -> Result<InitRecord, ParseErrorKind> {
    let mut fields = line.split(' ');
    let mut next = |name: &'static str| fields.next().ok_or(ParseErrorKind::MissingField(name));

    let clock_jump = hex_field::<u32>(next("clock jump")?, 8, "clock jump")?;
    let address = hex_field::<u8>(next("address")?, 2, "address")?;
    let volume = hex_field::<u8>(next("volume")?, 2, "volume")?;
    let model = hex_field::<u16>(next("model")?, 4, "model")?;
    let frequency_text = next("frequency")?;
    let frequency = frequency_text
        .parse::<f32>()
        .map_err(|_| ParseErrorKind::InvalidField {
            field: "frequency",
            text: frequency_text.to_string(),
        })?;

    if let Some(extra) = fields.next() {
        return Err(ParseErrorKind::TrailingData(extra.to_string()));
    }

    Ok(InitRecord {
        clock_jump,
        address,
        volume,
        model,
        frequency,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_relative_write() {
        let line = parse_line("000A 04 20\n").unwrap();
        assert_eq!(
            line,
            TraceLine::Relative(RelativeRecord {
                clock: 0x0A,
                address: 0x04,
                direction: Direction::Write,
                value: 0x20,
            })
        );
    }

    #[test]
    fn test_parse_relative_read() {
        let line = parse_line("1234 3B>FF").unwrap();
        assert!(matches!(
            line,
            TraceLine::Relative(RelativeRecord {
                direction: Direction::Read,
                address: 0x3B,
                ..
            })
        ));
    }

    #[test]
    fn test_parse_init() {
        let line = parse_line("00000000 20 0F 6581 985248.0000").unwrap();
        match line {
            TraceLine::Init(record) => {
                assert_eq!(record.address, 0x20);
                assert_eq!(record.volume, 0x0F);
                assert_eq!(record.model, 0x6581);
                assert_eq!(record.frequency, 985_248.0);
                assert!(!record.is_jump());
            }
            other => panic!("unexpected line {other:?}"),
        }
    }

    #[test]
    fn test_parse_headers() {
        assert_eq!(
            parse_line("!SID-FILE: <music/Commando.sid> <2>").unwrap(),
            TraceLine::File {
                path: "music/Commando.sid".into(),
                track: Some(2),
            }
        );
        assert_eq!(
            parse_line("!SID-FILE: <a> <b.sid>").unwrap(),
            TraceLine::File {
                path: "a> <b.sid".into(),
                track: None,
            }
        );
        assert_eq!(
            parse_line("!SID-TITLE: <Commando>").unwrap(),
            TraceLine::Title("Commando".into())
        );
        assert_eq!(
            parse_line("!SID-AUTHOR: <Rob Hubbard>").unwrap(),
            TraceLine::Author("Rob Hubbard".into())
        );
    }

    #[test]
    fn test_parse_rejects_bad_lines() {
        assert!(matches!(
            parse_line("hello"),
            Err(ParseErrorKind::UnknownLine(_))
        ));
        assert!(matches!(
            parse_line("00G0 04 20"),
            Err(ParseErrorKind::InvalidField { field: "clock", .. })
        ));
        assert!(matches!(
            parse_line("000A 04*20"),
            Err(ParseErrorKind::InvalidField {
                field: "direction",
                ..
            })
        ));
        assert!(matches!(
            parse_line("0000000 20 0F 6581 1.0"),
            Err(ParseErrorKind::InvalidField {
                field: "clock jump",
                ..
            })
        ));
        assert!(matches!(
            parse_line("!SID-TITLE: Commando"),
            Err(ParseErrorKind::InvalidField { field: "title", .. })
        ));
    }

    #[test]
    fn test_display_matches_input() {
        for text in [
            "!SID-FILE: <x.sid> <3>\n",
            "!SID-FILE: <x.sid>\n",
            "!SID-TITLE: <T>\n",
            "!SID-AUTHOR: <A>\n",
            "00000001 00 00 0000 0.0000\n",
            "00000000 40 0F 8580 1022727.0000\n",
            "FFFF FF>00\n",
        ] {
            assert_eq!(parse_line(text).unwrap().to_string(), text);
        }
    }
}
