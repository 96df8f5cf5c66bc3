use std::fs::File;
use std::io::{Read, stdin};
use std::path::Path;

use anyhow::{Context, bail};
use flate2::read::GzDecoder;
use sidlog::TraceDocument;
use sidlog::chip::model::CLOCK_PAL;
use sidlog::chip::registers::register_name;
use sidlog::trace::Direction;
use tracing::debug;

use comfy_table::{Cell, CellAlignment, ContentArrangement, Table, presets::UTF8_FULL};
use unicode_width::UnicodeWidthStr;

/// Pad a &str to a target display width (columns) using unicode-width, so
/// tune titles and author names with fullwidth characters stay aligned.
fn pad_to_width(s: &str, width: usize) -> String {
    let w = UnicodeWidthStr::width(s);
    if w >= width {
        s.to_string()
    } else {
        format!("{}{}", s, " ".repeat(width - w))
    }
}

fn is_gzip(bytes: &[u8]) -> bool {
    bytes.len() >= 2 && bytes[0] == 0x1F && bytes[1] == 0x8B
}

/// Read a dump from a path or stdin ('-') as text.
///
/// Gzipped input is decompressed when the file has a `.gz` extension or the
/// data starts with the gzip magic bytes (0x1F 0x8B).
pub fn read_dump(path: &Path) -> anyhow::Result<String> {
    let mut raw = Vec::new();
    if path == Path::new("-") {
        stdin()
            .read_to_end(&mut raw)
            .context("failed to read from stdin")?;
    } else {
        let mut f = File::open(path)
            .with_context(|| format!("failed to open input file: {}", path.display()))?;
        f.read_to_end(&mut raw)
            .context("failed to read input file")?;
    }

    let is_gz_ext = path
        .extension()
        .and_then(|s| s.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("gz"))
        .unwrap_or(false);

    let bytes = if is_gz_ext || is_gzip(&raw) {
        let mut decoder = GzDecoder::new(&raw[..]);
        let mut out = Vec::new();
        decoder
            .read_to_end(&mut out)
            .context("failed to decompress gzip input")?;
        out
    } else {
        raw
    };
    debug!("read {} bytes from {}", bytes.len(), path.display());

    String::from_utf8(bytes).context("dump is not valid UTF-8")
}

fn parse(path: &Path, text: &str) -> anyhow::Result<TraceDocument> {
    TraceDocument::try_from(text).with_context(|| format!("failed to parse {}", path.display()))
}

fn model_name(code: u16) -> String {
    match code {
        0 => "(unset)".to_string(),
        code => format!("{:04x}", code),
    }
}

/// Info command: print the tune header and a per-chip summary table.
pub fn info(path: &Path, text: &str, clock: Option<f32>) -> anyhow::Result<()> {
    let document = parse(path, text)?;
    let summary = document.summary();

    let mut fields: Vec<(&str, String)> = vec![("File", path.display().to_string())];
    if let Some(tune) = document.info() {
        fields.push(("Tune", tune.file));
        if tune.track > 0 {
            fields.push(("Track", tune.track.to_string()));
        }
        fields.push(("Title", tune.title));
        fields.push(("Author", tune.author));
    }
    fields.push(("Lines", document.lines.len().to_string()));
    fields.push(("Jumps", summary.jumps.to_string()));

    let width = fields
        .iter()
        .map(|(k, _)| UnicodeWidthStr::width(*k))
        .max()
        .unwrap_or(0);
    for (k, v) in &fields {
        println!("{}  {}", pad_to_width(k, width), v);
    }

    if summary.chips.is_empty() {
        println!("(no chip activity)");
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        Cell::new("Chip"),
        Cell::new("Model"),
        Cell::new("Clock (Hz)"),
        Cell::new("Resets"),
        Cell::new("Writes"),
        Cell::new("Reads"),
        Cell::new("Last clock"),
        Cell::new("Seconds"),
    ]);
    for (chip, s) in &summary.chips {
        let hz = match clock {
            Some(hz) => hz,
            None if s.frequency > 0.0 => s.frequency,
            None => CLOCK_PAL,
        };
        let seconds = s.last_clock as f64 / hz as f64;
        table.add_row(vec![
            Cell::new(chip),
            Cell::new(model_name(s.model)),
            Cell::new(format!("{:.4}", hz)).set_alignment(CellAlignment::Right),
            Cell::new(s.resets).set_alignment(CellAlignment::Right),
            Cell::new(s.writes).set_alignment(CellAlignment::Right),
            Cell::new(s.reads).set_alignment(CellAlignment::Right),
            Cell::new(s.last_clock).set_alignment(CellAlignment::Right),
            Cell::new(format!("{:.3}", seconds)).set_alignment(CellAlignment::Right),
        ]);
    }
    println!("{}", table);

    Ok(())
}

/// Events command: one line per access with the chip's absolute clock.
pub fn events(
    path: &Path,
    text: &str,
    chip: Option<u8>,
    limit: Option<usize>,
) -> anyhow::Result<()> {
    let document = parse(path, text)?;

    let selected = document
        .accesses()
        .filter(|a| chip.is_none_or(|c| a.chip == c))
        .take(limit.unwrap_or(usize::MAX));

    for access in selected {
        println!(
            "{:>12} {} {:02X} {} {} {:02X}",
            access.clock,
            access.chip,
            access.register,
            pad_to_width(register_name(access.register), 10),
            match access.direction {
                Direction::Write => "W",
                Direction::Read => "R",
            },
            access.value
        );
    }

    Ok(())
}

/// Test command: parse, serialize and compare the text.
///
/// Fails on parse errors and on any difference; the first differing line is
/// reported.
pub fn test_roundtrip(path: &Path, text: &str) -> anyhow::Result<()> {
    let file_str = match path.canonicalize() {
        Ok(p) => p.to_string_lossy().into_owned(),
        Err(_) => path.to_string_lossy().into_owned(),
    };

    let document = parse(path, text)?;
    let rebuilt = document.to_string();

    let original: Vec<&str> = text.lines().filter(|l| !l.trim().is_empty()).collect();
    let serialized: Vec<&str> = rebuilt.lines().collect();

    if let Some(idx) = (0..original.len().max(serialized.len()))
        .find(|&i| original.get(i) != serialized.get(i))
    {
        bail!(
            "\"{}\": roundtrip: MISMATCH at record {}: {:?} != {:?}",
            file_str,
            idx + 1,
            original.get(idx).copied().unwrap_or("<missing>"),
            serialized.get(idx).copied().unwrap_or("<missing>")
        );
    }

    println!(
        "\"{}\": roundtrip: serialized matches original ({} lines)",
        file_str,
        serialized.len()
    );
    Ok(())
}
