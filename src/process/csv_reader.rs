// src/process/csv_reader.rs
use anyhow::{anyhow, Context, Result};
use csv::ReaderBuilder;
use std::{fs, path::Path};
use tracing::trace;

use super::{utils::clean_str, Record};

/// Decode a tabular export. EDINET writes UTF-16LE with a BOM; UTF-8
/// (with or without BOM) and UTF-16BE are accepted as well.
pub fn decode_text(bytes: &[u8]) -> Result<String> {
    match bytes {
        [0xFF, 0xFE, rest @ ..] => decode_utf16(rest, u16::from_le_bytes),
        [0xFE, 0xFF, rest @ ..] => decode_utf16(rest, u16::from_be_bytes),
        [0xEF, 0xBB, 0xBF, rest @ ..] => {
            String::from_utf8(rest.to_vec()).context("invalid UTF-8 after BOM")
        }
        _ => String::from_utf8(bytes.to_vec()).context("invalid UTF-8"),
    }
}

fn decode_utf16(bytes: &[u8], to_unit: fn([u8; 2]) -> u16) -> Result<String> {
    if bytes.len() % 2 != 0 {
        return Err(anyhow!("odd byte length for UTF-16 text"));
    }
    let units: Vec<u16> = bytes
        .chunks_exact(2)
        .map(|pair| to_unit([pair[0], pair[1]]))
        .collect();
    String::from_utf16(&units).context("invalid UTF-16")
}

/// Parse decoded text into header-keyed records. The delimiter is a tab
/// when the header line has one, a comma otherwise.
pub fn parse_records(text: &str) -> Result<Vec<Record>> {
    let header_line = text.lines().next().unwrap_or_default();
    let delimiter = if header_line.contains('\t') { b'\t' } else { b',' };

    let mut rdr = ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .flexible(true)
        .from_reader(text.as_bytes());

    let headers: Vec<String> = rdr
        .headers()
        .context("reading CSV header row")?
        .iter()
        .map(clean_str)
        .collect();
    if headers.iter().all(String::is_empty) {
        return Err(anyhow!("CSV has no header row"));
    }

    let mut records = Vec::new();
    for (idx, result) in rdr.records().enumerate() {
        let row = result.with_context(|| format!("CSV parse error at record {}", idx))?;
        let record: Record = headers
            .iter()
            .zip(row.iter())
            .map(|(h, v)| (h.clone(), clean_str(v)))
            .collect();
        records.push(record);
    }
    Ok(records)
}

/// Read one export from disk into records.
pub fn read_csv_file(path: &Path) -> Result<Vec<Record>> {
    let bytes = fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    let text = decode_text(&bytes).with_context(|| format!("decoding {}", path.display()))?;
    let records = parse_records(&text).with_context(|| format!("parsing {}", path.display()))?;
    trace!(path = %path.display(), rows = records.len(), "read csv");
    Ok(records)
}
