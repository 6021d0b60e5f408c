// src/process/utils.rs
use once_cell::sync::Lazy;
use regex::Regex;

use crate::fetch::DocumentMetadata;

pub const ZIP_EXTENSION: &str = ".zip";
pub const CSV_EXTENSION: &str = ".csv";
/// Auditor's report exports; never analysable content.
pub const AUDITOR_REPORT_PREFIX: &str = "jpaud";
/// Resource-fork directory macOS archivers add.
pub const MACOS_METADATA_DIR: &str = "__MACOSX";

static UNSAFE_FILENAME_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"[\\/:*?"<>|\x00-\x1f]"#).expect("valid filename regex"));

/// Trim whitespace and strip outer quotes if present.
pub fn clean_str(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.starts_with('"') && trimmed.ends_with('"') && trimmed.len() >= 2 {
        trimmed[1..trimmed.len() - 1].to_string()
    } else {
        trimmed.to_string()
    }
}

/// `<docId>-<docTypeCode>-<filerName>.zip`, with path-hostile characters
/// in the filer name replaced by `_`.
pub fn archive_file_name(doc: &DocumentMetadata) -> String {
    let filer = doc.filer_name.as_deref().unwrap_or("unknown");
    let filer = UNSAFE_FILENAME_CHARS.replace_all(filer.trim(), "_");
    format!(
        "{}-{}-{}{}",
        doc.doc_id,
        doc.doc_type_code.as_deref().unwrap_or("000"),
        filer,
        ZIP_EXTENSION
    )
}

/// The three parts of an archive file name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveName {
    pub doc_id: String,
    pub doc_type_code: String,
    pub filer_name: String,
}

/// Parse `<docId>-<docTypeCode>-<filerName>.<ext>`. The filer name may
/// itself contain dashes; anything with fewer than three parts is `None`.
pub fn parse_archive_file_name(file_name: &str) -> Option<ArchiveName> {
    let stem = file_name
        .rsplit_once('.')
        .map(|(stem, _)| stem)
        .unwrap_or(file_name);
    let mut parts = stem.splitn(3, '-');
    let doc_id = parts.next().filter(|s| !s.is_empty())?;
    let doc_type_code = parts.next().filter(|s| !s.is_empty())?;
    let filer_name = parts.next()?;
    Some(ArchiveName {
        doc_id: doc_id.to_string(),
        doc_type_code: doc_type_code.to_string(),
        filer_name: filer_name.to_string(),
    })
}
