// src/fetch/mod.rs
//! Registry access: document listing, archive download and the
//! most-recent-day scan.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::FetchError;

pub mod edinet;
pub mod scan;
pub mod zips;

pub use edinet::EdinetClient;
pub use scan::DateRangeScanner;
pub use zips::download_documents;

/// One filing as listed by the registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    #[serde(rename = "docID")]
    pub doc_id: String,
    #[serde(rename = "docTypeCode", default)]
    pub doc_type_code: Option<String>,
    #[serde(rename = "filerName", default)]
    pub filer_name: Option<String>,
    #[serde(rename = "submitDateTime", default)]
    pub submit_date_time: Option<String>,
    #[serde(rename = "edinetCode", default)]
    pub edinet_code: Option<String>,
    #[serde(rename = "secCode", default)]
    pub sec_code: Option<String>,
}

impl DocumentMetadata {
    pub fn has_sec_code(&self) -> bool {
        self.sec_code.as_deref().is_some_and(|c| !c.trim().is_empty())
    }

    pub fn filer_name_or_default(&self) -> &str {
        self.filer_name.as_deref().unwrap_or("Unknown Company")
    }
}

/// Criteria for a single-day registry listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentQuery {
    pub date: NaiveDate,
    pub doc_type_codes: Vec<String>,
    pub edinet_codes: Option<Vec<String>>,
    pub excluded_doc_type_codes: Option<Vec<String>>,
    pub require_sec_code: bool,
}

impl DocumentQuery {
    /// Whether `doc` satisfies every filter of this query.
    pub fn matches(&self, doc: &DocumentMetadata) -> bool {
        let code = doc.doc_type_code.as_deref().unwrap_or_default();
        if !self.doc_type_codes.is_empty() && !self.doc_type_codes.iter().any(|c| c == code) {
            return false;
        }
        if let Some(excluded) = &self.excluded_doc_type_codes {
            if excluded.iter().any(|c| c == code) {
                return false;
            }
        }
        if let Some(edinet_codes) = &self.edinet_codes {
            let ec = doc.edinet_code.as_deref().unwrap_or_default();
            if !edinet_codes.iter().any(|c| c == ec) {
                return false;
            }
        }
        !self.require_sec_code || doc.has_sec_code()
    }
}

/// Optional filters shared by every day of a scan.
#[derive(Debug, Clone, Default)]
pub struct ScanFilters {
    pub edinet_codes: Option<Vec<String>>,
    pub excluded_doc_type_codes: Option<Vec<String>>,
    /// `None` means the registry default of requiring a security code.
    pub require_sec_code: Option<bool>,
}

/// The registry the scanner and downloader talk to.
pub trait Registry {
    fn list_documents(&self, query: &DocumentQuery) -> Result<Vec<DocumentMetadata>, FetchError>;

    /// Download the archive for `doc` into `dest_dir`, returning its path.
    fn download(&self, doc: &DocumentMetadata, dest_dir: &Path) -> Result<PathBuf, FetchError>;
}
