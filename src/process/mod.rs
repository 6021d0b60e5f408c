// src/process/mod.rs
//! Archive → raw tabular records → normalised per-document record.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

pub mod csv_reader;
pub mod dispatch;
pub mod extract;
pub mod processors;
pub mod utils;

pub use dispatch::{process_zip_directory, process_zip_file, ProcessorRegistry};
pub use extract::extract_archive;

/// One CSV row, keyed by column header.
pub type Record = HashMap<String, String>;

/// Every row of one tabular export inside an archive.
#[derive(Debug, Clone)]
pub struct RawCsv {
    pub filename: String,
    pub records: Vec<Record>,
}

/// All usable tabular exports of one archive, in traversal order.
pub type RawRecordSet = Vec<RawCsv>;

/// A named fact: either a single value or a current/prior pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FactValue {
    Period {
        current: Option<String>,
        prior: Option<String>,
    },
    Scalar(String),
}

impl FactValue {
    /// `X` for scalars, `Current: X, Prior: Y` for pairs.
    pub fn render(&self) -> String {
        match self {
            FactValue::Scalar(v) => v.clone(),
            FactValue::Period { current, prior } => format!(
                "Current: {}, Prior: {}",
                current.as_deref().unwrap_or("N/A"),
                prior.as_deref().unwrap_or("N/A")
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextBlock {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title_en: Option<String>,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_jp: Option<String>,
}

impl TextBlock {
    /// English title when known, otherwise the source title.
    pub fn display_title(&self) -> &str {
        self.title_en.as_deref().unwrap_or(&self.title)
    }

    /// Original-language content when present, otherwise `content`.
    pub fn body(&self) -> &str {
        self.content_jp.as_deref().unwrap_or(&self.content)
    }
}

/// The normalised record a processor produces for one filing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructuredDocumentData {
    pub doc_id: String,
    pub doc_type_code: String,
    pub company_name_ja: Option<String>,
    pub company_name_en: Option<String>,
    pub document_type: Option<String>,
    pub document_title: Option<String>,
    pub key_facts: BTreeMap<String, FactValue>,
    pub text_blocks: Vec<TextBlock>,
}

impl StructuredDocumentData {
    pub fn new(doc_id: &str, doc_type_code: &str) -> Self {
        Self {
            doc_id: doc_id.to_string(),
            doc_type_code: doc_type_code.to_string(),
            company_name_ja: None,
            company_name_en: None,
            document_type: processors::document_type_name(doc_type_code).map(str::to_string),
            document_title: None,
            key_facts: BTreeMap::new(),
            text_blocks: Vec::new(),
        }
    }

    /// English name, then local-language name, then a placeholder.
    pub fn display_company_name(&self) -> &str {
        self.company_name_en
            .as_deref()
            .or(self.company_name_ja.as_deref())
            .unwrap_or("Unknown Company")
    }
}
