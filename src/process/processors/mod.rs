// src/process/processors/mod.rs
//! Per-document-type normalisers for EDINET XBRL-to-CSV exports.
//!
//! Every export row carries the same nine columns; the helpers here pull
//! cover-page (DEI) values, text blocks and period-paired numeric facts
//! out of them. The concrete processors decide which of those to keep.

use anyhow::{bail, Result};
use std::collections::{BTreeMap, HashSet};

use super::{FactValue, RawRecordSet, Record, StructuredDocumentData, TextBlock};

mod extraordinary;
mod generic;
mod semiannual;

pub use extraordinary::ExtraordinaryReportProcessor;
pub use generic::GenericReportProcessor;
pub use semiannual::SemiAnnualReportProcessor;

pub const COL_ELEMENT_ID: &str = "要素ID";
pub const COL_ITEM_NAME: &str = "項目名";
pub const COL_CONTEXT_ID: &str = "コンテキストID";
pub const COL_RELATIVE_YEAR: &str = "相対年度";
pub const COL_CONSOLIDATION: &str = "連結・個別";
pub const COL_UNIT_ID: &str = "ユニットID";
pub const COL_VALUE: &str = "値";

pub const DEI_FILER_NAME_JA: &str = "jpdei_cor:FilerNameInJapaneseDEI";
pub const DEI_FILER_NAME_EN: &str = "jpdei_cor:FilerNameInEnglishDEI";
pub const DEI_SECURITY_CODE: &str = "jpdei_cor:SecurityCodeDEI";
pub const DEI_ACCOUNTING_STANDARDS: &str = "jpdei_cor:AccountingStandardsDEI";
pub const DOCUMENT_TITLE: &str = "jpcrp_cor:DocumentTitleCoverPage";

/// English names for the document types this crate knows about.
pub fn document_type_name(code: &str) -> Option<&'static str> {
    match code {
        "120" => Some("Annual Securities Report"),
        "140" => Some("Quarterly Report"),
        "160" => Some("Semi-Annual Report"),
        "180" => Some("Extraordinary Report"),
        "350" => Some("Large Volume Holding Report"),
        _ => None,
    }
}

/// Turns one filing's raw exports into a [`StructuredDocumentData`].
/// Implementations hold no per-document state, so one instance serves
/// any number of documents.
pub trait Processor {
    fn name(&self) -> &'static str;

    fn process(
        &self,
        raw: &RawRecordSet,
        doc_id: &str,
        doc_type_code: &str,
    ) -> Result<StructuredDocumentData>;
}

/// Which side of a current/prior pair a relative-year label belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Period {
    Current,
    Prior,
}

/// `当期`, `当中間期末`, `提出日時点` → current; `前期`, `前中間期` → prior.
/// Two-periods-back (`前々期`) and anything unrecognised is `None`.
pub(crate) fn classify_relative_year(label: &str) -> Option<Period> {
    if label.starts_with("前々") {
        None
    } else if label.starts_with('当') || label.starts_with("提出日") {
        Some(Period::Current)
    } else if label.starts_with('前') {
        Some(Period::Prior)
    } else {
        None
    }
}

pub(crate) fn rows(raw: &RawRecordSet) -> impl Iterator<Item = &Record> {
    raw.iter().flat_map(|csv| csv.records.iter())
}

pub(crate) fn field<'a>(row: &'a Record, column: &str) -> &'a str {
    row.get(column).map(String::as_str).unwrap_or_default()
}

/// First non-empty value for `element_id` across all exports.
pub(crate) fn find_value(raw: &RawRecordSet, element_id: &str) -> Option<String> {
    rows(raw)
        .filter(|row| field(row, COL_ELEMENT_ID) == element_id)
        .map(|row| field(row, COL_VALUE))
        .find(|v| !v.is_empty() && *v != "－")
        .map(str::to_string)
}

/// A context id without a member suffix is the entity-wide figure.
pub(crate) fn is_primary_context(row: &Record) -> bool {
    !field(row, COL_CONTEXT_ID).contains('_')
}

pub(crate) fn is_numeric(value: &str) -> bool {
    !value.is_empty() && value.replace(',', "").parse::<f64>().is_ok()
}

/// Company names and title from the cover page.
pub(crate) fn apply_cover_page(data: &mut StructuredDocumentData, raw: &RawRecordSet) {
    data.company_name_ja = find_value(raw, DEI_FILER_NAME_JA);
    data.company_name_en = find_value(raw, DEI_FILER_NAME_EN);
    data.document_title = find_value(raw, DOCUMENT_TITLE);
}

/// Scalar cover-page facts worth showing a reader.
pub(crate) fn cover_page_facts(raw: &RawRecordSet) -> BTreeMap<String, FactValue> {
    [
        ("Security Code", DEI_SECURITY_CODE),
        ("Accounting Standards", DEI_ACCOUNTING_STANDARDS),
    ]
    .into_iter()
    .filter_map(|(name, element)| {
        find_value(raw, element).map(|v| (name.to_string(), FactValue::Scalar(v)))
    })
    .collect()
}

/// Rows whose element is a text block, once per element, in export order.
/// `accept` can narrow the element ids considered.
pub(crate) fn text_blocks(
    raw: &RawRecordSet,
    accept: impl Fn(&str) -> bool,
    title_en: impl Fn(&str) -> Option<&'static str>,
) -> Vec<TextBlock> {
    let mut seen = HashSet::new();
    let mut blocks = Vec::new();
    for row in rows(raw) {
        let element = field(row, COL_ELEMENT_ID);
        let content = field(row, COL_VALUE);
        if !element.ends_with("TextBlock") || content.is_empty() || !accept(element) {
            continue;
        }
        if !seen.insert(element.to_string()) {
            continue;
        }
        let title = match field(row, COL_ITEM_NAME) {
            "" => element.rsplit(':').next().unwrap_or(element).to_string(),
            name => name.to_string(),
        };
        blocks.push(TextBlock {
            title_en: title_en(title.as_str()).map(str::to_string),
            title,
            content: content.to_string(),
            content_jp: None,
        });
    }
    blocks
}

/// Pair current and prior values for the element ids `select` maps to a
/// fact name. Only entity-wide contexts are used; the first value seen
/// for each side wins.
pub(crate) fn period_facts(
    raw: &RawRecordSet,
    select: impl Fn(&Record) -> Option<String>,
    limit: usize,
) -> BTreeMap<String, FactValue> {
    let mut facts: BTreeMap<String, FactValue> = BTreeMap::new();
    for row in rows(raw) {
        let value = field(row, COL_VALUE);
        if !is_primary_context(row) || !is_numeric(value) {
            continue;
        }
        let Some(period) = classify_relative_year(field(row, COL_RELATIVE_YEAR)) else {
            continue;
        };
        let Some(name) = select(row) else {
            continue;
        };
        if !facts.contains_key(&name) && facts.len() >= limit {
            continue;
        }
        let entry = facts.entry(name).or_insert(FactValue::Period {
            current: None,
            prior: None,
        });
        if let FactValue::Period { current, prior } = entry {
            let slot = match period {
                Period::Current => current,
                Period::Prior => prior,
            };
            if slot.is_none() {
                *slot = Some(value.to_string());
            }
        }
    }
    facts
}

/// A record with no name and no content is not a usable document.
pub(crate) fn ensure_content(data: &StructuredDocumentData) -> Result<()> {
    let named = data.company_name_ja.is_some() || data.company_name_en.is_some();
    if !named && data.key_facts.is_empty() && data.text_blocks.is_empty() {
        bail!("no recognisable content in {}", data.doc_id);
    }
    Ok(())
}
