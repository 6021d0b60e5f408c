// src/process/processors/generic.rs
use anyhow::Result;

use super::{
    apply_cover_page, cover_page_facts, ensure_content, field, period_facts, text_blocks,
    Processor, COL_ITEM_NAME,
};
use crate::process::{RawRecordSet, StructuredDocumentData};

/// Cap on period facts picked up from an unknown document type.
const MAX_GENERIC_FACTS: usize = 30;

/// Best-effort fallback for document types without a dedicated processor:
/// cover page, every text block, and the first numeric facts it finds.
pub struct GenericReportProcessor;

impl Processor for GenericReportProcessor {
    fn name(&self) -> &'static str {
        "GenericReportProcessor"
    }

    fn process(
        &self,
        raw: &RawRecordSet,
        doc_id: &str,
        doc_type_code: &str,
    ) -> Result<StructuredDocumentData> {
        let mut data = StructuredDocumentData::new(doc_id, doc_type_code);
        apply_cover_page(&mut data, raw);

        data.key_facts = cover_page_facts(raw);
        data.key_facts.extend(period_facts(
            raw,
            |row| match field(row, COL_ITEM_NAME) {
                "" => None,
                name => Some(name.to_string()),
            },
            MAX_GENERIC_FACTS,
        ));
        data.text_blocks = text_blocks(raw, |_| true, |_| None);

        ensure_content(&data)?;
        Ok(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::{processors::test_support::export, FactValue};

    #[test]
    fn test_generic_extracts_cover_facts_and_blocks() -> Result<()> {
        let raw = export(&[
            ("jpdei_cor:FilerNameInJapaneseDEI", "提出者名", "FilingDateInstant", "提出日時点", "株式会社テスト"),
            ("jpdei_cor:FilerNameInEnglishDEI", "提出者名（英語表記）", "FilingDateInstant", "提出日時点", "Test Co., Ltd."),
            ("jpdei_cor:SecurityCodeDEI", "証券コード", "FilingDateInstant", "提出日時点", "99990"),
            ("jpcrp_cor:NetSales", "売上高", "CurrentYearDuration", "当期", "500"),
            ("jpcrp_cor:OverviewTextBlock", "概要", "FilingDateInstant", "提出日時点", "概要本文"),
        ]);

        let data = GenericReportProcessor.process(&raw, "S100GEN", "120")?;

        assert_eq!(data.company_name_en.as_deref(), Some("Test Co., Ltd."));
        assert_eq!(data.document_type.as_deref(), Some("Annual Securities Report"));
        assert_eq!(data.key_facts["Security Code"], FactValue::Scalar("99990".into()));
        // the security code row is numeric too, but it is keyed under its own item name
        assert!(matches!(data.key_facts["売上高"], FactValue::Period { .. }));
        assert_eq!(data.text_blocks.len(), 1);
        Ok(())
    }

    #[test]
    fn test_generic_fails_without_content() {
        let raw = export(&[("jpcrp_cor:Unknown", "", "Ctx_Member", "その他", "x")]);
        assert!(GenericReportProcessor.process(&raw, "S100EMPTY", "999").is_err());
    }
}
