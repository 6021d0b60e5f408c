// src/process/processors/extraordinary.rs
use anyhow::Result;

use super::{apply_cover_page, cover_page_facts, ensure_content, text_blocks, Processor};
use crate::process::{RawRecordSet, StructuredDocumentData};

/// Common reasons for filing an extraordinary report, keyed by a fragment
/// of the Japanese section title.
const REPORT_REASONS: &[(&str, &str)] = &[
    ("提出理由", "Reason for Submission"),
    ("代表取締役の異動", "Change of Representative Director"),
    ("主要株主の異動", "Change of Major Shareholder"),
    ("親会社又は特定子会社の異動", "Change of Parent or Specified Subsidiary"),
    ("株主総会", "Resolutions of the General Meeting of Shareholders"),
    ("議決権", "Exercise of Voting Rights"),
    ("合併", "Merger"),
    ("株式交換", "Share Exchange"),
    ("会社分割", "Company Split"),
    ("事業の譲渡", "Business Transfer"),
    ("監査公認会計士等の異動", "Change of Auditor"),
    ("災害", "Occurrence of Disaster"),
    ("重要な事象", "Material Event"),
];

fn reason_title_en(title: &str) -> Option<&'static str> {
    REPORT_REASONS
        .iter()
        .find(|(ja, _)| title.contains(ja))
        .map(|(_, en)| *en)
}

/// Extraordinary reports (`180`) are almost entirely prose: keep the
/// cover page scalars and the narrative text blocks, skip the financials.
pub struct ExtraordinaryReportProcessor;

impl Processor for ExtraordinaryReportProcessor {
    fn name(&self) -> &'static str {
        "ExtraordinaryReportProcessor"
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
        data.text_blocks = text_blocks(
            raw,
            |element| !element.starts_with("jpdei_cor:"),
            reason_title_en,
        );

        ensure_content(&data)?;
        Ok(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::processors::test_support::export;

    #[test]
    fn test_extraordinary_keeps_prose_only() -> Result<()> {
        let raw = export(&[
            ("jpdei_cor:FilerNameInEnglishDEI", "提出者名（英語表記）", "FilingDateInstant", "提出日時点", "Sample Holdings"),
            ("jpcrp_cor:DocumentTitleCoverPage", "表紙", "FilingDateInstant", "提出日時点", "臨時報告書"),
            ("jpcrp-esr_cor:ReasonForFilingTextBlock", "提出理由", "FilingDateInstant", "提出日時点", "代表取締役の異動があったため"),
            ("jpcrp-esr_cor:ChangeInRepresentativeDirectorsTextBlock", "代表取締役の異動", "FilingDateInstant", "提出日時点", "新任: 山田太郎"),
            ("jpcrp_cor:NetSales", "売上高", "CurrentYearDuration", "当期", "100"),
        ]);

        let data = ExtraordinaryReportProcessor.process(&raw, "S100ESR", "180")?;

        assert_eq!(data.document_title.as_deref(), Some("臨時報告書"));
        assert_eq!(data.document_type.as_deref(), Some("Extraordinary Report"));
        assert!(data.key_facts.is_empty());
        let titles: Vec<_> = data.text_blocks.iter().map(|b| b.display_title()).collect();
        assert_eq!(
            titles,
            vec!["Reason for Submission", "Change of Representative Director"]
        );
        Ok(())
    }
}
