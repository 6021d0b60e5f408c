// src/process/processors/semiannual.rs
use anyhow::Result;

use super::{
    apply_cover_page, cover_page_facts, ensure_content, field, period_facts, text_blocks,
    Processor, COL_ELEMENT_ID,
};
use crate::process::{RawRecordSet, StructuredDocumentData};

/// Summary-of-business-results elements and the fact names they map to.
/// Several elements can feed one name (JGAAP vs IFRS variants).
const KEY_FINANCIALS: &[(&str, &str)] = &[
    ("NetSalesSummaryOfBusinessResults", "Net Sales"),
    ("RevenueIFRSSummaryOfBusinessResults", "Net Sales"),
    ("OperatingRevenue1SummaryOfBusinessResults", "Net Sales"),
    ("OperatingIncome", "Operating Income"),
    ("OperatingProfitLossIFRS", "Operating Income"),
    ("OrdinaryIncomeLossSummaryOfBusinessResults", "Ordinary Income"),
    (
        "ProfitLossAttributableToOwnersOfParentSummaryOfBusinessResults",
        "Net Income Attributable to Owners of Parent",
    ),
    (
        "ProfitLossAttributableToOwnersOfParentIFRSSummaryOfBusinessResults",
        "Net Income Attributable to Owners of Parent",
    ),
    ("NetIncomeLossSummaryOfBusinessResults", "Net Income"),
    ("TotalAssetsSummaryOfBusinessResults", "Total Assets"),
    ("TotalAssetsIFRSSummaryOfBusinessResults", "Total Assets"),
    ("NetAssetsSummaryOfBusinessResults", "Net Assets"),
    ("EquityToAssetRatioSummaryOfBusinessResults", "Equity Ratio"),
    (
        "BasicEarningsLossPerShareSummaryOfBusinessResults",
        "Basic Earnings per Share",
    ),
    (
        "CashAndCashEquivalentsSummaryOfBusinessResults",
        "Cash and Cash Equivalents",
    ),
];

/// English titles for the narrative sections management writes.
fn section_title_en(title: &str) -> Option<&'static str> {
    const TITLES: &[(&str, &str)] = &[
        ("事業等のリスク", "Business Risks"),
        ("経営者による", "Management Analysis"),
        ("経営上の重要な契約", "Material Contracts"),
        ("経営方針", "Management Policy"),
        ("事業の内容", "Description of Business"),
    ];
    TITLES
        .iter()
        .find(|(ja, _)| title.contains(ja))
        .map(|(_, en)| *en)
}

fn key_financial_name(element_id: &str) -> Option<&'static str> {
    let local = element_id.rsplit(':').next()?;
    KEY_FINANCIALS
        .iter()
        .find(|(element, _)| *element == local)
        .map(|(_, name)| *name)
}

/// Semi-annual reports (`160`): headline financials as current/prior
/// pairs plus the narrative text blocks.
pub struct SemiAnnualReportProcessor;

impl Processor for SemiAnnualReportProcessor {
    fn name(&self) -> &'static str {
        "SemiAnnualReportProcessor"
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
            |row| key_financial_name(field(row, COL_ELEMENT_ID)).map(str::to_string),
            KEY_FINANCIALS.len(),
        ));
        data.text_blocks = text_blocks(raw, |_| true, section_title_en);

        ensure_content(&data)?;
        Ok(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::{processors::test_support::export, FactValue};

    #[test]
    fn test_semiannual_maps_key_financials() -> Result<()> {
        let raw = export(&[
            ("jpdei_cor:FilerNameInJapaneseDEI", "提出者名", "FilingDateInstant", "提出日時点", "半期株式会社"),
            ("jpcrp_cor:NetSalesSummaryOfBusinessResults", "売上高", "CurrentYTDDuration", "当中間期", "12000"),
            ("jpcrp_cor:NetSalesSummaryOfBusinessResults", "売上高", "Prior1YTDDuration", "前中間期", "11000"),
            ("jpcrp_cor:NetSalesSummaryOfBusinessResults", "売上高", "Prior1YearDuration", "前期", "23000"),
            ("jpcrp_cor:TotalAssetsSummaryOfBusinessResults", "総資産額", "CurrentYTDInstant", "当中間期末", "50000"),
            ("jpcrp_cor:SomethingElse", "その他", "CurrentYTDDuration", "当中間期", "7"),
            ("jpcrp_cor:BusinessRisksTextBlock", "事業等のリスク", "FilingDateInstant", "提出日時点", "リスク"),
        ]);

        let data = SemiAnnualReportProcessor.process(&raw, "S100SEMI", "160")?;

        assert_eq!(data.company_name_ja.as_deref(), Some("半期株式会社"));
        assert_eq!(
            data.key_facts["Net Sales"],
            FactValue::Period {
                current: Some("12000".into()),
                prior: Some("11000".into())
            }
        );
        assert_eq!(
            data.key_facts["Total Assets"],
            FactValue::Period {
                current: Some("50000".into()),
                prior: None
            }
        );
        assert!(!data.key_facts.contains_key("その他"));
        assert_eq!(data.text_blocks[0].title_en.as_deref(), Some("Business Risks"));
        Ok(())
    }
}
