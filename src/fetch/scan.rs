// src/fetch/scan.rs
use chrono::{Days, Local, NaiveDate};
use tracing::{error, info, instrument, warn};

use super::{DocumentMetadata, DocumentQuery, Registry, ScanFilters};

/// Walks backward one day at a time from today and stops at the first day
/// the registry has matching filings for.
pub struct DateRangeScanner<'a, R: Registry> {
    registry: &'a R,
}

impl<'a, R: Registry> DateRangeScanner<'a, R> {
    pub fn new(registry: &'a R) -> Self {
        Self { registry }
    }

    /// Scan `[today - days_back, today]`, most recent first.
    pub fn scan(
        &self,
        doc_type_codes: &[String],
        days_back: u32,
        filters: &ScanFilters,
    ) -> (Vec<DocumentMetadata>, Option<NaiveDate>) {
        self.scan_from(Local::now().date_naive(), doc_type_codes, days_back, filters)
    }

    /// Same as [`scan`](Self::scan) with an explicit "today".
    ///
    /// Only the winning day's documents are returned; days are never
    /// merged. A failed query counts as an empty day.
    #[instrument(level = "info", skip(self, doc_type_codes, filters))]
    pub fn scan_from(
        &self,
        today: NaiveDate,
        doc_type_codes: &[String],
        days_back: u32,
        filters: &ScanFilters,
    ) -> (Vec<DocumentMetadata>, Option<NaiveDate>) {
        let start = today
            .checked_sub_days(Days::new(u64::from(days_back)))
            .unwrap_or(NaiveDate::MIN);
        info!(%start, end = %today, "searching for documents in the last {} days", days_back);

        let mut date = today;
        while date >= start {
            info!(%date, "fetching documents");
            let query = DocumentQuery {
                date,
                doc_type_codes: doc_type_codes.to_vec(),
                edinet_codes: filters.edinet_codes.clone(),
                excluded_doc_type_codes: filters.excluded_doc_type_codes.clone(),
                require_sec_code: filters.require_sec_code.unwrap_or(true),
            };

            match self.registry.list_documents(&query) {
                Ok(docs) if !docs.is_empty() => {
                    info!(%date, count = docs.len(), "found documents");
                    return (docs, Some(date));
                }
                Ok(_) => info!(%date, "no documents; trying previous day"),
                Err(e) => error!(%date, error = %e, "error fetching documents"),
            }

            match date.pred_opt() {
                Some(prev) => date = prev,
                None => break,
            }
        }

        warn!("no documents found in the last {} days matching criteria", days_back);
        (Vec::new(), None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FetchError;
    use std::{
        cell::RefCell,
        collections::{HashMap, HashSet},
        path::{Path, PathBuf},
    };

    /// Registry fake keyed by date; records every date it is asked about.
    #[derive(Default)]
    struct FakeRegistry {
        docs: HashMap<NaiveDate, Vec<DocumentMetadata>>,
        failing: HashSet<NaiveDate>,
        queried: RefCell<Vec<NaiveDate>>,
    }

    impl Registry for FakeRegistry {
        fn list_documents(
            &self,
            query: &DocumentQuery,
        ) -> Result<Vec<DocumentMetadata>, FetchError> {
            self.queried.borrow_mut().push(query.date);
            if self.failing.contains(&query.date) {
                return Err(FetchError::Api {
                    status: "500".into(),
                    message: "boom".into(),
                });
            }
            Ok(self.docs.get(&query.date).cloned().unwrap_or_default())
        }

        fn download(&self, _: &DocumentMetadata, _: &Path) -> Result<PathBuf, FetchError> {
            unreachable!("scanner never downloads")
        }
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 11, d).unwrap()
    }

    fn meta(id: &str) -> DocumentMetadata {
        DocumentMetadata {
            doc_id: id.into(),
            doc_type_code: Some("160".into()),
            filer_name: Some("Filer".into()),
            submit_date_time: None,
            edinet_code: None,
            sec_code: Some("1234".into()),
        }
    }

    fn codes() -> Vec<String> {
        vec!["160".to_string(), "180".to_string()]
    }

    #[test]
    fn test_failures_fall_through_to_earlier_day() {
        let today = day(14);
        let mut registry = FakeRegistry::default();
        registry.failing.insert(day(14));
        registry.failing.insert(day(13));
        registry.docs.insert(day(12), vec![meta("A"), meta("B")]);
        registry.docs.insert(day(11), vec![meta("C")]);

        let scanner = DateRangeScanner::new(&registry);
        let (docs, found) = scanner.scan_from(today, &codes(), 3, &ScanFilters::default());

        assert_eq!(found, Some(day(12)));
        assert_eq!(
            docs.iter().map(|d| d.doc_id.as_str()).collect::<Vec<_>>(),
            vec!["A", "B"]
        );
        // day 11 is never queried once day 12 matched
        assert_eq!(*registry.queried.borrow(), vec![day(14), day(13), day(12)]);
    }

    #[test]
    fn test_most_recent_day_wins_without_aggregation() {
        let mut registry = FakeRegistry::default();
        registry.docs.insert(day(14), vec![meta("TODAY")]);
        registry.docs.insert(day(13), vec![meta("YESTERDAY")]);

        let scanner = DateRangeScanner::new(&registry);
        let (docs, found) = scanner.scan_from(day(14), &codes(), 5, &ScanFilters::default());

        assert_eq!(found, Some(day(14)));
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].doc_id, "TODAY");
    }

    #[test]
    fn test_exhausted_window_returns_nothing() {
        let mut registry = FakeRegistry::default();
        registry.docs.insert(day(9), vec![meta("TOO_OLD")]);

        let scanner = DateRangeScanner::new(&registry);
        let (docs, found) = scanner.scan_from(day(14), &codes(), 3, &ScanFilters::default());

        assert!(docs.is_empty());
        assert_eq!(found, None);
        assert_eq!(registry.queried.borrow().len(), 4);
    }

    #[test]
    fn test_zero_days_back_checks_only_today() {
        let mut registry = FakeRegistry::default();
        registry.docs.insert(day(13), vec![meta("YESTERDAY")]);

        let scanner = DateRangeScanner::new(&registry);
        let (docs, found) = scanner.scan_from(day(14), &codes(), 0, &ScanFilters::default());

        assert!(docs.is_empty());
        assert_eq!(found, None);
        assert_eq!(*registry.queried.borrow(), vec![day(14)]);
    }
}
