// src/process/dispatch.rs
use glob::glob;
use std::{collections::HashMap, path::Path};
use tracing::{debug, error, info, instrument, warn};

use super::{
    extract::extract_archive,
    processors::{
        ExtraordinaryReportProcessor, GenericReportProcessor, Processor,
        SemiAnnualReportProcessor,
    },
    utils::{parse_archive_file_name, ZIP_EXTENSION},
    RawRecordSet, StructuredDocumentData,
};
use crate::error::ExtractError;

/// Document-type code → processor, with a generic fallback for codes
/// nobody registered.
pub struct ProcessorRegistry {
    processors: HashMap<String, Box<dyn Processor>>,
    fallback: Box<dyn Processor>,
}

impl Default for ProcessorRegistry {
    fn default() -> Self {
        let mut registry = Self::with_fallback(Box::new(GenericReportProcessor));
        registry.register("160", Box::new(SemiAnnualReportProcessor));
        registry.register("180", Box::new(ExtraordinaryReportProcessor));
        registry
    }
}

impl ProcessorRegistry {
    /// An empty table that sends everything to `fallback`.
    pub fn with_fallback(fallback: Box<dyn Processor>) -> Self {
        Self {
            processors: HashMap::new(),
            fallback,
        }
    }

    pub fn register(&mut self, doc_type_code: &str, processor: Box<dyn Processor>) {
        self.processors.insert(doc_type_code.to_string(), processor);
    }

    pub fn resolve(&self, doc_type_code: &str) -> &dyn Processor {
        self.processors
            .get(doc_type_code)
            .map(|p| p.as_ref())
            .unwrap_or(self.fallback.as_ref())
    }

    /// Normalise `raw` with the processor for `doc_type_code`. A processor
    /// failure is logged and comes back as `None`.
    pub fn dispatch(
        &self,
        raw: &RawRecordSet,
        doc_id: &str,
        doc_type_code: &str,
    ) -> Option<StructuredDocumentData> {
        let processor = self.resolve(doc_type_code);
        debug!(processor = processor.name(), %doc_id, %doc_type_code, "dispatching");
        match processor.process(raw, doc_id, doc_type_code) {
            Ok(data) => Some(data),
            Err(e) => {
                error!(processor = processor.name(), %doc_id, error = %e, "processing failed");
                None
            }
        }
    }
}

/// Extract one archive and run it through its processor.
#[instrument(level = "info", skip(registry, zip_path), fields(zip = %zip_path.display()))]
pub fn process_zip_file(
    registry: &ProcessorRegistry,
    zip_path: &Path,
    doc_id: &str,
    doc_type_code: &str,
) -> Option<StructuredDocumentData> {
    let raw = match extract_archive(zip_path) {
        Ok(raw) => raw,
        Err(e @ ExtractError::BadArchive { .. }) => {
            error!(error = %e, "skipping archive");
            return None;
        }
        Err(e @ ExtractError::NoUsableData { .. }) => {
            warn!(error = %e, "skipping archive");
            return None;
        }
    };

    let data = registry.dispatch(&raw, doc_id, doc_type_code);
    match &data {
        Some(_) => info!(%doc_id, "processed structured data"),
        None => warn!(%doc_id, "processor returned no data"),
    }
    data
}

/// Process every `<docId>-<docTypeCode>-<filerName>.zip` in `dir`, in
/// file-name order. Archives whose type code is outside `doc_type_codes`
/// (when given) are skipped before extraction.
pub fn process_zip_directory(
    registry: &ProcessorRegistry,
    dir: &Path,
    doc_type_codes: Option<&[String]>,
) -> Vec<StructuredDocumentData> {
    if !dir.is_dir() {
        error!(dir = %dir.display(), "directory not found");
        return Vec::new();
    }

    let pattern = format!("{}/*{}", glob::Pattern::escape(&dir.to_string_lossy()), ZIP_EXTENSION);
    let mut zip_files: Vec<_> = match glob(&pattern) {
        Ok(paths) => paths.filter_map(Result::ok).collect(),
        Err(e) => {
            error!(%pattern, error = %e, "invalid glob pattern");
            return Vec::new();
        }
    };
    zip_files.sort();

    let total = zip_files.len();
    info!(dir = %dir.display(), total, "found zip files to process");

    let mut out = Vec::new();
    for (i, path) in zip_files.iter().enumerate() {
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        let Some(name) = parse_archive_file_name(&file_name) else {
            warn!(file = %file_name, "skipping improperly named zip file");
            continue;
        };
        if let Some(codes) = doc_type_codes {
            if !codes.iter().any(|c| *c == name.doc_type_code) {
                debug!(file = %file_name, "doc type not in target list");
                continue;
            }
        }

        info!("processing {}/{}: {}", i + 1, total, file_name);
        if let Some(data) = process_zip_file(registry, path, &name.doc_id, &name.doc_type_code) {
            out.push(data);
        }
    }

    info!(processed = out.len(), "finished processing zip directory");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::{bail, Result};
    use std::{cell::RefCell, fs, io::Write, rc::Rc};
    use zip::{write::SimpleFileOptions, ZipWriter};

    /// Records the doc ids it sees and always succeeds.
    struct Recording(Rc<RefCell<Vec<String>>>);

    impl Processor for Recording {
        fn name(&self) -> &'static str {
            "Recording"
        }

        fn process(
            &self,
            raw: &RawRecordSet,
            doc_id: &str,
            doc_type_code: &str,
        ) -> Result<StructuredDocumentData> {
            self.0.borrow_mut().push(doc_id.to_string());
            let mut data = StructuredDocumentData::new(doc_id, doc_type_code);
            data.company_name_en = Some(format!("{} exports", raw.len()));
            Ok(data)
        }
    }

    struct Failing;

    impl Processor for Failing {
        fn name(&self) -> &'static str {
            "Failing"
        }

        fn process(&self, _: &RawRecordSet, doc_id: &str, _: &str) -> Result<StructuredDocumentData> {
            bail!("cannot normalise {}", doc_id)
        }
    }

    fn write_zip(path: &Path, entries: &[(&str, &str)]) -> Result<()> {
        let mut zip = ZipWriter::new(fs::File::create(path)?);
        for (name, body) in entries {
            zip.start_file(*name, SimpleFileOptions::default())?;
            zip.write_all(body.as_bytes())?;
        }
        zip.finish()?;
        Ok(())
    }

    const CSV: &str = "要素ID\t値\njpcrp_cor:X\t1\n";

    #[test]
    fn test_unknown_code_uses_fallback() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut registry = ProcessorRegistry::with_fallback(Box::new(Recording(seen.clone())));
        registry.register("180", Box::new(Failing));

        assert_eq!(registry.resolve("999").name(), "Recording");
        assert_eq!(registry.resolve("180").name(), "Failing");
        assert!(registry.dispatch(&Vec::new(), "S1", "999").is_some());
        assert!(registry.dispatch(&Vec::new(), "S2", "180").is_none());
        assert_eq!(*seen.borrow(), vec!["S1"]);
    }

    #[test]
    fn test_default_registry_routes_known_codes() {
        let registry = ProcessorRegistry::default();
        assert_eq!(registry.resolve("160").name(), "SemiAnnualReportProcessor");
        assert_eq!(registry.resolve("180").name(), "ExtraordinaryReportProcessor");
        assert_eq!(registry.resolve("120").name(), "GenericReportProcessor");
    }

    #[test]
    fn test_directory_batch_filters_names_and_codes() -> Result<()> {
        let dir = tempfile::tempdir()?;
        write_zip(&dir.path().join("S100A-160-Alpha.zip"), &[("a.csv", CSV)])?;
        write_zip(&dir.path().join("S100B-180-Beta-Holdings.zip"), &[("b.csv", CSV)])?;
        // valid and usable, but its type code is outside the allow-list
        write_zip(&dir.path().join("S100C-350-Gamma.zip"), &[("c.csv", CSV)])?;
        // improperly named
        write_zip(&dir.path().join("orphan.zip"), &[("c.csv", CSV)])?;
        // auditor report only: extracts, but nothing usable
        write_zip(&dir.path().join("S100D-160-Delta.zip"), &[("jpaud-x.csv", CSV)])?;
        fs::write(dir.path().join("notes.txt"), b"ignored")?;

        let seen = Rc::new(RefCell::new(Vec::new()));
        let registry = ProcessorRegistry::with_fallback(Box::new(Recording(seen.clone())));
        let allow = vec!["160".to_string(), "180".to_string()];

        let out = process_zip_directory(&registry, dir.path(), Some(allow.as_slice()));

        let ids: Vec<_> = out.iter().map(|d| d.doc_id.as_str()).collect();
        assert_eq!(ids, vec!["S100A", "S100B"]);
        assert_eq!(*seen.borrow(), vec!["S100A", "S100B"]);
        assert_eq!(out[1].doc_type_code, "180");
        assert!(!seen.borrow().iter().any(|id| id == "S100C"));

        // without an allow-list the same archive is processed
        seen.borrow_mut().clear();
        let out = process_zip_directory(&registry, dir.path(), None);
        let ids: Vec<_> = out.iter().map(|d| d.doc_id.as_str()).collect();
        assert_eq!(ids, vec!["S100A", "S100B", "S100C"]);
        Ok(())
    }

    #[test]
    fn test_missing_directory_yields_nothing() {
        let registry = ProcessorRegistry::default();
        let out = process_zip_directory(&registry, Path::new("/nonexistent/edinet"), None);
        assert!(out.is_empty());
    }
}
