// src/fetch/zips.rs
use anyhow::{Context, Result};
use std::{
    fs,
    path::{Path, PathBuf},
    time::Instant,
};
use tracing::{error, info};

use super::{DocumentMetadata, Registry};

/// Download each document's archive into `dest_dir`, one at a time.
/// A failed download is logged and skipped; the rest still run.
pub fn download_documents<R: Registry>(
    registry: &R,
    docs: &[DocumentMetadata],
    dest_dir: impl AsRef<Path>,
) -> Result<Vec<PathBuf>> {
    let dest_dir = dest_dir.as_ref();
    fs::create_dir_all(dest_dir)
        .with_context(|| format!("creating download directory {}", dest_dir.display()))?;

    let total = docs.len();
    let mut paths = Vec::with_capacity(total);
    for (i, doc) in docs.iter().enumerate() {
        info!(doc_id = %doc.doc_id, "downloading {}/{}", i + 1, total);
        let start = Instant::now();
        match registry.download(doc, dest_dir) {
            Ok(path) => {
                info!(doc_id = %doc.doc_id, elapsed = ?start.elapsed(), "downloaded");
                paths.push(path);
            }
            Err(e) => error!(doc_id = %doc.doc_id, error = %e, "download failed"),
        }
    }
    Ok(paths)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{error::FetchError, fetch::DocumentQuery, process::utils::archive_file_name};

    struct DiskRegistry;

    impl Registry for DiskRegistry {
        fn list_documents(&self, _: &DocumentQuery) -> Result<Vec<DocumentMetadata>, FetchError> {
            Ok(Vec::new())
        }

        fn download(&self, doc: &DocumentMetadata, dest: &Path) -> Result<PathBuf, FetchError> {
            if doc.doc_id == "BROKEN" {
                return Err(FetchError::Decode("not a zip".into()));
            }
            let path = dest.join(archive_file_name(doc));
            fs::write(&path, b"PK")?;
            Ok(path)
        }
    }

    fn meta(id: &str) -> DocumentMetadata {
        DocumentMetadata {
            doc_id: id.into(),
            doc_type_code: Some("180".into()),
            filer_name: Some("株式会社サンプル".into()),
            submit_date_time: None,
            edinet_code: None,
            sec_code: None,
        }
    }

    #[test]
    fn test_failed_download_is_skipped() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let docs = vec![meta("S100A"), meta("BROKEN"), meta("S100B")];

        let paths = download_documents(&DiskRegistry, &docs, dir.path().join("downloads"))?;

        let names: Vec<String> = paths
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(
            names,
            vec!["S100A-180-株式会社サンプル.zip", "S100B-180-株式会社サンプル.zip"]
        );
        Ok(())
    }
}
