// src/fetch/edinet.rs
use reqwest::blocking::Client;
use serde::Deserialize;
use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};
use tracing::{debug, info};
use url::Url;

use super::{DocumentMetadata, DocumentQuery, Registry};
use crate::{error::FetchError, process::utils::archive_file_name};

/// `type=2` asks the listing endpoint for full metadata, not just counts.
const LIST_TYPE_METADATA: &str = "2";
/// `type=5` is the XBRL-to-CSV zip.
const DOWNLOAD_TYPE_CSV: &str = "5";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Deserialize)]
struct ListResponse {
    metadata: ListMetadata,
    #[serde(default)]
    results: Vec<DocumentMetadata>,
}

#[derive(Debug, Deserialize)]
struct ListMetadata {
    status: String,
    #[serde(default)]
    message: String,
}

/// Blocking client for the EDINET v2 document API.
pub struct EdinetClient {
    client: Client,
    base: Url,
    api_key: Option<String>,
}

impl EdinetClient {
    pub fn new(base_url: &str, api_key: Option<String>) -> Result<Self, FetchError> {
        // a trailing slash keeps `join` from replacing the last path segment
        let base = if base_url.ends_with('/') {
            base_url.to_string()
        } else {
            format!("{}/", base_url)
        };
        let base = Url::parse(&base).map_err(|e| FetchError::Decode(e.to_string()))?;
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            client,
            base,
            api_key,
        })
    }

    fn api_key(&self) -> Result<&str, FetchError> {
        self.api_key.as_deref().ok_or(FetchError::MissingApiKey)
    }

    fn endpoint(&self, path: &str) -> Result<Url, FetchError> {
        self.base
            .join(path)
            .map_err(|e| FetchError::Decode(format!("building url for {}: {}", path, e)))
    }
}

impl Registry for EdinetClient {
    fn list_documents(&self, query: &DocumentQuery) -> Result<Vec<DocumentMetadata>, FetchError> {
        let key = self.api_key()?;
        let url = self.endpoint("documents.json")?;
        let date = query.date.format("%Y-%m-%d").to_string();
        debug!(%url, %date, "listing documents");

        let body: ListResponse = self
            .client
            .get(url)
            .query(&[
                ("date", date.as_str()),
                ("type", LIST_TYPE_METADATA),
                ("Subscription-Key", key),
            ])
            .send()?
            .error_for_status()?
            .json()?;

        if body.metadata.status != "200" {
            return Err(FetchError::Api {
                status: body.metadata.status,
                message: body.metadata.message,
            });
        }

        let total = body.results.len();
        let docs: Vec<DocumentMetadata> = body
            .results
            .into_iter()
            .filter(|d| query.matches(d))
            .collect();
        debug!(%date, total, kept = docs.len(), "filtered registry listing");
        Ok(docs)
    }

    fn download(&self, doc: &DocumentMetadata, dest_dir: &Path) -> Result<PathBuf, FetchError> {
        let key = self.api_key()?;
        let url = self.endpoint(&format!("documents/{}", doc.doc_id))?;

        let resp = self
            .client
            .get(url)
            .query(&[("type", DOWNLOAD_TYPE_CSV), ("Subscription-Key", key)])
            .send()?
            .error_for_status()?;

        // errors come back as JSON with a 200 status
        let is_json = resp
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.contains("application/json"));
        if is_json {
            let text = resp.text()?;
            return Err(FetchError::Api {
                status: "error".to_string(),
                message: text,
            });
        }

        let bytes = resp.bytes()?;
        fs::create_dir_all(dest_dir)?;
        let dest_path = dest_dir.join(archive_file_name(doc));
        fs::write(&dest_path, &bytes)?;
        info!(doc_id = %doc.doc_id, path = %dest_path.display(), size = bytes.len(), "downloaded");
        Ok(dest_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_keeps_api_version_segment() -> Result<(), FetchError> {
        let client = EdinetClient::new("https://api.edinet-fsa.go.jp/api/v2", None)?;
        let url = client.endpoint("documents.json")?;
        assert_eq!(url.as_str(), "https://api.edinet-fsa.go.jp/api/v2/documents.json");
        let url = client.endpoint("documents/S100ABCD")?;
        assert_eq!(url.as_str(), "https://api.edinet-fsa.go.jp/api/v2/documents/S100ABCD");
        Ok(())
    }

    #[test]
    fn test_missing_key_fails_before_request() -> Result<(), FetchError> {
        let client = EdinetClient::new("http://127.0.0.1:9/api/v2", None)?;
        let query = DocumentQuery {
            date: chrono::NaiveDate::from_ymd_opt(2024, 1, 5).unwrap(),
            doc_type_codes: vec!["160".into()],
            edinet_codes: None,
            excluded_doc_type_codes: None,
            require_sec_code: true,
        };
        assert!(matches!(
            client.list_documents(&query),
            Err(FetchError::MissingApiKey)
        ));
        Ok(())
    }

    #[test]
    fn test_list_response_shape() {
        let json = r#"{"metadata":{"title":"x","parameter":{},"resultset":{"count":1},
            "processDateTime":"2024-01-05 00:00","status":"200","message":"OK"},
            "results":[{"docID":"S100A","docTypeCode":"180","filerName":"A社","secCode":null}]}"#;
        let resp: ListResponse = serde_json::from_str(json).unwrap();
        assert_eq!(resp.metadata.status, "200");
        assert_eq!(resp.results.len(), 1);
        assert!(!resp.results[0].has_sec_code());
    }
}
