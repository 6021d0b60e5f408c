// src/error.rs
//! Typed failures for each stage of the pipeline.
//!
//! Every variant is scoped to the smallest unit that can fail on its own
//! (one date, one archive, one document, one document/tool pair). Callers
//! log and continue; nothing here is meant to abort a run.

use thiserror::Error;

/// A registry query or download failed.
#[derive(Error, Debug)]
pub enum FetchError {
    /// Transport-level failure talking to the registry.
    #[error("registry request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The registry answered but reported an error in its metadata block.
    #[error("registry returned status {status}: {message}")]
    Api { status: String, message: String },

    /// The response body could not be decoded.
    #[error("unexpected registry response: {0}")]
    Decode(String),

    /// Writing a downloaded archive to disk failed.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// No API key was configured.
    #[error("EDINET API key is not configured")]
    MissingApiKey,
}

/// An archive could not be turned into raw tabular records.
#[derive(Error, Debug)]
pub enum ExtractError {
    /// The archive could not be opened or unpacked.
    #[error("bad archive {path}: {reason}")]
    BadArchive { path: String, reason: String },

    /// The archive unpacked fine but held nothing usable.
    #[error("no usable tabular export in {path}")]
    NoUsableData { path: String },
}

/// A single analysis tool invocation failed.
#[derive(Error, Debug)]
pub enum AnalysisError {
    /// Neither the primary nor the fallback model could be resolved.
    #[error("no language model available (primary {primary}: {primary_error}; fallback {fallback}: {fallback_error})")]
    ModelUnavailable {
        primary: String,
        primary_error: String,
        fallback: String,
        fallback_error: String,
    },

    /// The model call itself failed.
    #[error("model invocation failed: {0}")]
    Invocation(String),

    /// The model answered, but not with schema-conformant output.
    #[error("failed to parse model response: {0}")]
    ResponseParsing(String),

    /// A schema-valid result could not be rendered.
    #[error("failed to format analysis: {0}")]
    Formatting(#[from] std::fmt::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ExtractError::NoUsableData {
            path: "S100ABCD-160-Foo.zip".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "no usable tabular export in S100ABCD-160-Foo.zip"
        );

        let err = FetchError::Api {
            status: "401".to_string(),
            message: "Access denied".to_string(),
        };
        assert_eq!(err.to_string(), "registry returned status 401: Access denied");
    }

    #[test]
    fn test_model_unavailable_names_both_models() {
        let err = AnalysisError::ModelUnavailable {
            primary: "gpt-4o".to_string(),
            primary_error: "unknown model".to_string(),
            fallback: "gpt-4-turbo".to_string(),
            fallback_error: "no key".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("gpt-4o"));
        assert!(msg.contains("gpt-4-turbo"));
    }
}
