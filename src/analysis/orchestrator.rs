// src/analysis/orchestrator.rs
//! Runs the configured tools over a batch of documents and renders the
//! collected results.

use std::{collections::HashMap, fmt::Write as _};
use tracing::{error, info, warn};

use super::tools::{AnalysisFramework, ToolKind};
use crate::{
    error::AnalysisError,
    fetch::DocumentMetadata,
    process::{processors::document_type_name, StructuredDocumentData},
};

/// Tool order used by the pipeline and the report.
pub const DEFAULT_TOOLS: [&str; 2] = ["one_line_summary", "executive_summary"];

const ERROR_PREFIX: &str = "Error generating analysis";

/// What one (document, tool) invocation produced.
#[derive(Debug, Clone, PartialEq)]
pub enum AnalysisOutput {
    Text(String),
    /// The model answered but nothing usable came back.
    Empty,
    /// Neither configured model could be resolved.
    Unavailable(String),
    /// Any other failure, already rendered as a placeholder.
    Error(String),
}

impl From<Result<Option<String>, AnalysisError>> for AnalysisOutput {
    fn from(result: Result<Option<String>, AnalysisError>) -> Self {
        match result {
            Ok(Some(text)) => AnalysisOutput::Text(text),
            Ok(None) => AnalysisOutput::Empty,
            Err(e @ AnalysisError::ModelUnavailable { .. }) => {
                AnalysisOutput::Unavailable(format!("{}: {}", ERROR_PREFIX, e))
            }
            Err(e) => AnalysisOutput::Error(format!("{}: {}", ERROR_PREFIX, e)),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisResult {
    pub doc_id: String,
    pub company_name_en: String,
    pub doc_type: String,
    pub submit_date_time: String,
    /// `(tool name, output)` in tool order.
    pub analyses: Vec<(String, AnalysisOutput)>,
}

impl AnalysisResult {
    fn for_document(doc: &DocumentMetadata, data: Option<&StructuredDocumentData>) -> Self {
        let company_name_en = data
            .and_then(|d| d.company_name_en.clone())
            .unwrap_or_else(|| doc.filer_name_or_default().to_string());
        let doc_type = match doc.doc_type_code.as_deref() {
            Some(code) => document_type_name(code).unwrap_or(code).to_string(),
            None => "Unknown".to_string(),
        };
        Self {
            doc_id: doc.doc_id.clone(),
            company_name_en,
            doc_type,
            submit_date_time: doc
                .submit_date_time
                .clone()
                .unwrap_or_else(|| "Date N/A".to_string()),
            analyses: Vec::new(),
        }
    }
}

/// Every known tool over every document, in document order and then tool
/// order. Unknown tool names are skipped; documents without a structured
/// record get a result with no analyses.
pub fn analyze_documents(
    framework: &AnalysisFramework,
    docs: &[DocumentMetadata],
    data_by_id: &HashMap<String, StructuredDocumentData>,
    tool_names: &[&str],
) -> Vec<AnalysisResult> {
    let tools: Vec<ToolKind> = tool_names
        .iter()
        .filter_map(|name| {
            let kind = ToolKind::from_name(name);
            if kind.is_none() {
                warn!(tool = %name, "skipping unknown analysis type");
            }
            kind
        })
        .collect();

    let total = docs.len();
    let mut results = Vec::with_capacity(total);
    for (i, doc) in docs.iter().enumerate() {
        let data = data_by_id.get(&doc.doc_id);
        let mut result = AnalysisResult::for_document(doc, data);
        info!(
            "[{}/{}] analyzing {} ({}, ID: {})",
            i + 1,
            total,
            result.company_name_en,
            result.doc_type,
            result.doc_id
        );

        match data {
            None => warn!(doc_id = %doc.doc_id, "no structured data available, skipping analysis"),
            Some(data) => {
                for kind in &tools {
                    let output = AnalysisOutput::from(framework.analyze(*kind, data));
                    if let AnalysisOutput::Error(msg) | AnalysisOutput::Unavailable(msg) = &output {
                        error!(doc_id = %doc.doc_id, tool = kind.name(), "{}", msg);
                    }
                    result.analyses.push((kind.name().to_string(), output));
                }
            }
        }
        results.push(result);
    }
    results
}

/// `one_line_summary` → `One Line Summary`.
pub fn title_case(name: &str) -> String {
    name.split('_')
        .filter(|w| !w.is_empty())
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

/// Plain-text report: a header per document, then each tool's output
/// under a bold heading.
pub fn render_report(results: &[AnalysisResult]) -> Result<String, std::fmt::Error> {
    let rule = "=".repeat(80);
    let mut out = String::new();
    writeln!(out, "\n\n{}\nFINAL LLM ANALYSIS RESULTS\n{}\n", rule, rule)?;

    if results.is_empty() {
        writeln!(out, "No analysis results were collected.")?;
    }
    for (i, doc) in results.iter().enumerate() {
        writeln!(out, "{}", "-".repeat(80))?;
        writeln!(
            out,
            "*** Document {}/{} - {} - {}: {} ***",
            i + 1,
            results.len(),
            doc.company_name_en,
            doc.doc_type,
            doc.doc_id
        )?;
        writeln!(out, "Submitted at: {}", doc.submit_date_time)?;

        if doc.analyses.is_empty() {
            writeln!(out, "\n  No analyses were generated for this document.")?;
            continue;
        }
        for (name, output) in &doc.analyses {
            writeln!(out, "\n**{}**", title_case(name))?;
            match output {
                AnalysisOutput::Text(text) => writeln!(out, "{}", text.trim_end())?,
                AnalysisOutput::Error(msg) | AnalysisOutput::Unavailable(msg) => {
                    writeln!(out, "  {}", msg)?
                }
                AnalysisOutput::Empty => writeln!(out, "  Analysis failed or returned empty.")?,
            }
        }
    }
    writeln!(out, "\n{}", rule)?;
    Ok(out)
}
