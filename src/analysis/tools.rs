// src/analysis/tools.rs
//! Analysis tools: a prompt builder, an output schema and a formatter per
//! tool, run through one shared resolve → prompt → parse → format path.

use serde::de::DeserializeOwned;
use std::fmt::Write as _;
use tracing::{debug, error, info, instrument};

use super::{
    model::{resolve_with_fallback, ModelResolver, ModelResponse, OutputSchema, SYSTEM_INSTRUCTION},
    schemas::{executive_summary_schema, one_line_summary_schema, ExecutiveSummary, OneLineSummary},
};
use crate::{
    config::{Config, Limits},
    error::AnalysisError,
    process::StructuredDocumentData,
};

/// One kind of analysis over a structured record.
pub trait PromptTool {
    type Output: DeserializeOwned;

    fn name(&self) -> &'static str;

    fn create_prompt(&self, data: &StructuredDocumentData) -> String;

    fn output_schema(&self) -> OutputSchema;

    fn format_to_text(&self, output: &Self::Output) -> Result<String, AnalysisError>;
}

/// The tools callers can ask for by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolKind {
    OneLineSummary,
    ExecutiveSummary,
}

impl ToolKind {
    pub const ALL: [ToolKind; 2] = [ToolKind::OneLineSummary, ToolKind::ExecutiveSummary];

    pub fn name(self) -> &'static str {
        match self {
            ToolKind::OneLineSummary => "one_line_summary",
            ToolKind::ExecutiveSummary => "executive_summary",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.name() == name)
    }
}

/// Where a parsed result came from, in order of preference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseSource {
    SchemaObject,
    ParsedData,
    RawText,
}

/// Decode a response into `T`, preferring an already-parsed schema object,
/// then pre-parsed data, then the raw text.
pub fn parse_response<T: DeserializeOwned>(
    response: &ModelResponse,
) -> Result<(T, ParseSource), AnalysisError> {
    let invalid = |source: ParseSource, e: serde_json::Error| {
        AnalysisError::ResponseParsing(format!("{:?} does not match schema: {}", source, e))
    };

    if let Some(value) = &response.schema_object {
        debug!("using response schema object");
        return T::deserialize(value)
            .map(|v| (v, ParseSource::SchemaObject))
            .map_err(|e| invalid(ParseSource::SchemaObject, e));
    }
    if let Some(value) = &response.parsed_data {
        debug!("using response parsed data");
        return T::deserialize(value)
            .map(|v| (v, ParseSource::ParsedData))
            .map_err(|e| invalid(ParseSource::ParsedData, e));
    }

    debug!("no pre-parsed output; parsing response text");
    let text = response.text().trim();
    if text.is_empty() {
        return Err(AnalysisError::ResponseParsing(
            "model returned empty or whitespace response".to_string(),
        ));
    }
    serde_json::from_str(text)
        .map(|v| (v, ParseSource::RawText))
        .map_err(|e| invalid(ParseSource::RawText, e))
}

fn prompt_header(data: &StructuredDocumentData, instructions: &str) -> String {
    format!(
        "{instructions}\n\n\
         Company Name: {}\n\
         Document Type: {}\n\
         Document Title: {}\n\n\
         Disclosure Content (extracted key facts and text blocks):\n",
        data.display_company_name(),
        data.document_type.as_deref().unwrap_or("document"),
        data.document_title.as_deref().unwrap_or_default(),
    )
}

fn push_key_facts(prompt: &mut String, data: &StructuredDocumentData) {
    if data.key_facts.is_empty() {
        return;
    }
    prompt.push_str("Key Facts:\n");
    for (name, value) in &data.key_facts {
        prompt.push_str(&format!("- {}: {}\n", name, value.render()));
    }
    prompt.push('\n');
}

fn preview(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

pub struct OneLinerTool<'a> {
    limits: &'a Limits,
}

impl<'a> OneLinerTool<'a> {
    pub fn new(limits: &'a Limits) -> Self {
        Self { limits }
    }
}

impl PromptTool for OneLinerTool<'_> {
    type Output = OneLineSummary;

    fn name(&self) -> &'static str {
        ToolKind::OneLineSummary.name()
    }

    fn create_prompt(&self, data: &StructuredDocumentData) -> String {
        let instructions = format!(
            "Provide an ultra concise (<{} words) one-line summary of the following Japanese \
             financial disclosure. Focus only on what was decided, announced, or disclosed by \
             the business, not the filing details or metadata. Respond in English regardless \
             of the language of the source document.",
            self.limits.max_summary_words
        );
        let mut prompt = prompt_header(data, &instructions);
        push_key_facts(&mut prompt, data);

        if !data.text_blocks.is_empty() {
            prompt.push_str("Relevant Text Blocks:\n");
            for block in data
                .text_blocks
                .iter()
                .take(self.limits.max_text_blocks_for_oneliner)
            {
                let body = block.body();
                if body.is_empty() {
                    continue;
                }
                prompt.push_str(&format!(
                    "--- {} ---\n{}...\n\n",
                    block.display_title(),
                    preview(body, self.limits.content_preview_chars)
                ));
            }
        }
        prompt
    }

    fn output_schema(&self) -> OutputSchema {
        one_line_summary_schema(self.limits)
    }

    fn format_to_text(&self, output: &OneLineSummary) -> Result<String, AnalysisError> {
        Ok(output.summary.clone())
    }
}

pub struct ExecutiveSummaryTool<'a> {
    limits: &'a Limits,
}

impl<'a> ExecutiveSummaryTool<'a> {
    pub fn new(limits: &'a Limits) -> Self {
        Self { limits }
    }

    /// Whole text blocks, in order, while the running total stays under
    /// the character budget. The first block that would not fit ends it.
    fn budgeted_text_blocks(&self, data: &StructuredDocumentData) -> String {
        let mut combined = String::new();
        let mut combined_chars = 0;
        for block in &data.text_blocks {
            let body = block.body();
            if body.is_empty() {
                continue;
            }
            let block_text = format!("--- {} ---\n{}\n\n", block.display_title(), body);
            let block_chars = block_text.chars().count();
            if combined_chars + block_chars >= self.limits.prompt_char_limit {
                break;
            }
            combined.push_str(&block_text);
            combined_chars += block_chars;
        }
        combined
    }
}

/// `Some` only for text that is not blank.
fn present(field: &Option<String>) -> Option<&str> {
    field.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

impl PromptTool for ExecutiveSummaryTool<'_> {
    type Output = ExecutiveSummary;

    fn name(&self) -> &'static str {
        ToolKind::ExecutiveSummary.name()
    }

    fn create_prompt(&self, data: &StructuredDocumentData) -> String {
        let instructions = format!(
            "Provide an insightful, concise executive summary and key highlights of the \
             following Japanese financial disclosure. Respond in English regardless of the \
             language of the source document. Be more concise than normal and interpret the \
             data with a strategic lens and rationale. Provide a very concise (<{} words) \
             summary of what the company does.",
            self.limits.max_company_description_words
        );
        let mut prompt = prompt_header(data, &instructions);
        push_key_facts(&mut prompt, data);

        if !data.text_blocks.is_empty() {
            prompt.push_str("Relevant Text Blocks:\n");
            prompt.push_str(&self.budgeted_text_blocks(data));
        }
        prompt
    }

    fn output_schema(&self) -> OutputSchema {
        executive_summary_schema(self.limits)
    }

    fn format_to_text(&self, output: &ExecutiveSummary) -> Result<String, AnalysisError> {
        let mut text = String::new();
        if let Some(desc) = present(&output.company_description_short) {
            write!(text, "Company Description: {}\n\n", desc)?;
        }
        write!(text, "Executive Summary: {}\n\n", output.summary.trim())?;

        let highlights: Vec<&str> = output
            .key_highlights
            .iter()
            .map(|h| h.trim())
            .filter(|h| !h.is_empty())
            .collect();
        if !highlights.is_empty() {
            writeln!(text, "Key Highlights:")?;
            for highlight in highlights {
                writeln!(text, "- {}", highlight)?;
            }
            writeln!(text)?;
        }
        if let Some(impact) = present(&output.potential_impact_rationale) {
            writeln!(text, "Potential Impact: {}", impact)?;
        }
        Ok(text)
    }
}

/// Runs tools against a model resolved per invocation: the configured
/// primary, or the fallback when the primary cannot be resolved.
pub struct AnalysisFramework<'a> {
    resolver: &'a dyn ModelResolver,
    primary_model: String,
    fallback_model: String,
    limits: Limits,
}

impl<'a> AnalysisFramework<'a> {
    pub fn new(resolver: &'a dyn ModelResolver, config: &Config) -> Self {
        Self {
            resolver,
            primary_model: config.llm_model.clone(),
            fallback_model: config.llm_fallback_model.clone(),
            limits: config.limits.clone(),
        }
    }

    /// Resolve, prompt and parse. Model unavailability and call failures
    /// are errors; output that does not match the schema is `Ok(None)`.
    pub fn generate_structured_output<T: PromptTool>(
        &self,
        tool: &T,
        data: &StructuredDocumentData,
    ) -> Result<Option<T::Output>, AnalysisError> {
        let resolved =
            resolve_with_fallback(self.resolver, &self.primary_model, &self.fallback_model)?;
        let prompt = tool.create_prompt(data);
        let schema = tool.output_schema();

        let response = resolved
            .model
            .prompt(&prompt, &schema, SYSTEM_INSTRUCTION)
            .map_err(|e| AnalysisError::Invocation(format!("{:#}", e)))?;

        match parse_response::<T::Output>(&response) {
            Ok((output, source)) => {
                info!(tool = tool.name(), ?source, "generated structured output");
                Ok(Some(output))
            }
            Err(e) => {
                error!(tool = tool.name(), schema = schema.name, error = %e, "failed to parse LLM response");
                debug!(raw = %response.text(), "raw LLM response text");
                Ok(None)
            }
        }
    }

    /// Structured output rendered to text. A formatting failure comes back
    /// as an inline error string rather than an error.
    pub fn generate_formatted_text<T: PromptTool>(
        &self,
        tool: &T,
        data: &StructuredDocumentData,
    ) -> Result<Option<String>, AnalysisError> {
        let Some(output) = self.generate_structured_output(tool, data)? else {
            return Ok(None);
        };
        match tool.format_to_text(&output) {
            Ok(text) => Ok(Some(text)),
            Err(e) => {
                error!(tool = tool.name(), error = %e, "error formatting output");
                Ok(Some(format!("Error formatting analysis: {}", e)))
            }
        }
    }

    #[instrument(level = "info", skip(self, data), fields(doc_id = %data.doc_id, tool = kind.name()))]
    pub fn analyze(
        &self,
        kind: ToolKind,
        data: &StructuredDocumentData,
    ) -> Result<Option<String>, AnalysisError> {
        match kind {
            ToolKind::OneLineSummary => {
                self.generate_formatted_text(&OneLinerTool::new(&self.limits), data)
            }
            ToolKind::ExecutiveSummary => {
                self.generate_formatted_text(&ExecutiveSummaryTool::new(&self.limits), data)
            }
        }
    }
}
