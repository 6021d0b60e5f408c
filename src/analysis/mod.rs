// src/analysis/mod.rs
//! Schema-constrained language-model analysis of structured filings.

pub mod model;
pub mod openai;
pub mod orchestrator;
pub mod schemas;
pub mod tools;

pub use model::{LanguageModel, ModelResolver, ModelResponse, OutputSchema};
pub use openai::OpenAiResolver;
pub use orchestrator::{analyze_documents, render_report, AnalysisOutput, AnalysisResult, DEFAULT_TOOLS};
pub use tools::{AnalysisFramework, ToolKind};
