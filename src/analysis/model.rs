// src/analysis/model.rs
//! Language-model seam: resolve a model by name, prompt it under a JSON
//! schema, and fall back to a second model when the first is unavailable.

use anyhow::Result;
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::AnalysisError;

pub const SYSTEM_INSTRUCTION: &str = "You are a helpful financial analyst. \
Follow the schema provided precisely. \
Respond ONLY with valid JSON that conforms to the provided schema.";

/// A named JSON schema the model output must satisfy.
#[derive(Debug, Clone, PartialEq)]
pub struct OutputSchema {
    pub name: &'static str,
    pub schema: Value,
}

/// What a model call returns. Clients that already decoded the output
/// expose it through `schema_object` or `parsed_data`.
#[derive(Debug, Clone, Default)]
pub struct ModelResponse {
    pub text: String,
    pub schema_object: Option<Value>,
    pub parsed_data: Option<Value>,
}

impl ModelResponse {
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}

pub trait LanguageModel {
    fn model_id(&self) -> &str;

    fn prompt(&self, prompt: &str, schema: &OutputSchema, system: &str) -> Result<ModelResponse>;
}

pub trait ModelResolver {
    fn resolve(&self, model_name: &str) -> Result<Box<dyn LanguageModel>>;
}

/// Which configured model ended up serving a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelChoice {
    Primary,
    Fallback,
}

pub struct ResolvedModel {
    pub choice: ModelChoice,
    pub model: Box<dyn LanguageModel>,
}

/// Try `primary`, then `fallback`; the first that resolves wins. When both
/// fail the error carries each attempt's reason.
pub fn resolve_with_fallback(
    resolver: &dyn ModelResolver,
    primary: &str,
    fallback: &str,
) -> Result<ResolvedModel, AnalysisError> {
    let attempts = [(ModelChoice::Primary, primary), (ModelChoice::Fallback, fallback)];
    let mut reasons: Vec<String> = Vec::with_capacity(attempts.len());

    for (choice, name) in attempts {
        match resolver.resolve(name) {
            Ok(model) => {
                match choice {
                    ModelChoice::Primary => debug!(model = %name, "using primary LLM model"),
                    ModelChoice::Fallback => warn!(model = %name, "using fallback LLM model"),
                }
                return Ok(ResolvedModel { choice, model });
            }
            Err(e) => {
                warn!(model = %name, ?choice, error = %e, "failed to resolve LLM model");
                reasons.push(e.to_string());
            }
        }
    }

    Err(AnalysisError::ModelUnavailable {
        primary: primary.to_string(),
        primary_error: reasons.first().cloned().unwrap_or_default(),
        fallback: fallback.to_string(),
        fallback_error: reasons.get(1).cloned().unwrap_or_default(),
    })
}

#[cfg(test)]
pub(crate) mod fakes {
    use super::*;
    use anyhow::{anyhow, bail};
    use std::{cell::RefCell, collections::HashSet, rc::Rc};

    /// Shared log of everything the fakes were asked to do.
    #[derive(Default)]
    pub struct CallLog {
        pub resolved: Vec<String>,
        pub prompts: Vec<String>,
    }

    /// Resolves only the names in `available`; every model answers with
    /// `response` (or fails when it is `None`).
    pub struct FakeResolver {
        pub available: HashSet<String>,
        pub response: Option<ModelResponse>,
        pub log: Rc<RefCell<CallLog>>,
    }

    impl FakeResolver {
        pub fn new(available: &[&str], response: Option<ModelResponse>) -> Self {
            Self {
                available: available.iter().map(|s| s.to_string()).collect(),
                response,
                log: Rc::new(RefCell::new(CallLog::default())),
            }
        }
    }

    struct FakeModel {
        id: String,
        response: Option<ModelResponse>,
        log: Rc<RefCell<CallLog>>,
    }

    impl LanguageModel for FakeModel {
        fn model_id(&self) -> &str {
            &self.id
        }

        fn prompt(&self, prompt: &str, _: &OutputSchema, _: &str) -> Result<ModelResponse> {
            self.log.borrow_mut().prompts.push(prompt.to_string());
            self.response
                .clone()
                .ok_or_else(|| anyhow!("connection reset by {}", self.id))
        }
    }

    impl ModelResolver for FakeResolver {
        fn resolve(&self, model_name: &str) -> Result<Box<dyn LanguageModel>> {
            self.log.borrow_mut().resolved.push(model_name.to_string());
            if !self.available.contains(model_name) {
                bail!("unknown model {}", model_name);
            }
            Ok(Box::new(FakeModel {
                id: model_name.to_string(),
                response: self.response.clone(),
                log: self.log.clone(),
            }))
        }
    }
}
