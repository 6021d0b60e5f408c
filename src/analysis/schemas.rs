// src/analysis/schemas.rs
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::model::OutputSchema;
use crate::config::Limits;

/// One-sentence account of what the filing decided or disclosed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OneLineSummary {
    pub company_name_en: String,
    pub summary: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutiveSummary {
    pub company_name_en: String,
    #[serde(default)]
    pub company_description_short: Option<String>,
    pub summary: String,
    pub key_highlights: Vec<String>,
    #[serde(default)]
    pub potential_impact_rationale: Option<String>,
}

// Strict structured-output mode wants every property listed as required
// and optional ones typed as nullable.

pub fn one_line_summary_schema(limits: &Limits) -> OutputSchema {
    OutputSchema {
        name: "OneLineSummary",
        schema: json!({
            "type": "object",
            "description": "Concise one-line summary of the key event or data point in the disclosure.",
            "properties": {
                "company_name_en": {
                    "type": "string",
                    "description": "Company name in English."
                },
                "summary": {
                    "type": "string",
                    "description": format!(
                        "Ultra concise (<{} words) explanation of the key event or data point, focusing on what was decided or done.",
                        limits.max_summary_words
                    )
                }
            },
            "required": ["company_name_en", "summary"],
            "additionalProperties": false
        }),
    }
}

pub fn executive_summary_schema(limits: &Limits) -> OutputSchema {
    OutputSchema {
        name: "ExecutiveSummary",
        schema: json!({
            "type": "object",
            "description": "Insightful, concise executive summary and key highlights.",
            "properties": {
                "company_name_en": {
                    "type": "string",
                    "description": "Company name in English (all caps)."
                },
                "company_description_short": {
                    "type": ["string", "null"],
                    "description": format!(
                        "Very concise (<{} words) summary of what the company does.",
                        limits.max_company_description_words
                    )
                },
                "summary": {
                    "type": "string",
                    "description": "Insightful and concise executive summary interpreting the data with a strategic lens."
                },
                "key_highlights": {
                    "type": "array",
                    "items": { "type": "string" },
                    "description": "Key takeaways or important points from the disclosure as bullet points."
                },
                "potential_impact_rationale": {
                    "type": ["string", "null"],
                    "description": format!(
                        "Very concise (<{} words) summary of the potential impact, with rationale.",
                        limits.max_impact_rationale_words
                    )
                }
            },
            "required": [
                "company_name_en",
                "company_description_short",
                "summary",
                "key_highlights",
                "potential_impact_rationale"
            ],
            "additionalProperties": false
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_executive_optional_fields_may_be_null_or_missing() {
        let with_null: ExecutiveSummary = serde_json::from_str(
            r#"{"company_name_en":"ACME","company_description_short":null,
                "summary":"s","key_highlights":[],"potential_impact_rationale":null}"#,
        )
        .unwrap();
        assert_eq!(with_null.company_description_short, None);

        let missing: ExecutiveSummary = serde_json::from_str(
            r#"{"company_name_en":"ACME","summary":"s","key_highlights":["a"]}"#,
        )
        .unwrap();
        assert_eq!(missing.key_highlights, vec!["a"]);
    }

    #[test]
    fn test_schema_descriptions_carry_limits() {
        let limits = Limits {
            max_summary_words: 12,
            ..Limits::default()
        };
        let schema = one_line_summary_schema(&limits);
        let desc = schema.schema["properties"]["summary"]["description"]
            .as_str()
            .unwrap();
        assert!(desc.contains("<12 words"));
    }
}
