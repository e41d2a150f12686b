//! Clause risk analysis: prompt construction and completion parsing.
//!
//! The prompt template is the whole domain knowledge of the service. The
//! parser never fails: a completion that is not the expected JSON shape
//! degrades to a sentinel result so the caller always sees a valid analysis.

use serde::{Deserialize, Serialize};

/// One identified clause: short label, plain-language meaning, one example
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TermItem {
    pub term: String,
    pub meaning: String,
    pub example: String,
}

/// Clauses bucketed by risk level
///
/// Order within a bucket is whatever the model produced; empty buckets
/// serialize as `[]`, never omitted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub critical: Vec<TermItem>,
    pub medium: Vec<TermItem>,
    pub low: Vec<TermItem>,
}

/// Build the analysis prompt with the document text embedded verbatim.
/// Deterministic: same input, same bytes.
pub fn build_prompt(text: &str) -> String {
    format!(
        r#"You are an expert legal analyst specializing in terms and conditions analysis.

Analyze the following terms and conditions text and categorize ALL important clauses into three risk levels: CRITICAL, MEDIUM, and LOW.

For each clause you identify, provide:
- term: A brief title for the clause (3-5 words)
- meaning: A clear explanation of what this clause means for the user (1-2 sentences)
- example: A practical example of how this could affect the user (1 sentence)

Categories:
- CRITICAL: Clauses that pose significant risks, legal liabilities, or major limitations (e.g., data selling, unlimited liability, irrevocable rights transfer, automatic renewals with penalties)
- MEDIUM: Clauses that are concerning but not immediately dangerous (e.g., data sharing with partners, limited refund windows, mandatory arbitration)
- LOW: Standard clauses that are relatively benign or industry-standard (e.g., cookie usage, service updates, standard privacy practices)

You MUST respond ONLY with valid JSON in this exact format (no other text before or after):
{{
  "critical": [
    {{
      "term": "string",
      "meaning": "string",
      "example": "string"
    }}
  ],
  "medium": [
    {{
      "term": "string",
      "meaning": "string",
      "example": "string"
    }}
  ],
  "low": [
    {{
      "term": "string",
      "meaning": "string",
      "example": "string"
    }}
  ]
}}

Terms and Conditions Text:
{text}

Remember: Respond ONLY with the JSON object, nothing else."#
    )
}

/// Parse the model's completion into an [`AnalysisResult`].
///
/// Handles potential markdown wrapping, then does a typed parse. Broken JSON
/// and wrong-shape JSON both degrade to the sentinel result instead of
/// erroring; upstream transport failures are the only hard errors the
/// analyze pipeline surfaces.
pub fn parse_analysis(raw: &str) -> AnalysisResult {
    let json_text = if raw.starts_with("```") {
        raw.lines()
            .skip(1)
            .take_while(|l| !l.starts_with("```"))
            .collect::<Vec<_>>()
            .join("\n")
    } else {
        raw.to_string()
    };

    match serde_json::from_str::<AnalysisResult>(&json_text) {
        Ok(analysis) => analysis,
        Err(e) => {
            eprintln!("[Analyze] Completion parse failed: {}. Raw response: {}", e, raw);
            fallback_analysis()
        }
    }
}

/// Sentinel result for unparseable completions: a single CRITICAL entry
/// explaining the failure, empty MEDIUM and LOW buckets.
pub fn fallback_analysis() -> AnalysisResult {
    AnalysisResult {
        critical: vec![TermItem {
            term: "Parsing Error".to_string(),
            meaning: "The AI response could not be parsed. Please try again.".to_string(),
            example: "This may happen if the text is too complex or malformed.".to_string(),
        }],
        medium: vec![],
        low: vec![],
    }
}
