//! Normalization of the model's documentation record.
//!
//! Models drift on key spelling, so each canonical key has an ordered alias
//! list; the first alias present wins. `new_terms` and `delta_ontology_ttl`
//! have safe defaults. `governance_doc_markdown` has none: without it the
//! table has failed.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::LlmError;

pub const NO_DELTA_SENTINEL: &str = "# No delta required";

pub const GOVERNANCE_DOC_ALIASES: &[&str] = &[
    "governance_doc_markdown",
    "governance_markdown",
    "governanceDocMarkdown",
    "governanceMarkdown",
];

pub const DELTA_ONTOLOGY_ALIASES: &[&str] = &[
    "delta_ontology_ttl",
    "delta_ontology",
    "deltaOntologyTtl",
    "delta_ttl",
    "deltaOntologyTTL",
];

pub const NEW_TERMS_ALIASES: &[&str] = &["new_terms", "newTerms", "added_terms", "addedTerms"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentationRecord {
    pub governance_doc_markdown: String,
    pub delta_ontology_ttl: String,
    pub new_terms: Vec<String>,
}

/// Map a raw model response onto the fixed three-key record.
pub fn normalize_model_output(raw: &Value, table_name: &str) -> Result<DocumentationRecord, LlmError> {
    let governance_doc_markdown = lookup(raw, GOVERNANCE_DOC_ALIASES)
        .and_then(text_of)
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| LlmError::MissingGovernanceDoc {
            table: table_name.to_string(),
        })?;

    let delta_ontology_ttl = lookup(raw, DELTA_ONTOLOGY_ALIASES)
        .and_then(text_of)
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| NO_DELTA_SENTINEL.to_string());

    let new_terms = match lookup(raw, NEW_TERMS_ALIASES) {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(items)) => items.iter().filter_map(text_of).collect(),
        Some(scalar) => text_of(scalar).into_iter().collect(),
    };

    Ok(DocumentationRecord {
        governance_doc_markdown,
        delta_ontology_ttl,
        new_terms,
    })
}

fn lookup<'a>(raw: &'a Value, aliases: &[&str]) -> Option<&'a Value> {
    let object = raw.as_object()?;
    aliases.iter().find_map(|alias| object.get(*alias))
}

/// Strings as-is, other non-null values in their JSON form.
fn text_of(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}
