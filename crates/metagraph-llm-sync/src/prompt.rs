//! Prompt construction.

use serde::Serialize;

use crate::output::NO_DELTA_SENTINEL;
use crate::LlmError;

/// Strict-JSON documentation prompt embedding the three context blocks.
pub fn build_prompt<S, M, T>(
    schema_context: &S,
    mapping_context: &M,
    textual_context: &T,
) -> Result<String, LlmError>
where
    S: Serialize + ?Sized,
    M: Serialize + ?Sized,
    T: Serialize + ?Sized,
{
    let schema = serde_json::to_string_pretty(schema_context)?;
    let mapping = serde_json::to_string_pretty(mapping_context)?;
    let textual = serde_json::to_string_pretty(textual_context)?;

    Ok(format!(
        r#"Return STRICT JSON only (no markdown, no extra text) with exactly these keys:
- governance_doc_markdown
- delta_ontology_ttl
- new_terms

IMPORTANT: You must always include all 3 keys even if empty.
- If you have no delta ontology changes, set delta_ontology_ttl to exactly: "{NO_DELTA_SENTINEL}"
- If you have no new terms, set new_terms to []

Requirements:
- governance_doc_markdown must include:
  1) Table purpose/context
  2) Plain-English definitions for EVERY column in schema_context
  3) Usage notes (grain, joins/keys, caveats)
  4) 2-3 example SQL queries
- delta_ontology_ttl must be MINIMAL and reuse existing terms; add only missing.

SCHEMA CONTEXT:
{schema}

MAPPING CONTEXT:
{mapping}

TEXTUAL CONTEXT:
{textual}"#
    ))
}
